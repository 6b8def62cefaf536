//! The database surface an [`ElevationStore`](super::ElevationStore) needs.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use crate::error::Result;

/// Name of the table holding one row per non-void sample.
pub const DATA_TABLE: &str = "Elevation";

/// Name of the parameter collection holding store-wide metadata.
pub const PARAMETER_COLLECTION: &str = "DTED";

/// String-keyed parameters of one collection.
pub type ParameterSet = BTreeMap<String, String>;

/// One persisted elevation sample, in the store's grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample {
    pub longitude: i32,
    pub latitude: i32,
    pub elevation: i16,
}

/// Outcome of handing a bulk file to [`Backend::bulk_load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkLoad {
    /// Lines read from the file.
    pub read: usize,
    /// Rows actually inserted; the rest collided with existing keys.
    pub written: usize,
}

/// Minimal tabular-database operations used by the elevation store.
///
/// Rows are keyed by `(longitude, latitude)`. Implementations index
/// longitude linearly; ranges that wrap around the antimeridian are split by
/// the caller.
pub trait Backend {
    /// Create the sample table and parameter storage if they do not exist.
    fn create_tables(&mut self) -> Result<()>;

    /// Replace the contents of a parameter collection.
    fn store_parameter_set(&mut self, collection: &str, parameters: &ParameterSet) -> Result<()>;

    /// Read a parameter collection; an unknown collection is empty.
    fn retrieve_parameter_set(&mut self, collection: &str) -> Result<ParameterSet>;

    /// Insert one sample. Returns `false` if a row with the same key exists,
    /// in which case the stored row is left unchanged.
    fn insert_sample(&mut self, sample: Sample) -> Result<bool>;

    /// Visit every row with `longitude` and `latitude` inside the half-open
    /// ranges. Returns the number of rows visited.
    fn select_range(
        &mut self,
        longitude: Range<i32>,
        latitude: Range<i32>,
        visit: &mut dyn FnMut(Sample),
    ) -> Result<usize>;

    /// Load a tab-separated `longitude\tlatitude\televation` file, skipping
    /// rows whose key already exists.
    fn bulk_load(&mut self, path: &Path) -> Result<BulkLoad>;
}
