//! Error types for the DTED library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading tiles or talking to an elevation store.
///
/// Programming errors (out-of-range cell access, merging grids of different
/// resolution) are not represented here: they panic.
#[derive(Error, Debug)]
pub enum DtedError {
    /// IO error when reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested file does not exist.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// The filename does not follow the `[N|S]DD[E|W]DDD.hgt` convention.
    #[error("Invalid SRTM filename: {name} (expected e.g. N35E138.hgt)")]
    InvalidFilename { name: String },

    /// The raster file holds fewer samples than the requested extent.
    #[error("Truncated raster file {path}: expected {expected} bytes, found {actual}")]
    Truncated {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Grid and store disagree on points per degree.
    #[error("Resolution mismatch: grid has {grid} points per degree, store has {store}")]
    ResolutionMismatch { grid: u32, store: i32 },

    /// A store parameter is missing or cannot be parsed.
    #[error("Invalid store parameter {key}: {value:?}")]
    InvalidParameter { key: String, value: Option<String> },

    /// The backing database rejected a statement.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The tab-separated bulk file could not be written or read.
    #[error("Bulk file error: {0}")]
    BulkFile(#[from] csv::Error),
}

/// Result type alias using [`DtedError`].
pub type Result<T> = std::result::Result<T, DtedError>;

impl DtedError {
    /// Returns `true` for errors that mean "no data here" rather than failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DtedError::NotFound { .. })
    }
}
