//! Persistent storage of sparse elevation samples.
//!
//! [`ElevationStore`] writes the non-void cells of a grid as
//! `(longitude, latitude, elevation)` rows and fills grids back from
//! rectangular range queries. Longitudes are stored normalized into
//! `[-180°, 180°)`, so a query window that crosses the antimeridian is split
//! into two linear ranges.
//!
//! # Example
//!
//! ```
//! use dted::store::{ElevationStore, StoreParameters};
//! use dted::ElevationGrid;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory()?;
//! let mut store = ElevationStore::open(&conn)?;
//! store.set_parameters(&StoreParameters::default())?;
//!
//! let mut grid = ElevationGrid::new(4, 4, 138 * 1200, 35 * 1200, 1200);
//! grid.set(1, 2, 3776);
//! assert_eq!(store.insert(&grid)?.written, 1);
//!
//! let mut copy = ElevationGrid::new(4, 4, 138 * 1200, 35 * 1200, 1200);
//! assert_eq!(store.query(&mut copy)?, 1);
//! assert_eq!(copy.get(1, 2), 3776);
//! # Ok::<(), dted::DtedError>(())
//! ```

mod backend;
mod params;
mod sqlite;

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

pub use backend::{Backend, BulkLoad, ParameterSet, Sample, DATA_TABLE, PARAMETER_COLLECTION};
pub use params::{Projection, StoreParameters};
pub use sqlite::SqliteBackend;

use crate::coord::normalize;
use crate::error::{DtedError, Result};
use crate::grid::ElevationGrid;

/// Outcome of writing a grid into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    /// Rows written.
    pub written: usize,
    /// Non-void cells skipped because their coordinate was already stored.
    pub duplicates: usize,
}

/// Elevation samples persisted through a [`Backend`].
///
/// The store owns the backend handle; with [`SqliteBackend`] the database
/// connection itself is only borrowed.
pub struct ElevationStore<B> {
    backend: B,
}

impl<'conn> ElevationStore<SqliteBackend<'conn>> {
    /// Open a store on a SQLite connection, creating the tables if needed.
    pub fn open(conn: &'conn Connection) -> Result<Self> {
        Ok(Self::new(SqliteBackend::new(conn)?))
    }
}

impl<B: Backend> ElevationStore<B> {
    /// Wrap an existing backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The backend handle.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the sample table and parameter collection. Safe to repeat.
    pub fn create_schema(&mut self) -> Result<()> {
        self.backend.create_tables()
    }

    /// Replace the store-wide parameters.
    pub fn set_parameters(&mut self, parameters: &StoreParameters) -> Result<()> {
        self.backend
            .store_parameter_set(PARAMETER_COLLECTION, &parameters.to_parameter_set())
    }

    /// Read the store-wide parameters.
    pub fn get_parameters(&mut self) -> Result<StoreParameters> {
        let set = self.backend.retrieve_parameter_set(PARAMETER_COLLECTION)?;
        StoreParameters::from_parameter_set(&set)
    }

    /// Parameters for a bulk operation on `grid`, which must share the
    /// store's resolution.
    fn parameters_for(&mut self, grid: &ElevationGrid) -> Result<StoreParameters> {
        let parameters = self.get_parameters()?;
        if i64::from(grid.resolution()) != i64::from(parameters.points_per_degree) {
            return Err(DtedError::ResolutionMismatch {
                grid: grid.resolution(),
                store: parameters.points_per_degree,
            });
        }
        Ok(parameters)
    }

    /// Write every non-void cell of `grid`, one row at a time.
    ///
    /// Cells equal to the store's void value are skipped. Cells whose
    /// coordinate is already stored are left as they were and counted in
    /// [`InsertSummary::duplicates`].
    ///
    /// # Errors
    ///
    /// [`DtedError::ResolutionMismatch`] if the grid's resolution differs from
    /// the store's, or any backend failure.
    pub fn insert(&mut self, grid: &ElevationGrid) -> Result<InsertSummary> {
        let parameters = self.parameters_for(grid)?;
        let mut summary = InsertSummary::default();

        for sample in stored_samples(grid, &parameters) {
            if self.backend.insert_sample(sample)? {
                summary.written += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        info!(
            left = grid.left(),
            bottom = grid.bottom(),
            written = summary.written,
            duplicates = summary.duplicates,
            "Inserted grid"
        );
        Ok(summary)
    }

    /// Fill `grid` from the stored samples inside its extent.
    ///
    /// The grid is first reset to the store's void value, so cells with no
    /// stored sample read as void. A grid that extends east past 180° is
    /// answered with two range queries: one up to the antimeridian and one
    /// from -180° onwards. Returns the number of cells written.
    ///
    /// # Errors
    ///
    /// [`DtedError::ResolutionMismatch`] if the grid's resolution differs from
    /// the store's, or any backend failure.
    ///
    /// # Panics
    ///
    /// Panics if the grid is wider than 360°.
    pub fn query(&mut self, grid: &mut ElevationGrid) -> Result<usize> {
        let parameters = self.parameters_for(grid)?;
        let half_turn = 180 * parameters.points_per_degree;
        let full_turn = 2 * half_turn;
        assert!(
            i64::from(grid.width()) <= i64::from(full_turn),
            "query window wider than 360 degrees"
        );

        grid.reset_void(parameters.void_value);

        let left = grid.left();
        let right = grid.right();
        let bottom = grid.bottom();
        let top = grid.top();

        let mut count = self.backend.select_range(
            left..right.min(half_turn),
            bottom..top,
            &mut |s| {
                grid.set(
                    (s.longitude - left) as u32,
                    (s.latitude - bottom) as u32,
                    s.elevation,
                )
            },
        )?;

        if right > half_turn {
            // Columns east of the antimeridian start after the first pass
            let start = half_turn - left;
            let wrapped_left = -half_turn;
            let wrapped_right = right - full_turn;
            count += self.backend.select_range(
                wrapped_left..wrapped_right,
                bottom..top,
                &mut |s| {
                    grid.set(
                        (s.longitude - wrapped_left + start) as u32,
                        (s.latitude - bottom) as u32,
                        s.elevation,
                    )
                },
            )?;
        }

        info!(left, right, bottom, top, count, "Queried grid");
        Ok(count)
    }

    /// Write every non-void cell of `grid` to a tab-separated file at
    /// `tmp_path` and hand that file to the backend's bulk loader.
    ///
    /// Produces the same rows as [`insert`](Self::insert) but is much faster
    /// for whole tiles. The file is left in place for the caller to remove.
    ///
    /// # Errors
    ///
    /// [`DtedError::ResolutionMismatch`], failure to write the file, or any
    /// backend failure.
    pub fn load_via_bulk_file<P: AsRef<Path>>(
        &mut self,
        grid: &ElevationGrid,
        tmp_path: P,
    ) -> Result<InsertSummary> {
        let tmp_path = tmp_path.as_ref();
        let parameters = self.parameters_for(grid)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(tmp_path)?;
        for sample in stored_samples(grid, &parameters) {
            writer.serialize((sample.longitude, sample.latitude, sample.elevation))?;
        }
        writer.flush()?;
        drop(writer);

        let load = self.backend.bulk_load(tmp_path)?;
        let summary = InsertSummary {
            written: load.written,
            duplicates: load.read - load.written,
        };

        info!(
            path = %tmp_path.display(),
            left = grid.left(),
            bottom = grid.bottom(),
            written = summary.written,
            duplicates = summary.duplicates,
            "Bulk loaded grid"
        );
        Ok(summary)
    }
}

/// The rows `grid` contributes to a store with `parameters`.
fn stored_samples<'a>(
    grid: &'a ElevationGrid,
    parameters: &StoreParameters,
) -> impl Iterator<Item = Sample> + 'a {
    let void_value = parameters.void_value;
    let resolution = parameters.resolution();
    grid.cells()
        .filter(move |&(_, _, v)| v != void_value)
        .map(move |(x, y, elevation)| Sample {
            longitude: normalize(grid.left() + x as i32, resolution),
            latitude: grid.bottom() + y as i32,
            elevation,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VOID_VALUE;
    use tempfile::TempDir;

    const R: u32 = 1200;
    const HALF: i32 = 180 * R as i32;

    fn open(conn: &Connection) -> ElevationStore<SqliteBackend<'_>> {
        let mut store = ElevationStore::open(conn).unwrap();
        store.create_schema().unwrap();
        store.set_parameters(&StoreParameters::default()).unwrap();
        store
    }

    /// A grid with a sparse pattern of samples and voids.
    fn patterned(width: u32, height: u32, left: i32, bottom: i32) -> ElevationGrid {
        let mut grid = ElevationGrid::new(width, height, left, bottom, R);
        for y in 0..height {
            for x in 0..width {
                if (x + 2 * y) % 3 != 0 {
                    grid.set(x, y, (x * 10 + y) as i16 - 50);
                }
            }
        }
        grid
    }

    #[test]
    fn test_parameters_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = ElevationStore::open(&conn).unwrap();
        let params = StoreParameters {
            description: "SRTM-1".to_string(),
            projection: Projection::Dted,
            points_per_degree: 3600,
            void_value: -9999,
        };
        store.set_parameters(&params).unwrap();
        assert_eq!(store.get_parameters().unwrap(), params);
    }

    #[test]
    fn test_get_parameters_unset() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = ElevationStore::open(&conn).unwrap();
        assert!(matches!(
            store.get_parameters(),
            Err(DtedError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_create_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        store.insert(&patterned(3, 3, 0, 0)).unwrap();
        store.create_schema().unwrap();
        assert!(store.backend().sample_count().unwrap() > 0);
    }

    #[test]
    fn test_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let grid = patterned(20, 15, 138 * 1200 + 7, 35 * 1200 - 3);

        let summary = store.insert(&grid).unwrap();
        let non_void = grid.cells().filter(|&(_, _, v)| v != VOID_VALUE).count();
        assert_eq!(summary.written, non_void);
        assert_eq!(summary.duplicates, 0);

        let mut copy = ElevationGrid::new(20, 15, grid.left(), grid.bottom(), R);
        copy.fill(1);
        assert_eq!(store.query(&mut copy).unwrap(), non_void);
        assert_eq!(copy, grid);
    }

    #[test]
    fn test_query_sub_window() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let grid = patterned(10, 10, 0, 0);
        store.insert(&grid).unwrap();

        let mut window = ElevationGrid::new(4, 3, 5, 6, R);
        store.query(&mut window).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(window.get(x, y), grid.get(x + 5, y + 6));
            }
        }
    }

    #[test]
    fn test_query_empty_store_is_void() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let mut grid = patterned(5, 5, 0, 0);
        assert_eq!(store.query(&mut grid).unwrap(), 0);
        assert!(grid.cells().all(|(_, _, v)| v == VOID_VALUE));
    }

    #[test]
    fn test_insert_counts_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let grid = patterned(6, 6, 0, 0);

        let first = store.insert(&grid).unwrap();
        let second = store.insert(&grid).unwrap();
        assert_eq!(second.written, 0);
        assert_eq!(second.duplicates, first.written);
    }

    #[test]
    fn test_overlapping_tiles_keep_first_write() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let west = ElevationGrid::from_samples(2, 1, 0, 0, R, vec![1, 1]);
        let east = ElevationGrid::from_samples(2, 1, 1, 0, R, vec![2, 2]);

        assert_eq!(store.insert(&west).unwrap().written, 2);
        let summary = store.insert(&east).unwrap();
        assert_eq!(summary, InsertSummary { written: 1, duplicates: 1 });

        let mut grid = ElevationGrid::new(3, 1, 0, 0, R);
        store.query(&mut grid).unwrap();
        assert_eq!(grid.samples(), &[1, 1, 2]);
    }

    #[test]
    fn test_dateline_query() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);

        // 179°E..181°E
        let mut grid = ElevationGrid::new(2 * R, 2, 179 * 1200, 0, R);
        grid.set(600, 1, 1795); // 179.5°E
        grid.set(1800, 1, -1795); // 180.5°E == 179.5°W
        grid.set(0, 0, 179);
        grid.set(2 * R - 1, 0, 181);
        assert_eq!(store.insert(&grid).unwrap().written, 4);

        // stored longitudes are normalized
        let mut west = Vec::new();
        conn.prepare("SELECT Longitude FROM Elevation WHERE Elevation = -1795")
            .unwrap()
            .query_map([], |row| row.get::<_, i32>(0))
            .unwrap()
            .for_each(|lon| west.push(lon.unwrap()));
        assert_eq!(west, vec![-179 * 1200 - 600]);

        let mut copy = ElevationGrid::new(2 * R, 2, 179 * 1200, 0, R);
        assert_eq!(store.query(&mut copy).unwrap(), 4);
        assert_eq!(copy.get(600, 1), 1795);
        assert_eq!(copy.get(1800, 1), -1795);
        assert_eq!(copy.get(0, 0), 179);
        assert_eq!(copy.get(2 * R - 1, 0), 181);
        assert_eq!(copy, grid);
    }

    #[test]
    fn test_dateline_query_sees_samples_from_western_grid() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);

        // a tile just west of 180°W ... stored from its own side of the wrap
        let west = ElevationGrid::from_samples(2, 1, -HALF, 0, R, vec![10, 20]);
        let east = ElevationGrid::from_samples(2, 1, HALF - 2, 0, R, vec![30, 40]);
        store.insert(&west).unwrap();
        store.insert(&east).unwrap();

        let mut window = ElevationGrid::new(4, 1, HALF - 2, 0, R);
        assert_eq!(store.query(&mut window).unwrap(), 4);
        assert_eq!(window.samples(), &[30, 40, 10, 20]);
    }

    #[test]
    fn test_resolution_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let mut grid = ElevationGrid::new(3, 3, 0, 0, 3600);
        grid.set(0, 0, 1);

        let err = store.insert(&grid).unwrap_err();
        assert!(matches!(
            err,
            DtedError::ResolutionMismatch {
                grid: 3600,
                store: 1200
            }
        ));
        assert!(store.query(&mut grid).is_err());
        // the grid is untouched when the query is refused
        assert_eq!(grid.get(0, 0), 1);
    }

    #[test]
    fn test_store_void_value_is_used() {
        let conn = Connection::open_in_memory().unwrap();
        let mut store = ElevationStore::open(&conn).unwrap();
        store
            .set_parameters(&StoreParameters {
                void_value: 0,
                ..StoreParameters::default()
            })
            .unwrap();

        let grid = ElevationGrid::from_samples(3, 1, 0, 0, R, vec![0, 5, VOID_VALUE]);
        // 0 is void for this store; -32768 is an ordinary value
        assert_eq!(store.insert(&grid).unwrap().written, 2);

        let mut copy = ElevationGrid::new(3, 1, 0, 0, R);
        store.query(&mut copy).unwrap();
        assert_eq!(copy.void_value(), 0);
        assert_eq!(copy.samples(), &[0, 5, VOID_VALUE]);
    }

    #[test]
    fn test_bulk_file_matches_insert() {
        let temp_dir = TempDir::new().unwrap();
        let tmp_path = temp_dir.path().join("dted.dat");
        let grid = patterned(12, 7, HALF - 5, 100);

        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        let summary = store.load_via_bulk_file(&grid, &tmp_path).unwrap();
        let non_void = grid.cells().filter(|&(_, _, v)| v != VOID_VALUE).count();
        assert_eq!(summary.written, non_void);

        let text = std::fs::read_to_string(&tmp_path).unwrap();
        assert_eq!(text.lines().count(), non_void);
        let first = text.lines().next().unwrap();
        assert_eq!(first.split('\t').count(), 3);

        let mut copy = ElevationGrid::new(12, 7, HALF - 5, 100, R);
        store.query(&mut copy).unwrap();
        assert_eq!(copy, grid);

        // loading again only produces duplicates
        let again = store.load_via_bulk_file(&grid, &tmp_path).unwrap();
        assert_eq!(again.written, 0);
        assert_eq!(again.duplicates, non_void);
    }

    #[test]
    fn test_bulk_file_normalizes_longitude() {
        let temp_dir = TempDir::new().unwrap();
        let tmp_path = temp_dir.path().join("dted.dat");
        let grid = ElevationGrid::from_samples(2, 1, HALF - 1, 0, R, vec![7, 8]);

        let conn = Connection::open_in_memory().unwrap();
        let mut store = open(&conn);
        store.load_via_bulk_file(&grid, &tmp_path).unwrap();

        let text = std::fs::read_to_string(&tmp_path).unwrap();
        assert_eq!(text, format!("{}\t0\t7\n{}\t0\t8\n", HALF - 1, -HALF));
    }
}
