//! SQLite implementation of [`Backend`].

use std::ops::Range;
use std::path::Path;

use rusqlite::{params, Connection, Statement};
use tracing::debug;

use super::backend::{Backend, BulkLoad, ParameterSet, Sample, DATA_TABLE};
use crate::error::Result;

fn create_tables_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {DATA_TABLE} (
            Longitude INTEGER NOT NULL,
            Latitude  INTEGER NOT NULL,
            Elevation INTEGER NOT NULL,
            PRIMARY KEY (Longitude, Latitude)
        ) WITHOUT ROWID;
        CREATE TABLE IF NOT EXISTS Parameters (
            Collection TEXT NOT NULL,
            Name       TEXT NOT NULL,
            Value      TEXT NOT NULL,
            PRIMARY KEY (Collection, Name)
        );"
    )
}

fn insert_sample_sql() -> String {
    format!(
        "INSERT OR IGNORE INTO {DATA_TABLE} (Longitude, Latitude, Elevation) \
         VALUES (?1, ?2, ?3)"
    )
}

fn select_range_sql() -> String {
    format!(
        "SELECT Longitude, Latitude, Elevation FROM {DATA_TABLE} \
         WHERE Latitude >= ?1 AND Latitude < ?2 AND Longitude >= ?3 AND Longitude < ?4"
    )
}

/// A [`Backend`] over a borrowed SQLite connection.
///
/// The insert and select statements are prepared once, in [`SqliteBackend::new`],
/// and live as long as the backend. The connection itself stays with the
/// caller and is never closed here.
pub struct SqliteBackend<'conn> {
    conn: &'conn Connection,
    insert: Statement<'conn>,
    select: Statement<'conn>,
}

impl<'conn> SqliteBackend<'conn> {
    /// Wrap `conn`, creating the tables if needed and preparing statements.
    pub fn new(conn: &'conn Connection) -> Result<Self> {
        conn.execute_batch(&create_tables_sql())?;
        let insert = conn.prepare(&insert_sample_sql())?;
        let select = conn.prepare(&select_range_sql())?;
        Ok(Self {
            conn,
            insert,
            select,
        })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Number of samples stored.
    pub fn sample_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {DATA_TABLE}"), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }
}

impl Backend for SqliteBackend<'_> {
    fn create_tables(&mut self) -> Result<()> {
        self.conn.execute_batch(&create_tables_sql())?;
        Ok(())
    }

    fn store_parameter_set(&mut self, collection: &str, parameters: &ParameterSet) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM Parameters WHERE Collection = ?1",
            params![collection],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO Parameters (Collection, Name, Value) VALUES (?1, ?2, ?3)",
            )?;
            for (name, value) in parameters {
                stmt.execute(params![collection, name, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn retrieve_parameter_set(&mut self, collection: &str) -> Result<ParameterSet> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT Name, Value FROM Parameters WHERE Collection = ?1")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut set = ParameterSet::new();
        for row in rows {
            let (name, value) = row?;
            set.insert(name, value);
        }
        Ok(set)
    }

    fn insert_sample(&mut self, sample: Sample) -> Result<bool> {
        let changed =
            self.insert
                .execute(params![sample.longitude, sample.latitude, sample.elevation])?;
        Ok(changed > 0)
    }

    fn select_range(
        &mut self,
        longitude: Range<i32>,
        latitude: Range<i32>,
        visit: &mut dyn FnMut(Sample),
    ) -> Result<usize> {
        let mut rows = self.select.query(params![
            latitude.start,
            latitude.end,
            longitude.start,
            longitude.end
        ])?;
        let mut count = 0;
        while let Some(row) = rows.next()? {
            visit(Sample {
                longitude: row.get(0)?,
                latitude: row.get(1)?,
                elevation: row.get(2)?,
            });
            count += 1;
        }
        Ok(count)
    }

    fn bulk_load(&mut self, path: &Path) -> Result<BulkLoad> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)?;

        let conn = self.conn;
        let tx = conn.unchecked_transaction()?;
        let mut load = BulkLoad::default();
        for record in reader.deserialize::<(i32, i32, i16)>() {
            let (longitude, latitude, elevation) = record?;
            load.read += 1;
            if self.insert.execute(params![longitude, latitude, elevation])? > 0 {
                load.written += 1;
            }
        }
        tx.commit()?;

        debug!(
            path = %path.display(),
            read = load.read,
            written = load.written,
            "Bulk load complete"
        );
        Ok(load)
    }
}
