#![forbid(unsafe_code)]

//! SQLite-backed document store: versioned batch writes, change capture, snapshot and diff reads.

mod batch;
mod diff;
mod error;
mod maintenance;
mod rows;
mod schema;
mod snapshot;
mod unit_of_work;

pub use error::StoreError;
pub use unit_of_work::UnitOfWork;

use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DB_FILE_NAME: &str = "roadmap.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    /// Opens the store, installing the schema on first use.
    ///
    /// Once the schema is installed, opening only reads: it never takes the write lock, so it
    /// does not wait behind an in-flight batch.
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        if !schema::preflight_gate(&conn)? {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            schema::install_schema(&conn)?;
            debug!(storage_dir = %storage_dir.display(), "schema installed");
        }

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Latest committed document version. Zero before the first batch.
    pub fn current_version(&self) -> Result<i64, StoreError> {
        read_version(&self.conn)
    }
}

pub(crate) fn read_version(conn: &Connection) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT version_number FROM document_versions WHERE singleton=1",
        [],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .ok_or(StoreError::MissingVersion)
}
