#![forbid(unsafe_code)]

mod capture;
mod tables;

use crate::StoreError;
use rusqlite::{Connection, OptionalExtension, params};

pub(crate) use tables::NOW_MS_SQL;

pub(crate) const SCHEMA_VERSION: &str = "1";

/// Refuses to open a database written by an incompatible schema.
///
/// Returns whether the schema is already installed. Only reads.
pub(crate) fn preflight_gate(conn: &Connection) -> Result<bool, StoreError> {
    let has_meta = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if !has_meta {
        return Ok(false);
    }

    let stored = conn
        .query_row(
            "SELECT value FROM meta WHERE key='schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match stored {
        Some(stored) if stored != SCHEMA_VERSION => Err(StoreError::SchemaMismatch {
            expected: SCHEMA_VERSION.to_string(),
            stored,
        }),
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

pub(crate) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(&tables::tables_sql())?;
    conn.execute_batch(&capture::capture_sql())?;

    conn.execute(
        "INSERT OR IGNORE INTO document_versions(singleton, version_number) VALUES (1, 0)",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["history_floor", "0"],
    )?;
    // Written last: its presence marks a complete install.
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;

    Ok(())
}
