#![forbid(unsafe_code)]

use crate::{SqliteStore, StoreError, read_version};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, instrument};

const HISTORY_FLOOR_KEY: &str = "history_floor";

impl SqliteStore {
    /// Drops change-log entries at or below `through_version` and raises the history floor.
    ///
    /// Never called by the sync paths. Clients whose baseline falls below the floor are told to
    /// reload a snapshot. Returns the number of entries removed.
    #[instrument(skip(self))]
    pub fn prune_change_log(&mut self, through_version: i64) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;

        let current = read_version(&tx)?;
        if through_version < 0 || through_version > current {
            return Err(StoreError::InvalidInput(
                "prune bound must be between 0 and the current version",
            ));
        }

        let floor = history_floor(&tx)?;
        if through_version <= floor {
            tx.commit()?;
            return Ok(0);
        }

        let removed = tx.execute(
            "DELETE FROM change_log WHERE version_number <= ?1",
            params![through_version],
        )?;
        tx.execute(
            "INSERT INTO meta(key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![HISTORY_FLOOR_KEY, through_version.to_string()],
        )?;
        tx.commit()?;

        info!(through_version, removed, "change log pruned");
        Ok(removed)
    }

    /// Oldest baseline from which the change log is still complete.
    pub fn history_floor(&self) -> Result<i64, StoreError> {
        history_floor(&self.conn)
    }
}

pub(crate) fn history_floor(conn: &Connection) -> Result<i64, StoreError> {
    let raw = conn
        .query_row(
            "SELECT value FROM meta WHERE key=?1",
            params![HISTORY_FLOOR_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    match raw {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| StoreError::Invariant("history floor is not an integer")),
    }
}
