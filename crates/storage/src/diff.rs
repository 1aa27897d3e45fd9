#![forbid(unsafe_code)]

use crate::maintenance::history_floor;
use crate::rows::{opt_json, row_id, timestamp};
use crate::{SqliteStore, StoreError, read_version};
use roadmap_core::{ChangeLogEntry, ChangeOperation, Diff};
use rusqlite::params;
use rusqlite::types::Type;
use tracing::{debug, instrument};

impl SqliteStore {
    /// Every change recorded after `baseline`, oldest first.
    ///
    /// A baseline at or past the current version yields no changes. A baseline below the
    /// retained history floor sets `resync_required`.
    #[instrument(skip(self))]
    pub fn changes_since(&mut self, baseline: i64) -> Result<Diff, StoreError> {
        let tx = self.conn.transaction()?;

        let version = read_version(&tx)?;
        let floor = history_floor(&tx)?;

        let changes = {
            let mut stmt = tx.prepare(
                "SELECT seq, version_number, table_name, record_id, operation, user_id, \
                        old_data, new_data, created_at_ms \
                 FROM change_log \
                 WHERE version_number > ?1 \
                 ORDER BY version_number ASC, created_at_ms ASC, seq ASC",
            )?;
            let rows = stmt.query_map(params![baseline], |row| {
                let operation: String = row.get(4)?;
                let operation = ChangeOperation::parse(&operation)
                    .ok_or_else(|| rusqlite::Error::InvalidColumnType(4, operation, Type::Text))?;
                Ok(ChangeLogEntry {
                    seq: row.get(0)?,
                    version: row.get(1)?,
                    table: row.get(2)?,
                    record_id: row_id(row, 3)?,
                    operation,
                    user_id: row.get(5)?,
                    old_data: opt_json(row, 6)?,
                    new_data: opt_json(row, 7)?,
                    created_at: timestamp(row, 8)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            out
        };

        tx.commit()?;

        let resync_required = baseline < floor;
        debug!(version, changes = changes.len(), resync_required, "diff read");

        Ok(Diff {
            version,
            changes,
            resync_required,
        })
    }
}
