#![forbid(unsafe_code)]

use crate::schema::NOW_MS_SQL;
use crate::{SqliteStore, StoreError, read_version};
use roadmap_core::{FieldValue, RowId, Table, Upsert, UserId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Transaction, TransactionBehavior, params, params_from_iter};

/// One atomic write against the document.
///
/// Holds the database write lock from `begin` until commit or drop; dropping without
/// [`UnitOfWork::commit`] rolls everything back, including captured changes.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    base_version: i64,
    pending_version: Option<i64>,
    advanced: bool,
}

impl SqliteStore {
    pub fn begin_unit_of_work(&mut self) -> Result<UnitOfWork<'_>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let base_version = read_version(&tx)?;
        Ok(UnitOfWork {
            tx,
            base_version,
            pending_version: None,
            advanced: false,
        })
    }
}

impl UnitOfWork<'_> {
    /// Document version observed when the write lock was taken.
    pub fn base_version(&self) -> i64 {
        self.base_version
    }

    /// Publishes the acting user and the version this unit of work will commit as, so every
    /// captured change is attributed and tagged.
    pub fn attach_actor(&mut self, user_id: &UserId) -> Result<(), StoreError> {
        let pending = self
            .base_version
            .checked_add(1)
            .ok_or(StoreError::Invariant("document version overflow"))?;
        self.tx.execute(
            "INSERT OR REPLACE INTO sync_session(singleton, user_id, version) VALUES (1, ?1, ?2)",
            params![user_id.to_string(), pending],
        )?;
        self.pending_version = Some(pending);
        Ok(())
    }

    /// Inserts the row, or overwrites only the supplied columns when the id already exists.
    pub fn upsert(&self, row: &dyn Upsert) -> Result<(), StoreError> {
        self.require_open()?;

        let table = row.table().as_str();
        let assignments = row.assignments()?;

        let mut columns = vec!["id"];
        let mut values = vec![SqlValue::Text(row.id().to_string())];
        for assignment in &assignments {
            columns.push(assignment.column);
            values.push(sql_value(&assignment.value));
        }

        let placeholders = (1..=columns.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");

        let on_conflict = if assignments.is_empty() {
            "DO NOTHING".to_string()
        } else {
            let sets = assignments
                .iter()
                .map(|a| format!("{column}=excluded.{column}", column = a.column))
                .collect::<Vec<_>>()
                .join(", ");
            format!("DO UPDATE SET {sets}, updated_at_ms={NOW_MS_SQL}")
        };

        let sql = format!(
            "INSERT INTO {table}({}) VALUES ({placeholders}) ON CONFLICT(id) {on_conflict}",
            columns.join(", ")
        );
        self.tx.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Removes the row if present. Returns whether a row was removed.
    pub fn delete(&self, table: Table, id: RowId) -> Result<bool, StoreError> {
        self.require_open()?;

        let sql = format!("DELETE FROM {} WHERE id=?1", table.as_str());
        let removed = self.tx.execute(&sql, params![id.to_string()])?;
        Ok(removed > 0)
    }

    /// Moves the document to its next version and retires the session row. Callable once.
    pub fn advance_version(&mut self) -> Result<i64, StoreError> {
        let pending = self.require_open()?;

        let changed = self.tx.execute(
            &format!(
                "UPDATE document_versions SET version_number=?1, updated_at_ms={NOW_MS_SQL} \
                 WHERE singleton=1 AND version_number=?2"
            ),
            params![pending, self.base_version],
        )?;
        if changed != 1 {
            let actual = read_version(&self.tx)?;
            return Err(StoreError::VersionNotAdvanced {
                expected: pending,
                actual,
            });
        }

        self.tx.execute("DELETE FROM sync_session", [])?;
        self.advanced = true;
        Ok(pending)
    }

    /// Version as seen inside this unit of work.
    pub fn current_version(&self) -> Result<i64, StoreError> {
        read_version(&self.tx)
    }

    /// Commits and returns the new version, verified to be exactly one past the base.
    pub fn commit(self) -> Result<i64, StoreError> {
        let expected = self.base_version + 1;
        if !self.advanced {
            return Err(StoreError::VersionNotAdvanced {
                expected,
                actual: self.base_version,
            });
        }

        let actual = read_version(&self.tx)?;
        if actual != expected {
            return Err(StoreError::VersionNotAdvanced { expected, actual });
        }

        self.tx.commit()?;
        Ok(actual)
    }

    fn require_open(&self) -> Result<i64, StoreError> {
        if self.advanced {
            return Err(StoreError::Invariant("unit of work already advanced"));
        }
        self.pending_version
            .ok_or(StoreError::Invariant("no actor attached to unit of work"))
    }
}

fn sql_value(value: &FieldValue) -> SqlValue {
    match value {
        FieldValue::Null | FieldValue::Json(serde_json::Value::Null) => SqlValue::Null,
        FieldValue::Text(text) => SqlValue::Text(text.clone()),
        FieldValue::Integer(value) => SqlValue::Integer(*value),
        FieldValue::Real(value) => SqlValue::Real(*value),
        FieldValue::Json(value) => SqlValue::Text(value.to_string()),
    }
}
