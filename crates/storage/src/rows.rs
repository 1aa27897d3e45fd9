#![forbid(unsafe_code)]

//! Column decoding shared by the read paths.

use roadmap_core::{RowId, TaskStatus, TimestampMs};
use rusqlite::Row;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;

fn conversion_error(
    idx: usize,
    kind: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, kind, Box::new(err))
}

pub(crate) fn row_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<RowId> {
    let raw: String = row.get(idx)?;
    RowId::try_new(&raw).map_err(|err| conversion_error(idx, Type::Text, err))
}

pub(crate) fn opt_row_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<RowId>> {
    let raw: Option<String> = row.get(idx)?;
    raw.as_deref()
        .map(RowId::try_new)
        .transpose()
        .map_err(|err| conversion_error(idx, Type::Text, err))
}

/// Array column stored as JSON text. NULL and `null` both read as empty.
pub(crate) fn json_vec<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<T>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str::<Option<Vec<T>>>(&text)
            .map(Option::unwrap_or_default)
            .map_err(|err| conversion_error(idx, Type::Text, err)),
    }
}

pub(crate) fn opt_json(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|err| conversion_error(idx, Type::Text, err))
}

pub(crate) fn opt_flag(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<bool>> {
    let raw: Option<i64> = row.get(idx)?;
    Ok(raw.map(|value| value != 0))
}

pub(crate) fn opt_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<TaskStatus>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(text) => TaskStatus::parse(&text)
            .map(Some)
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(idx, text, Type::Text)),
    }
}

pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<TimestampMs> {
    row.get::<_, i64>(idx).map(TimestampMs::from_millis)
}
