#![forbid(unsafe_code)]

use crate::ids::RowId;
use crate::model::{Employee, Function, Resource, Sprint, Task, Team};
use crate::time::TimestampMs;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: i64,
}

/// Full document state at one version, for initial client load.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub version: i64,
    pub teams: Vec<Team>,
    pub sprints: Vec<Sprint>,
    pub functions: Vec<Function>,
    pub employees: Vec<Employee>,
    pub resources: Vec<Resource>,
    pub tasks: Vec<Task>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Upsert,
    Delete,
}

impl ChangeOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upsert" => Some(Self::Upsert),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One mutated row within one committed batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub seq: i64,
    pub version: i64,
    pub table: String,
    pub record_id: RowId,
    pub operation: ChangeOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_data: Option<Value>,
    pub created_at: TimestampMs,
}

/// Changes after a client's baseline.
///
/// `resync_required` is set when the baseline predates retained history, in which case `changes`
/// is incomplete and the client must reload a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub version: i64,
    pub changes: Vec<ChangeLogEntry>,
    pub resync_required: bool,
}
