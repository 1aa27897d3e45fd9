#![forbid(unsafe_code)]

use crate::ids::{IdError, RowId, UserId};
use crate::model::Table;
use crate::patch::{
    EmployeeUpsert, FunctionUpsert, ResourceUpsert, SprintUpsert, TaskUpsert, TeamUpsert, Upsert,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A client's accumulated edits, tagged with the document version they were made against.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub version: i64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub teams: Vec<TeamUpsert>,
    #[serde(default)]
    pub sprints: Vec<SprintUpsert>,
    #[serde(default)]
    pub functions: Vec<FunctionUpsert>,
    #[serde(default)]
    pub employees: Vec<EmployeeUpsert>,
    #[serde(default)]
    pub resources: Vec<ResourceUpsert>,
    #[serde(default)]
    pub tasks: Vec<TaskUpsert>,
    /// Table name to identifiers. Table names are checked by [`BatchRequest::validate`].
    #[serde(default)]
    pub deleted: BTreeMap<String, Vec<RowId>>,
}

impl BatchRequest {
    pub fn new(version: i64, user_id: impl Into<String>) -> Self {
        Self {
            version,
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Upserts in dependency order: teams, sprints, functions, employees, resources, tasks.
    pub fn upserts(&self) -> impl Iterator<Item = &dyn Upsert> {
        let teams = self.teams.iter().map(|u| u as &dyn Upsert);
        let sprints = self.sprints.iter().map(|u| u as &dyn Upsert);
        let functions = self.functions.iter().map(|u| u as &dyn Upsert);
        let employees = self.employees.iter().map(|u| u as &dyn Upsert);
        let resources = self.resources.iter().map(|u| u as &dyn Upsert);
        let tasks = self.tasks.iter().map(|u| u as &dyn Upsert);
        teams
            .chain(sprints)
            .chain(functions)
            .chain(employees)
            .chain(resources)
            .chain(tasks)
    }

    pub fn upsert_count(&self) -> usize {
        self.teams.len()
            + self.sprints.len()
            + self.functions.len()
            + self.employees.len()
            + self.resources.len()
            + self.tasks.len()
    }

    /// True when the batch deletes something or supplies at least one non-identifier field.
    pub fn has_changes(&self) -> bool {
        self.deleted.values().any(|ids| !ids.is_empty()) || self.upserts().any(|u| u.has_changes())
    }

    /// Checks everything that can be checked without the store.
    pub fn validate(&self) -> Result<ValidatedBatch, BatchValidationError> {
        let user_id = UserId::try_new(&self.user_id).map_err(BatchValidationError::InvalidUserId)?;

        let mut deletes = Vec::new();
        for (name, ids) in &self.deleted {
            let table =
                Table::parse(name).ok_or_else(|| BatchValidationError::UnknownTable(name.clone()))?;
            deletes.extend(ids.iter().map(|id| (table, *id)));
        }
        deletes.sort_by_key(|(table, _)| table.delete_rank());

        if !self.has_changes() {
            return Err(BatchValidationError::NoChanges);
        }

        Ok(ValidatedBatch { user_id, deletes })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub user_id: UserId,
    /// Delete targets, dependents first.
    pub deletes: Vec<(Table, RowId)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BatchValidationError {
    #[error("invalid user id: {0}")]
    InvalidUserId(IdError),
    #[error("unknown table for deletion: {0}")]
    UnknownTable(String),
    #[error("at least one field must be provided for update (not just id)")]
    NoChanges,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Malformed input; retrying the same batch cannot succeed.
    Validation,
    /// The store could not complete the unit of work; retry after backoff.
    Store,
}

/// Result of one batch write. Exactly one of these is produced per attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Success { version: i64 },
    Conflict { expected: i64, actual: i64 },
    Failure { kind: FailureKind, reason: String },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn to_response(&self) -> UpdateResponse {
        match self {
            Self::Success { version } => UpdateResponse {
                version: Some(*version),
                success: true,
                error: None,
                failure: None,
            },
            Self::Conflict { expected, actual } => UpdateResponse {
                version: Some(*actual),
                success: false,
                error: Some(format!(
                    "Version conflict: client version {expected}, server version {actual}"
                )),
                failure: None,
            },
            Self::Failure { kind, reason } => UpdateResponse {
                version: None,
                success: false,
                error: Some(reason.clone()),
                failure: Some(*kind),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}
