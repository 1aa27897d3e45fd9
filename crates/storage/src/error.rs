#![forbid(unsafe_code)]

use roadmap_core::{BatchOutcome, BatchValidationError, FailureKind, PatchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Internal misuse or corrupted bookkeeping; never the caller's input.
    #[error("store invariant violated: {0}")]
    Invariant(&'static str),
    #[error(transparent)]
    Validation(#[from] BatchValidationError),
    #[error(transparent)]
    Encode(#[from] PatchError),
    #[error("revision mismatch (expected={expected}, actual={actual})")]
    RevisionMismatch { expected: i64, actual: i64 },
    #[error("version did not advance by exactly one (expected={expected}, actual={actual})")]
    VersionNotAdvanced { expected: i64, actual: i64 },
    #[error("document version row is missing")]
    MissingVersion,
    #[error("schema version mismatch (expected={expected}, stored={stored})")]
    SchemaMismatch { expected: String, stored: String },
}

impl StoreError {
    /// Folds a failed write into its first-class outcome. A stale version is a normal result.
    pub fn into_outcome(self) -> BatchOutcome {
        match self {
            Self::RevisionMismatch { expected, actual } => BatchOutcome::Conflict { expected, actual },
            Self::Validation(_) | Self::InvalidInput(_) => BatchOutcome::Failure {
                kind: FailureKind::Validation,
                reason: self.to_string(),
            },
            other => BatchOutcome::Failure {
                kind: FailureKind::Store,
                reason: other.to_string(),
            },
        }
    }
}
