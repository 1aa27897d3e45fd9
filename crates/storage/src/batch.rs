#![forbid(unsafe_code)]

use crate::{SqliteStore, StoreError};
use roadmap_core::{BatchOutcome, BatchRequest};
use tracing::{debug, info, instrument, warn};

impl SqliteStore {
    /// Applies a client batch atomically if it was made against the current version.
    ///
    /// Exactly one outcome is produced. On anything but `Success` the document, its version and
    /// the change log are untouched.
    #[instrument(skip(self, request), fields(version = request.version, user = %request.user_id))]
    pub fn apply_batch(&mut self, request: &BatchRequest) -> BatchOutcome {
        match self.write_batch(request) {
            Ok(version) => {
                info!(version, "batch committed");
                BatchOutcome::Success { version }
            }
            Err(err) => {
                let outcome = err.into_outcome();
                match &outcome {
                    BatchOutcome::Conflict { expected, actual } => {
                        info!(expected, actual, "batch rejected: stale version");
                    }
                    BatchOutcome::Failure { kind, reason } => {
                        warn!(?kind, %reason, "batch failed");
                    }
                    BatchOutcome::Success { .. } => {}
                }
                outcome
            }
        }
    }

    fn write_batch(&mut self, request: &BatchRequest) -> Result<i64, StoreError> {
        let validated = request.validate()?;

        let mut uow = self.begin_unit_of_work()?;
        let actual = uow.base_version();
        if actual != request.version {
            return Err(StoreError::RevisionMismatch {
                expected: request.version,
                actual,
            });
        }

        uow.attach_actor(&validated.user_id)?;
        for row in request.upserts() {
            uow.upsert(row)?;
        }
        for (table, id) in &validated.deletes {
            if !uow.delete(*table, *id)? {
                debug!(table = table.as_str(), %id, "delete target already absent");
            }
        }
        uow.advance_version()?;
        uow.commit()
    }
}
