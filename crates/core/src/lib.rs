#![forbid(unsafe_code)]

//! Document model and pure synchronization logic shared by the store and the HTTP surface.

pub mod batch;
pub mod feed;
pub mod ids;
pub mod model;
pub mod ordering;
pub mod patch;
pub mod time;

pub use batch::{
    BatchOutcome, BatchRequest, BatchValidationError, FailureKind, UpdateResponse, ValidatedBatch,
};
pub use feed::{ChangeLogEntry, ChangeOperation, Diff, Snapshot, VersionInfo};
pub use ids::{IdError, RowId, UserId};
pub use model::{Employee, Function, Resource, RowKind, Sprint, Table, Task, TaskStatus, Team};
pub use ordering::{Linked, reconstruct_order};
pub use patch::{
    Assignment, EmployeeUpsert, FieldValue, FunctionUpsert, PatchError, ResourceUpsert,
    SprintUpsert, TaskUpsert, TeamUpsert, Upsert,
};
pub use time::TimestampMs;
