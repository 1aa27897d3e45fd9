#![forbid(unsafe_code)]

use proptest::prelude::*;
use roadmap_core::{
    BatchOutcome, BatchRequest, ChangeOperation, FailureKind, RowId, TaskStatus, TaskUpsert,
    TeamUpsert,
};
use roadmap_storage::SqliteStore;
use std::sync::{Arc, Barrier};
use tempfile::TempDir;

const USER: &str = "6f1c2b1e-0d4a-4c56-9a3e-2f7b8c9d0e1f";

fn fresh_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    (dir, store)
}

fn team(id: RowId, name: &str) -> TeamUpsert {
    let mut team = TeamUpsert::new(id);
    team.name = Some(Some(name.to_string()));
    team
}

fn task(id: RowId, status: TaskStatus) -> TaskUpsert {
    let mut task = TaskUpsert::new(id);
    task.status = Some(Some(status));
    task
}

fn team_batch(version: i64, id: RowId, name: &str) -> BatchRequest {
    let mut request = BatchRequest::new(version, USER);
    request.teams.push(team(id, name));
    request
}

#[test]
fn fresh_store_starts_at_version_zero() {
    let (_dir, store) = fresh_store();
    assert_eq!(store.current_version().expect("version"), 0);
}

#[test]
fn successful_batch_advances_version_by_exactly_one() {
    let (_dir, mut store) = fresh_store();
    let team_id = RowId::new_v4();

    let mut request = team_batch(0, team_id, "Platform");
    request.tasks.push(task(RowId::new_v4(), TaskStatus::Backlog));

    assert_eq!(
        store.apply_batch(&request),
        BatchOutcome::Success { version: 1 }
    );
    assert_eq!(store.current_version().expect("version"), 1);

    let snapshot = store.snapshot().expect("snapshot");
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.teams.len(), 1);
    assert_eq!(snapshot.tasks.len(), 1);
}

#[test]
fn stale_batch_conflicts_and_leaves_document_untouched() {
    let (_dir, mut store) = fresh_store();
    let team_id = RowId::new_v4();
    assert!(store.apply_batch(&team_batch(0, team_id, "Alpha")).is_success());

    let before = store.snapshot().expect("snapshot before");
    let log_before = store.changes_since(0).expect("diff before");

    let outcome = store.apply_batch(&team_batch(0, team_id, "Overwritten"));
    assert_eq!(
        outcome,
        BatchOutcome::Conflict {
            expected: 0,
            actual: 1
        }
    );

    assert_eq!(store.snapshot().expect("snapshot after"), before);
    assert_eq!(store.changes_since(0).expect("diff after"), log_before);
}

#[test]
fn resubmitting_a_committed_batch_is_a_conflict() {
    let (_dir, mut store) = fresh_store();
    let request = team_batch(0, RowId::new_v4(), "Alpha");

    assert_eq!(
        store.apply_batch(&request),
        BatchOutcome::Success { version: 1 }
    );
    assert_eq!(
        store.apply_batch(&request),
        BatchOutcome::Conflict {
            expected: 0,
            actual: 1
        }
    );
    assert_eq!(store.current_version().expect("version"), 1);
}

#[test]
fn omitted_fields_survive_and_explicit_nulls_clear() {
    let (_dir, mut store) = fresh_store();
    let id = RowId::new_v4();

    let mut create = BatchRequest::new(0, USER);
    let mut payload = task(id, TaskStatus::Todo);
    payload.epic = Some(Some("EPIC-7".to_string()));
    payload.weeks = Some(Some(vec![1.0, 2.0]));
    create.tasks.push(payload);
    assert!(store.apply_batch(&create).is_success());

    let mut rename = BatchRequest::new(1, USER);
    let mut payload = TaskUpsert::new(id);
    payload.task_name = Some(Some("Migrate billing".to_string()));
    rename.tasks.push(payload);
    assert!(store.apply_batch(&rename).is_success());

    let snapshot = store.snapshot().expect("snapshot");
    let stored = &snapshot.tasks[0];
    assert_eq!(stored.status, Some(TaskStatus::Todo));
    assert_eq!(stored.epic.as_deref(), Some("EPIC-7"));
    assert_eq!(stored.task_name.as_deref(), Some("Migrate billing"));
    assert_eq!(stored.weeks, vec![1.0, 2.0]);

    let mut clear = BatchRequest::new(2, USER);
    let mut payload = TaskUpsert::new(id);
    payload.epic = Some(None);
    payload.weeks = Some(Some(vec![3.0]));
    clear.tasks.push(payload);
    assert!(store.apply_batch(&clear).is_success());

    let snapshot = store.snapshot().expect("snapshot");
    let stored = &snapshot.tasks[0];
    assert_eq!(stored.epic, None);
    assert_eq!(stored.status, Some(TaskStatus::Todo));
    assert_eq!(stored.weeks, vec![3.0]);
}

#[test]
fn unknown_delete_table_is_a_validation_failure() {
    let (_dir, mut store) = fresh_store();
    let mut request = team_batch(0, RowId::new_v4(), "Alpha");
    request
        .deleted
        .insert("projects".to_string(), vec![RowId::new_v4()]);

    match store.apply_batch(&request) {
        BatchOutcome::Failure { kind, reason } => {
            assert_eq!(kind, FailureKind::Validation);
            assert!(reason.contains("projects"), "reason: {reason}");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(store.current_version().expect("version"), 0);
    assert!(store.snapshot().expect("snapshot").teams.is_empty());
}

#[test]
fn malformed_user_id_is_rejected_before_touching_the_store() {
    let (_dir, mut store) = fresh_store();
    let mut request = team_batch(0, RowId::new_v4(), "Alpha");
    request.user_id = "robert'); DROP TABLE teams;--".to_string();

    assert!(matches!(
        store.apply_batch(&request),
        BatchOutcome::Failure {
            kind: FailureKind::Validation,
            ..
        }
    ));
    assert_eq!(store.current_version().expect("version"), 0);
}

#[test]
fn batch_without_changes_is_rejected() {
    let (_dir, mut store) = fresh_store();
    let mut request = BatchRequest::new(0, USER);
    request.teams.push(TeamUpsert::new(RowId::new_v4()));

    assert!(matches!(
        store.apply_batch(&request),
        BatchOutcome::Failure {
            kind: FailureKind::Validation,
            ..
        }
    ));
    assert_eq!(store.current_version().expect("version"), 0);
}

#[test]
fn referential_violation_rolls_back_the_whole_batch() {
    let (_dir, mut store) = fresh_store();
    let mut request = team_batch(0, RowId::new_v4(), "Alpha");
    let mut orphan = task(RowId::new_v4(), TaskStatus::Todo);
    orphan.team_id = Some(Some(RowId::new_v4()));
    request.tasks.push(orphan);

    assert!(matches!(
        store.apply_batch(&request),
        BatchOutcome::Failure {
            kind: FailureKind::Store,
            ..
        }
    ));

    assert_eq!(store.current_version().expect("version"), 0);
    let snapshot = store.snapshot().expect("snapshot");
    assert!(snapshot.teams.is_empty());
    assert!(snapshot.tasks.is_empty());
    assert!(store.changes_since(0).expect("diff").changes.is_empty());
}

#[test]
fn deletes_release_dependents_before_their_owners() {
    let (_dir, mut store) = fresh_store();
    let team_id = RowId::new_v4();
    let task_id = RowId::new_v4();

    let mut create = team_batch(0, team_id, "Alpha");
    let mut owned = task(task_id, TaskStatus::Todo);
    owned.team_id = Some(Some(team_id));
    create.tasks.push(owned);
    assert!(store.apply_batch(&create).is_success());

    let mut remove = BatchRequest::new(1, USER);
    remove.deleted.insert("teams".to_string(), vec![team_id]);
    remove.deleted.insert("tasks".to_string(), vec![task_id]);
    assert_eq!(
        store.apply_batch(&remove),
        BatchOutcome::Success { version: 2 }
    );

    let snapshot = store.snapshot().expect("snapshot");
    assert!(snapshot.teams.is_empty());
    assert!(snapshot.tasks.is_empty());
}

#[test]
fn deleting_an_absent_row_still_commits_a_version() {
    let (_dir, mut store) = fresh_store();
    let mut request = BatchRequest::new(0, USER);
    request
        .deleted
        .insert("resources".to_string(), vec![RowId::new_v4()]);

    assert_eq!(
        store.apply_batch(&request),
        BatchOutcome::Success { version: 1 }
    );
    assert!(store.changes_since(0).expect("diff").changes.is_empty());
}

#[test]
fn task_upsert_at_version_three_is_visible_in_the_diff() {
    let (_dir, mut store) = fresh_store();
    for version in 0..3 {
        let outcome = store.apply_batch(&team_batch(version, RowId::new_v4(), "Team"));
        assert_eq!(
            outcome,
            BatchOutcome::Success {
                version: version + 1
            }
        );
    }
    assert_eq!(store.snapshot().expect("snapshot").version, 3);

    let t1 = RowId::new_v4();
    let mut request = BatchRequest::new(3, USER);
    request.tasks.push(task(t1, TaskStatus::Todo));
    assert_eq!(
        store.apply_batch(&request),
        BatchOutcome::Success { version: 4 }
    );

    let diff = store.changes_since(3).expect("diff");
    assert_eq!(diff.version, 4);
    assert_eq!(diff.changes.len(), 1);
    let entry = &diff.changes[0];
    assert_eq!(entry.version, 4);
    assert_eq!(entry.table, "tasks");
    assert_eq!(entry.record_id, t1);
    assert_eq!(entry.operation, ChangeOperation::Upsert);
}

#[test]
fn concurrent_writers_on_the_same_version_never_both_succeed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stores = (0..2)
        .map(|_| SqliteStore::open(dir.path()).expect("open store"))
        .collect::<Vec<_>>();
    let barrier = Arc::new(Barrier::new(stores.len()));

    let handles = stores
        .into_iter()
        .enumerate()
        .map(|(idx, mut store)| {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let request = team_batch(0, RowId::new_v4(), &format!("writer-{idx}"));
                barrier.wait();
                store.apply_batch(&request)
            })
        })
        .collect::<Vec<_>>();

    let outcomes = handles
        .into_iter()
        .map(|handle| handle.join().expect("writer thread"))
        .collect::<Vec<_>>();

    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    assert_eq!(successes, 1, "outcomes: {outcomes:?}");
    assert!(outcomes.contains(&BatchOutcome::Success { version: 1 }));
    assert!(outcomes.contains(&BatchOutcome::Conflict {
        expected: 0,
        actual: 1
    }));

    let store = SqliteStore::open(dir.path()).expect("reopen store");
    assert_eq!(store.current_version().expect("version"), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn version_advances_only_on_matching_batches(guesses in prop::collection::vec(0i64..6, 1..8)) {
        let (_dir, mut store) = fresh_store();
        let mut current = 0i64;

        for guess in guesses {
            let outcome = store.apply_batch(&team_batch(guess, RowId::new_v4(), "Team"));
            if guess == current {
                prop_assert_eq!(outcome, BatchOutcome::Success { version: current + 1 });
                current += 1;
            } else {
                prop_assert_eq!(outcome, BatchOutcome::Conflict { expected: guess, actual: current });
            }
            prop_assert_eq!(store.current_version().expect("version"), current);
        }
    }
}
