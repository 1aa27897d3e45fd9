#![forbid(unsafe_code)]

use roadmap_core::{RowId, Table, TeamUpsert, UserId};
use roadmap_storage::{SqliteStore, StoreError};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn fresh_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    (dir, store)
}

fn actor() -> UserId {
    UserId::try_new("5c4b3a29-1807-4f6e-9d5c-4b3a29180716").expect("user id")
}

fn named_team(name: &str) -> TeamUpsert {
    let mut team = TeamUpsert::new(RowId::new_v4());
    team.name = Some(Some(name.to_string()));
    team
}

#[test]
fn dropped_unit_of_work_rolls_back() {
    let (_dir, mut store) = fresh_store();
    {
        let mut uow = store.begin_unit_of_work().expect("begin");
        uow.attach_actor(&actor()).expect("attach");
        uow.upsert(&named_team("Ghost")).expect("upsert");
        assert_eq!(uow.advance_version().expect("advance"), 1);
        assert_eq!(uow.current_version().expect("version inside"), 1);
    }

    assert_eq!(store.current_version().expect("version"), 0);
    assert!(store.snapshot().expect("snapshot").teams.is_empty());
    assert!(store.changes_since(0).expect("diff").changes.is_empty());
}

#[test]
fn mutations_require_an_attached_actor() {
    let (_dir, mut store) = fresh_store();
    let uow = store.begin_unit_of_work().expect("begin");
    assert!(matches!(
        uow.upsert(&named_team("Anonymous")),
        Err(StoreError::Invariant(_))
    ));
    assert!(matches!(
        uow.delete(Table::Teams, RowId::new_v4()),
        Err(StoreError::Invariant(_))
    ));
}

#[test]
fn version_advances_once_and_must_advance_before_commit() {
    let (_dir, mut store) = fresh_store();

    let mut uow = store.begin_unit_of_work().expect("begin");
    uow.attach_actor(&actor()).expect("attach");
    uow.upsert(&named_team("Alpha")).expect("upsert");
    assert!(matches!(
        uow.commit(),
        Err(StoreError::VersionNotAdvanced {
            expected: 1,
            actual: 0
        })
    ));
    assert_eq!(store.current_version().expect("version"), 0);

    let mut uow = store.begin_unit_of_work().expect("begin");
    uow.attach_actor(&actor()).expect("attach");
    uow.upsert(&named_team("Alpha")).expect("upsert");
    uow.advance_version().expect("advance");
    assert!(matches!(
        uow.advance_version(),
        Err(StoreError::Invariant(_))
    ));
    assert!(matches!(
        uow.upsert(&named_team("Late")),
        Err(StoreError::Invariant(_))
    ));
    assert_eq!(uow.commit().expect("commit"), 1);

    let snapshot = store.snapshot().expect("snapshot");
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.teams.len(), 1);
}

#[test]
fn delete_reports_whether_a_row_was_removed() {
    let (_dir, mut store) = fresh_store();
    let team = named_team("Alpha");
    let id = team.id;

    let mut uow = store.begin_unit_of_work().expect("begin");
    uow.attach_actor(&actor()).expect("attach");
    uow.upsert(&team).expect("upsert");
    assert!(uow.delete(Table::Teams, id).expect("delete existing"));
    assert!(!uow.delete(Table::Teams, id).expect("delete missing"));
    uow.advance_version().expect("advance");
    uow.commit().expect("commit");

    let diff = store.changes_since(0).expect("diff");
    assert_eq!(diff.changes.len(), 1);
    assert_eq!(diff.changes[0].record_id, id);
}

#[test]
fn fresh_readers_do_not_wait_for_an_open_unit_of_work() {
    let (dir, mut writer) = fresh_store();
    let mut uow = writer.begin_unit_of_work().expect("begin");
    uow.attach_actor(&actor()).expect("attach");
    uow.upsert(&named_team("Pending")).expect("upsert");

    let started = Instant::now();
    let mut reader = SqliteStore::open(dir.path()).expect("open reader while writer holds lock");
    assert_eq!(reader.current_version().expect("version"), 0);
    let snapshot = reader.snapshot().expect("snapshot");
    assert_eq!(snapshot.version, 0);
    assert!(snapshot.teams.is_empty());
    assert!(reader.changes_since(0).expect("diff").changes.is_empty());
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "reads waited {:?}",
        started.elapsed()
    );

    uow.advance_version().expect("advance");
    assert_eq!(uow.commit().expect("commit"), 1);
    assert_eq!(reader.current_version().expect("version after commit"), 1);
}
