use notekeep_core::db::open_db_in_memory;
use notekeep_core::{
    ManualClock, NoteDraft, NoteService, NoteServiceError, NoteValidationError, SearchQuery,
    SqliteNoteRepository,
};
use rusqlite::{params, Connection};

fn insert_account(conn: &Connection, username: &str) -> i64 {
    conn.execute(
        "INSERT INTO accounts (username, password_hash, created_at) VALUES (?1, 'x', 0);",
        params![username],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn service<'a>(
    conn: &'a Connection,
    clock: &'a ManualClock,
) -> NoteService<SqliteNoteRepository<'a>, &'a ManualClock> {
    NoteService::new(SqliteNoteRepository::try_new(conn).unwrap(), clock)
}

#[test]
fn create_stamps_clock_and_forces_owner() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let clock = ManualClock::new(10_000);
    let notes = service(&conn, &clock);

    let note = notes
        .create_note(Some(alice), &NoteDraft::new("a", "b"))
        .unwrap();
    assert_eq!(note.owner, alice);
    assert_eq!(note.created_at, 10_000);
    assert_eq!(note.modified_at, 10_000);

    let detail = notes.note_detail(Some(alice), note.id).unwrap();
    assert_eq!(detail.title, "a");
    assert_eq!(detail.content, "b");
    assert_eq!(detail.created_at, detail.modified_at);
}

#[test]
fn anonymous_actor_is_unauthenticated_everywhere() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let clock = ManualClock::new(1);
    let notes = service(&conn, &clock);
    let note = notes
        .create_note(Some(alice), &NoteDraft::new("a", ""))
        .unwrap();

    assert!(matches!(
        notes.create_note(None, &NoteDraft::new("a", "")),
        Err(NoteServiceError::Unauthenticated)
    ));
    assert!(matches!(
        notes.list_notes(None, &SearchQuery::all()),
        Err(NoteServiceError::Unauthenticated)
    ));
    assert!(matches!(
        notes.note_detail(None, note.id),
        Err(NoteServiceError::Unauthenticated)
    ));
    assert!(matches!(
        notes.note_detail(None, 999),
        Err(NoteServiceError::Unauthenticated)
    ));
    assert!(matches!(
        notes.update_note(None, note.id, &NoteDraft::new("b", "")),
        Err(NoteServiceError::Unauthenticated)
    ));
    assert!(matches!(
        notes.delete_note(None, note.id),
        Err(NoteServiceError::Unauthenticated)
    ));
}

#[test]
fn non_owner_is_forbidden_and_missing_note_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let bob = insert_account(&conn, "bob");
    let clock = ManualClock::new(1);
    let notes = service(&conn, &clock);
    let note = notes
        .create_note(Some(alice), &NoteDraft::new("private", "secret"))
        .unwrap();

    assert!(matches!(
        notes.note_detail(Some(bob), note.id),
        Err(NoteServiceError::Forbidden(id)) if id == note.id
    ));
    assert!(matches!(
        notes.prepare_update(Some(bob), note.id),
        Err(NoteServiceError::Forbidden(_))
    ));
    assert!(matches!(
        notes.update_note(Some(bob), note.id, &NoteDraft::new("hijack", "")),
        Err(NoteServiceError::Forbidden(_))
    ));
    assert!(matches!(
        notes.prepare_delete(Some(bob), note.id),
        Err(NoteServiceError::Forbidden(_))
    ));
    assert!(matches!(
        notes.delete_note(Some(bob), note.id),
        Err(NoteServiceError::Forbidden(_))
    ));

    let untouched = notes.note_detail(Some(alice), note.id).unwrap();
    assert_eq!(untouched, note);

    for result in [
        notes.note_detail(Some(bob), 1_000_000).map(|_| ()),
        notes
            .update_note(Some(bob), 1_000_000, &NoteDraft::new("a", "b"))
            .map(|_| ()),
        notes.delete_note(Some(bob), 1_000_000),
    ] {
        assert!(matches!(result, Err(NoteServiceError::NotFound(1_000_000))));
    }
}

#[test]
fn update_refreshes_modified_only() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let clock = ManualClock::new(1_000);
    let notes = service(&conn, &clock);
    let note = notes
        .create_note(Some(alice), &NoteDraft::new("draft", ""))
        .unwrap();

    clock.set(2_000);
    let read = notes.note_detail(Some(alice), note.id).unwrap();
    assert_eq!(read.modified_at, 1_000, "reads never touch modified_at");

    let updated = notes
        .update_note(Some(alice), note.id, &NoteDraft::new("a", "b"))
        .unwrap();
    assert_eq!(updated.title, "a");
    assert_eq!(updated.content, "b");
    assert_eq!(updated.created_at, 1_000);
    assert_eq!(updated.modified_at, 2_000);
}

#[test]
fn rejected_update_keeps_title_and_modified() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let clock = ManualClock::new(1_000);
    let notes = service(&conn, &clock);
    let note = notes
        .create_note(Some(alice), &NoteDraft::new("keep me", "body"))
        .unwrap();

    clock.advance(500);
    let err = notes
        .update_note(Some(alice), note.id, &NoteDraft::new("", "b"))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::EmptyTitle)
    ));

    let stored = notes.note_detail(Some(alice), note.id).unwrap();
    assert_eq!(stored.title, "keep me");
    assert_eq!(stored.content, "body");
    assert_eq!(stored.modified_at, 1_000);
}

#[test]
fn delete_twice_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let clock = ManualClock::new(1);
    let notes = service(&conn, &clock);
    let note = notes
        .create_note(Some(alice), &NoteDraft::new("gone", ""))
        .unwrap();

    notes.delete_note(Some(alice), note.id).unwrap();
    assert!(matches!(
        notes.delete_note(Some(alice), note.id),
        Err(NoteServiceError::NotFound(_))
    ));
    assert!(notes
        .list_notes(Some(alice), &SearchQuery::all())
        .unwrap()
        .is_empty());
}

#[test]
fn diary_and_groceries_scenario() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let bob = insert_account(&conn, "bob");
    let clock = ManualClock::new(1);
    let notes = service(&conn, &clock);

    let diary = notes
        .create_note(Some(alice), &NoteDraft::new("Diary Entry", "x"))
        .unwrap();
    clock.advance(1);
    notes
        .create_note(Some(bob), &NoteDraft::new("Groceries", "x"))
        .unwrap();

    let query = SearchQuery::parse(Some("diary"));
    assert_eq!(notes.list_notes(Some(alice), &query).unwrap(), vec![diary]);
    assert!(notes.list_notes(Some(bob), &query).unwrap().is_empty());
}

#[test]
fn list_is_newest_first_for_each_owner() {
    let conn = open_db_in_memory().unwrap();
    let alice = insert_account(&conn, "alice");
    let clock = ManualClock::new(0);
    let notes = service(&conn, &clock);

    for (created_at, title) in [(2, "note 1"), (1, "note 2"), (3, "note 3")] {
        clock.set(created_at);
        notes
            .create_note(Some(alice), &NoteDraft::new(title, ""))
            .unwrap();
    }

    let listed: Vec<String> = notes
        .list_notes(Some(alice), &SearchQuery::all())
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect();
    assert_eq!(listed, vec!["note 3", "note 1", "note 2"]);
}
