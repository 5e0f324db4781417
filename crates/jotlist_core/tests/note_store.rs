use jotlist_core::db::migrations::latest_version;
use jotlist_core::db::open_db_in_memory;
use jotlist_core::{Note, NoteDraft, NoteRepository, NoteService, RepoError, SqliteNoteRepository};
use rusqlite::Connection;

#[test]
fn insert_assigns_increasing_ids_and_get_by_id_round_trips() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let drafts = [
        NoteDraft::new("first", "alpha"),
        NoteDraft::new("", "only content"),
        NoteDraft {
            important: true,
            ..NoteDraft::new("flagged", "")
        },
    ];
    let mut ids = Vec::new();
    for draft in &drafts {
        ids.push(repo.insert(draft).unwrap());
    }

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    for (id, draft) in ids.iter().zip(drafts.iter()) {
        let loaded = repo.get_by_id(*id).unwrap().unwrap();
        assert_eq!(loaded.to_draft(), *draft);
    }
}

#[test]
fn insert_does_not_validate_blank_drafts() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let id = repo.insert(&NoteDraft::new("", "")).unwrap();
    assert_eq!(repo.get_by_id(id).unwrap().unwrap().title, "");
}

#[test]
fn get_all_is_ordered_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    for idx in 0..5 {
        repo.insert(&NoteDraft::new(format!("note {idx}"), "")).unwrap();
    }

    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|pair| pair[0].id > pair[1].id));
    assert_eq!(all[0].title, "note 4");
}

#[test]
fn get_all_on_empty_store_is_empty() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    assert!(repo.get_all().unwrap().is_empty());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn update_rewrites_all_fields_and_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let id = repo.insert(&NoteDraft::new("draft", "text")).unwrap();

    let edited = Note {
        id,
        title: String::new(),
        content: String::new(),
        important: true,
    };
    assert!(repo.update(&edited).unwrap());
    let once = repo.get_all().unwrap();
    assert!(repo.update(&edited).unwrap());
    let twice = repo.get_all().unwrap();

    assert_eq!(once, twice);
    assert_eq!(repo.get_by_id(id).unwrap(), Some(edited));
}

#[test]
fn update_of_missing_id_is_a_silent_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    repo.insert(&NoteDraft::new("keep", "")).unwrap();

    let ghost = Note {
        id: 999,
        title: "ghost".to_string(),
        content: String::new(),
        important: false,
    };
    assert!(!repo.update(&ghost).unwrap());
    assert_eq!(repo.count().unwrap(), 1);
    assert_eq!(repo.get_by_id(999).unwrap(), None);
}

#[test]
fn delete_is_final_and_repeatable() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let id = repo.insert(&NoteDraft::new("gone soon", "")).unwrap();

    assert!(repo.delete(id).unwrap());
    assert_eq!(repo.get_by_id(id).unwrap(), None);
    assert!(!repo.delete(id).unwrap());
}

#[test]
fn deleted_ids_are_never_reused() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let first = repo.insert(&NoteDraft::new("a", "")).unwrap();
    let newest = repo.insert(&NoteDraft::new("b", "")).unwrap();
    repo.delete(newest).unwrap();

    let next = repo.insert(&NoteDraft::new("c", "")).unwrap();
    assert!(next > newest);
    assert!(next > first);
}

#[test]
fn seed_if_empty_inserts_exactly_once() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let seeded = repo.seed_if_empty(&NoteDraft::welcome()).unwrap();
    assert!(seeded.is_some());
    assert_eq!(repo.seed_if_empty(&NoteDraft::welcome()).unwrap(), None);

    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].important);
    assert_eq!(Some(all[0].id), seeded);
}

#[test]
fn service_reload_seeds_empty_store_then_lists() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let first = service.reload().unwrap();
    assert!(first.seeded.is_some());
    assert_eq!(first.notes.len(), 1);
    assert!(first.notes[0].important);

    let second = service.reload().unwrap();
    assert_eq!(second.seeded, None);
    assert_eq!(second.notes, first.notes);
}

#[test]
fn service_create_and_edit_return_fresh_snapshots() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let service = NoteService::new(repo);

    let created = service.create(&NoteDraft::new("one", "")).unwrap();
    assert_eq!(created.notes.len(), 1);
    assert_eq!(created.notes[0].id, created.id);

    let mut note = created.notes[0].clone();
    note.title = "renamed".to_string();
    let edited = service.edit(&note).unwrap();
    assert!(edited.found);
    assert_eq!(edited.notes[0].title, "renamed");

    assert!(service.remove(note.id).unwrap());
    assert_eq!(service.lookup(note.id).unwrap(), None);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    match SqliteNoteRepository::try_new(&mut conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_notes_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteNoteRepository::try_new(&mut conn),
        Err(RepoError::MissingRequiredTable("notes"))
    ));
}

#[test]
fn repository_rejects_notes_table_missing_important_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteNoteRepository::try_new(&mut conn),
        Err(RepoError::MissingRequiredColumn {
            table: "notes",
            column: "important"
        })
    ));
}
