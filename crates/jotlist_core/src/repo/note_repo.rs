//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD for notes keyed by `id`.
//! - Own the empty-store seed bootstrap.
//!
//! # Invariants
//! - `get_all` is always ordered by `id DESC`.
//! - Ids come from `AUTOINCREMENT` and are never reused after delete.
//! - `insert` stores the draft as given; input policy belongs to callers.
//! - `update`/`delete` on a missing id change nothing and are not errors.
//! - `seed_if_empty` checks and inserts inside one IMMEDIATE transaction.

use super::schema_guard::ensure_table_ready;
use super::{RepoError, RepoResult};
use crate::model::note::{Note, NoteDraft, NoteId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT id, title, content, important FROM notes";
const NOTE_COLUMNS: &[&str] = &["id", "title", "content", "important"];

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Returns every note, newest id first.
    fn get_all(&self) -> RepoResult<Vec<Note>>;
    /// Point lookup; `None` when the id is unknown.
    fn get_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Persists a draft and returns the assigned id.
    fn insert(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Rewrites every field of the note with `note.id`.
    ///
    /// Returns `false` when no such row exists.
    fn update(&self, note: &Note) -> RepoResult<bool>;
    /// Removes the note with `id`. Returns `false` when already absent.
    fn delete(&self, id: NoteId) -> RepoResult<bool>;
    /// Number of stored notes.
    fn count(&self) -> RepoResult<u64>;
    /// Inserts `draft` only when the store is empty, atomically.
    fn seed_if_empty(&mut self, draft: &NoteDraft) -> RepoResult<Option<NoteId>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` for a foreign schema.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "notes", NOTE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn get_all(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        insert_draft(&*self.conn, draft)
    }

    fn update(&self, note: &Note) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                important = ?4
             WHERE id = ?1;",
            params![
                note.id,
                note.title.as_str(),
                note.content.as_str(),
                bool_to_int(note.important),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, id: NoteId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }

    fn seed_if_empty(&mut self, draft: &NoteDraft) -> RepoResult<Option<NoteId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: Option<i64> = tx
            .query_row("SELECT 1 FROM notes LIMIT 1;", [], |row| row.get(0))
            .optional()?;
        if existing.is_some() {
            return Ok(None);
        }

        let id = insert_draft(&tx, draft)?;
        tx.commit()?;
        debug!("event=note_seed module=repo status=ok note_id={id}");
        Ok(Some(id))
    }
}

fn insert_draft(conn: &Connection, draft: &NoteDraft) -> RepoResult<NoteId> {
    conn.execute(
        "INSERT INTO notes (title, content, important) VALUES (?1, ?2, ?3);",
        params![
            draft.title.as_str(),
            draft.content.as_str(),
            bool_to_int(draft.important),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let important = match row.get::<_, i64>("important")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid important value `{other}` in notes.important"
            )));
        }
    };

    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        important,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
