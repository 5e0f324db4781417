//! Note use-case service.
//!
//! # Responsibility
//! - Bundle each list operation into one repository unit of work.
//! - Follow every content-changing write with a fresh ordered snapshot.
//!
//! # Invariants
//! - `reload` seeds at most one welcome note per empty-store observation.
//! - Snapshots are always ordered by `id DESC`.
//! - Repository failures are returned unchanged.

use crate::model::note::{Note, NoteDraft, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoResult;

/// Snapshot produced by a full reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Id of the welcome note, when this reload seeded one.
    pub seeded: Option<NoteId>,
    pub notes: Vec<Note>,
}

/// Result of inserting a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub id: NoteId,
    pub notes: Vec<Note>,
}

/// Result of rewriting a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// `false` when the id no longer existed; the write was a no-op.
    pub found: bool,
    pub notes: Vec<Note>,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Seeds the welcome note when the store is empty, then lists all notes.
    pub fn reload(&mut self) -> RepoResult<ReloadOutcome> {
        let seeded = self.repo.seed_if_empty(&NoteDraft::welcome())?;
        let notes = self.repo.get_all()?;
        Ok(ReloadOutcome { seeded, notes })
    }

    /// Inserts an already validated draft and lists all notes.
    pub fn create(&self, draft: &NoteDraft) -> RepoResult<CreateOutcome> {
        let id = self.repo.insert(draft)?;
        let notes = self.repo.get_all()?;
        Ok(CreateOutcome { id, notes })
    }

    /// Rewrites `note` and lists all notes.
    pub fn edit(&self, note: &Note) -> RepoResult<EditOutcome> {
        let found = self.repo.update(note)?;
        let notes = self.repo.get_all()?;
        Ok(EditOutcome { found, notes })
    }

    /// Deletes one note. Returns `false` when it was already gone.
    pub fn remove(&self, id: NoteId) -> RepoResult<bool> {
        self.repo.delete(id)
    }

    pub fn lookup(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get_by_id(id)
    }
}
