//! Change notifications emitted by `NoteList`.

use crate::coordinator::Ticket;
use crate::model::note::{Note, NoteId};
use crate::repo::RepoError;
use std::fmt::{Display, Formatter};

/// One mutation of the in-memory view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange {
    /// The whole sequence was replaced.
    Reset,
    /// `note` was taken out at `index` ahead of its durable delete.
    Removed { index: usize, note: Note },
    /// A failed delete put `note` back at `index`.
    Restored { index: usize, note: Note },
}

/// Operation kinds dispatched by the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Reload,
    Create,
    Edit(NoteId),
    Remove(NoteId),
    Lookup(NoteId),
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reload => write!(f, "reload"),
            Self::Create => write!(f, "create"),
            Self::Edit(id) => write!(f, "edit({id})"),
            Self::Remove(id) => write!(f, "remove({id})"),
            Self::Lookup(id) => write!(f, "lookup({id})"),
        }
    }
}

/// Storage failure reported back for one dispatched operation.
#[derive(Debug)]
pub struct OperationFailure {
    pub ticket: Ticket,
    pub operation: Operation,
    pub error: RepoError,
}

/// Receives view changes on the thread that owns the `NoteList`.
pub trait ListObserver {
    /// Called after every view mutation with the updated sequence.
    fn on_change(&mut self, change: &ListChange, notes: &[Note]);

    /// Called when a dispatched operation failed in storage.
    fn on_failure(&mut self, _failure: &OperationFailure) {}

    /// Called when a point lookup finished; `None` means no such note.
    fn on_note_loaded(&mut self, _id: NoteId, _note: Option<&Note>) {}
}
