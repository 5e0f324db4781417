//! Domain model for the note list and its display settings.
//!
//! # Responsibility
//! - Define the persisted note record and its insert-side draft.
//! - Define user-selectable display preferences.
//!
//! # Invariants
//! - Every persisted note is identified by a store-assigned `NoteId`.
//! - Deletion removes the row; ids are never handed out twice.

pub mod note;
pub mod preferences;
