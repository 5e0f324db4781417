//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical persisted note record.
//! - Own the creation-side emptiness policy for user input.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never changes afterwards.
//! - User-created drafts never have both `title` and `content` blank.
//! - Updates carry no emptiness guard; an existing note may become empty.

use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key, monotonically increasing.
pub type NoteId = i64;

const WELCOME_TITLE: &str = "Welcome!";
const WELCOME_CONTENT: &str = "This is a sample note.\nTap + to create your own.";

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Storage-assigned identity.
    pub id: NoteId,
    /// Free-form title, may be empty.
    pub title: String,
    /// Free-form body, may be empty.
    pub content: String,
    /// Display emphasis only.
    pub important: bool,
}

impl Note {
    /// Builds a persisted record from a draft and its assigned id.
    pub fn from_draft(id: NoteId, draft: NoteDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            important: draft.important,
        }
    }

    /// Returns the insert-side view of this note without its id.
    pub fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            important: self.important,
        }
    }
}

/// Note fields before storage assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub important: bool,
}

impl NoteDraft {
    /// Creates a regular (non-important) draft as given, without trimming.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            important: false,
        }
    }

    /// Seed note created when a reload observes an empty store.
    pub fn welcome() -> Self {
        Self {
            title: WELCOME_TITLE.to_string(),
            content: WELCOME_CONTENT.to_string(),
            important: true,
        }
    }

    /// Applies the creation policy to raw user input.
    ///
    /// Surrounding whitespace is trimmed from both fields. Returns `None`
    /// when both trimmed fields are empty.
    pub fn from_user_input(title: &str, content: &str) -> Option<Self> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() && content.is_empty() {
            return None;
        }
        Some(Self::new(title, content))
    }
}
