//! Core of the jotlist note app: durable note store, off-thread access and
//! the observable note list the UI renders.
//! This crate owns every invariant about note identity and ordering.

pub mod coordinator;
pub mod db;
pub mod list;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use coordinator::{AccessCoordinator, Completion, CoordinatorConfig, CoordinatorError, Ticket};
pub use list::{ListChange, ListObserver, NoteList, Operation, OperationFailure, SyncError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteDraft, NoteId};
pub use model::preferences::{DisplayPreferences, FontNameError, Theme, DEFAULT_FONT};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::preferences_repo::SqlitePreferencesRepository;
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{CreateOutcome, EditOutcome, NoteService, ReloadOutcome};

/// Default database file name inside the app data directory.
pub const DB_FILE_NAME: &str = "jotlist.sqlite3";

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
