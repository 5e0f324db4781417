//! Note database bootstrap.
//!
//! # Responsibility
//! - Open note database files and in-memory stores.
//! - Bring every connection to the latest schema before it is handed out.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - No note or preference row is read or written on an unmigrated
//!   connection.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The note file could not be opened or created.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    Sqlite(rusqlite::Error),
    /// The file was stamped by a newer jotlist build.
    SchemaTooNew { found: u32, supported: u32 },
    /// SQLite refused write-ahead logging for a note file.
    WalRefused { journal_mode: String },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open note database `{}`: {source}", path.display())
            }
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "note database uses schema {found}; this build reads up to {supported}"
            ),
            Self::WalRefused { journal_mode } => {
                write!(f, "note database stayed in `{journal_mode}` journal mode instead of wal")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::WalRefused { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
