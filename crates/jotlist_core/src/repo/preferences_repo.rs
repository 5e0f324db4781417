//! Display preferences persistence.
//!
//! # Responsibility
//! - Store theme and font choices in the `preferences` key/value table.
//!
//! # Invariants
//! - Missing or unreadable stored values load as defaults.
//! - Invalid font names are rejected before they reach storage.

use super::schema_guard::ensure_table_ready;
use super::{RepoError, RepoResult};
use crate::model::preferences::{normalize_font_name, DisplayPreferences, Theme, DEFAULT_FONT};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

const THEME_KEY: &str = "theme";
const FONT_KEY: &str = "font";

/// SQLite-backed preferences repository.
pub struct SqlitePreferencesRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePreferencesRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "preferences", &["key", "value"])?;
        Ok(Self { conn })
    }

    /// Loads stored preferences, filling gaps with defaults.
    pub fn load(&self) -> RepoResult<DisplayPreferences> {
        let theme = match read_value(self.conn, THEME_KEY)? {
            Some(value) => Theme::parse(&value).unwrap_or_else(|| {
                warn!("event=prefs_load module=repo status=fallback key=theme");
                Theme::default()
            }),
            None => Theme::default(),
        };
        let font = match read_value(self.conn, FONT_KEY)? {
            Some(value) => normalize_font_name(&value).unwrap_or_else(|_| {
                warn!("event=prefs_load module=repo status=fallback key=font");
                DEFAULT_FONT.to_string()
            }),
            None => DEFAULT_FONT.to_string(),
        };
        Ok(DisplayPreferences { theme, font })
    }

    /// Writes both preferences in one transaction.
    pub fn save(&mut self, prefs: &DisplayPreferences) -> RepoResult<()> {
        let font = validated_font(&prefs.font)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_value(&tx, THEME_KEY, prefs.theme.as_str())?;
        write_value(&tx, FONT_KEY, &font)?;
        tx.commit()?;
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) -> RepoResult<()> {
        write_value(self.conn, THEME_KEY, theme.as_str())
    }

    pub fn set_font(&self, font: &str) -> RepoResult<()> {
        let font = validated_font(font)?;
        write_value(self.conn, FONT_KEY, &font)
    }
}

fn validated_font(font: &str) -> RepoResult<String> {
    normalize_font_name(font).map_err(|err| RepoError::InvalidPreference(err.to_string()))
}

fn read_value(conn: &Connection, key: &str) -> RepoResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM preferences WHERE key = ?1;",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![key, value],
    )?;
    Ok(())
}
