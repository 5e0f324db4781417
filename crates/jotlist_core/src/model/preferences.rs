//! Display preferences model.
//!
//! # Responsibility
//! - Define theme and font settings chosen on the settings screen.
//! - Normalize stored values, falling back to defaults when unreadable.
//!
//! # Invariants
//! - `font` is a bare asset file name; it never contains a path separator.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Font used when nothing valid is stored.
pub const DEFAULT_FONT: &str = "roboto_variablefont.ttf";
const FONT_ASSET_DIR: &str = "fonts";

/// Color theme applied to every screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Blue,
}

impl Theme {
    /// Stable storage key for this theme.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Blue => "blue",
        }
    }

    /// Parses a stored theme, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "blue" => Some(Self::Blue),
            _ => None,
        }
    }

    /// Parses a stored theme, using `Light` for anything unknown.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

/// Rejected font name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontNameError {
    Empty,
    ContainsPathSeparator(String),
}

impl Display for FontNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "font name cannot be empty"),
            Self::ContainsPathSeparator(value) => {
                write!(f, "font name must be a bare file name, got `{value}`")
            }
        }
    }
}

impl Error for FontNameError {}

/// User-selected display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub theme: Theme,
    pub font: String,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font: DEFAULT_FONT.to_string(),
        }
    }
}

impl DisplayPreferences {
    /// Relative asset path the UI loads the font from.
    pub fn font_asset_path(&self) -> String {
        format!("{FONT_ASSET_DIR}/{}", self.font)
    }
}

/// Validates and trims a font file name.
pub fn normalize_font_name(value: &str) -> Result<String, FontNameError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FontNameError::Empty);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FontNameError::ContainsPathSeparator(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
