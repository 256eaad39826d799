use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod color_picker;
pub mod preview;
pub mod saved_list;
pub mod toast;
pub mod toolbar;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex colour pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid colour '{0}', expected #rgb or #rrggbb")]
pub struct InvalidColor(pub String);

/// Text colour as a CSS hex literal, normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> Result<Self, InvalidColor> {
        let trimmed = value.trim();
        if HEX_COLOR.is_match(trimmed) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(InvalidColor(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn black() -> Self {
        Self("#000000".to_string())
    }

    pub fn red() -> Self {
        Self("#ef4444".to_string())
    }

    pub fn blue() -> Self {
        Self("#3b82f6".to_string())
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
