use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::{
    document::{
        store::DEFAULT_STORAGE_KEY,
        title::{DEFAULT_MAX_TITLE_CHARS, DEFAULT_UNTITLED_LABEL},
    },
    ui::color_picker::{Palette, default_palette},
};

pub const SETTINGS_SCHEMA_VERSION: u32 = 2;

pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

pub const WELCOME_CONTENT: &str = r#"
      <h1>Welcome to the editor!</h1>
      <p>Enjoy a <strong>simple</strong> and <em>clean</em> writing experience.</p>
      <h2>Features</h2>
      <ul>
        <li><strong>Rich text</strong> with bold, italic and strikethrough</li>
        <li><strong>Heading levels</strong> h1/h2/h3</li>
        <li><strong>Coloured text</strong> from a small palette</li>
        <li><strong>Lists</strong>, bulleted &amp; numbered</li>
      </ul>
    "#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub schema_version: u32,
    pub storage: StorageSettings,
    pub editor: EditorSettings,
    pub toolbar: ToolbarSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SETTINGS_SCHEMA_VERSION,
            storage: StorageSettings::default(),
            editor: EditorSettings::default(),
            toolbar: ToolbarSettings::default(),
        }
    }
}

impl Settings {
    /// Brings an older file up to the current schema and replaces values the
    /// rest of the app cannot work with.
    pub fn migrate(mut self) -> Self {
        if self.schema_version > SETTINGS_SCHEMA_VERSION {
            return self;
        }

        // Version 1 allowed a zero title length to mean "no limit".
        if self.schema_version < 2 && self.editor.max_title_chars == 0 {
            self.editor.max_title_chars = DEFAULT_MAX_TITLE_CHARS;
        }

        self.storage.key = self.storage.key.trim().to_string();
        if self.storage.key.is_empty() {
            self.storage.key = DEFAULT_STORAGE_KEY.to_string();
        }

        self.editor.max_title_chars = self.editor.max_title_chars.clamp(1, DEFAULT_MAX_TITLE_CHARS);
        if self.editor.untitled_label.trim().is_empty() {
            self.editor.untitled_label = DEFAULT_UNTITLED_LABEL.to_string();
        }
        if !is_valid_date_format(self.editor.date_format.as_str()) {
            self.editor.date_format = DEFAULT_DATE_FORMAT.to_string();
        }

        self.schema_version = SETTINGS_SCHEMA_VERSION;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    /// Key the whole document collection is stored under.
    pub key: String,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditorSettings {
    pub initial_content: String,
    pub untitled_label: String,
    pub max_title_chars: usize,
    pub date_format: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            initial_content: WELCOME_CONTENT.to_string(),
            untitled_label: DEFAULT_UNTITLED_LABEL.to_string(),
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolbarSettings {
    pub palette: Palette,
}

impl Default for ToolbarSettings {
    fn default() -> Self {
        Self {
            palette: default_palette(),
        }
    }
}

fn is_valid_date_format(format: &str) -> bool {
    !format.trim().is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
