pub mod id;
pub mod store;
pub mod title;

use std::fmt;

use chrono::{
    DateTime, Utc,
    format::{Item, StrftimeItems},
};
use serde::{Deserialize, Serialize};

pub use id::IdGenerator;
pub use store::{DocumentStore, FileBackend, KeyValueBackend, MemoryBackend, StorageError};
pub use title::{TitleDeriver, derive_title};

pub const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque document identity. Freshly generated ids are millisecond
/// timestamps, but any string read back from storage is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Numeric value for ids produced by [`IdGenerator`].
    pub fn as_millis(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0.as_str())
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Serialized engine markup, opaque to everything but the engine.
    pub content: String,
    pub last_modified: DateTime<Utc>,
}

impl Document {
    pub fn display_date(&self, format: &str) -> String {
        format_timestamp(&self.last_modified, format)
    }
}

/// Formats `timestamp` with a strftime pattern, falling back to ISO dates
/// when the pattern is invalid.
pub fn format_timestamp(timestamp: &DateTime<Utc>, format: &str) -> String {
    let valid = !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    let pattern = if valid { format } else { FALLBACK_DATE_FORMAT };
    timestamp.format(pattern).to_string()
}
