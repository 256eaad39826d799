//! Persistence of the whole document collection under a single key.
//!
//! Every mutation rewrites the full collection. Reads never fail: absent,
//! empty or malformed data is treated as an empty collection.

use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{document::Document, settings::portable_root};

pub const DEFAULT_STORAGE_KEY: &str = "docpad-saved-docs";

#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backing file could not be written or replaced.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize documents: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend refused the operation (quota, read-only media).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Minimal string key-value persistence.
pub trait KeyValueBackend {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Box<B> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

/// Process-local backend. Counts successful writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut backend = Self::new();
        backend.entries.insert(key.into(), value.into());
        backend
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The portable root when one is marked, otherwise the platform data dir.
    pub fn default_dir() -> PathBuf {
        if let Some(root) = portable_root() {
            return root;
        }

        if let Some(base) = dirs::data_dir() {
            base.join("docpad")
        } else {
            PathBuf::from("data")
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }
}

/// Ordered document collection stored as one JSON array.
#[derive(Debug)]
pub struct DocumentStore<B> {
    backend: B,
    key: String,
}

impl<B: KeyValueBackend> DocumentStore<B> {
    pub fn new(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn with_default_key(backend: B) -> Self {
        Self::new(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn load_all(&self) -> Vec<Document> {
        let raw = match self.backend.read(self.key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no saved documents yet");
                return Vec::new();
            }
            Err(error) => {
                warn!(key = %self.key, %error, "could not read saved documents, starting empty");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        let docs: Vec<Document> = match serde_json::from_str(&raw) {
            Ok(docs) => docs,
            Err(error) => {
                warn!(key = %self.key, %error, "saved documents are malformed, starting empty");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let total = docs.len();
        let unique: Vec<Document> = docs
            .into_iter()
            .filter(|doc| seen.insert(doc.id.clone()))
            .collect();
        if unique.len() != total {
            warn!(
                key = %self.key,
                dropped = total - unique.len(),
                "dropped documents with duplicate ids"
            );
        }
        unique
    }

    pub fn save_all(&mut self, docs: &[Document]) -> Result<()> {
        let data = serde_json::to_string(docs)?;
        self.backend.write(self.key.as_str(), data.as_str())?;
        debug!(key = %self.key, count = docs.len(), "saved documents");
        Ok(())
    }
}
