pub mod schema;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use schema::Settings;

const PORTABLE_MARKER: &str = "docpad.ini";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    pub fn load() -> Self {
        Self::with_path(settings_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = load_settings_from(path.as_path());
        Self { path, settings }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn update<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut Settings),
    {
        mutator(&mut self.settings);
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        save_settings_to(self.path.as_path(), &self.settings)
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

pub fn settings_path() -> PathBuf {
    if let Some(root) = portable_root() {
        return root.join("settings.json");
    }

    if let Some(base) = dirs::config_dir() {
        base.join("docpad").join("settings.json")
    } else {
        PathBuf::from("settings.json")
    }
}

/// Directory of the executable when a `docpad.ini` marker sits beside it.
pub fn portable_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.to_path_buf();
    if dir.join(PORTABLE_MARKER).exists() {
        Some(dir)
    } else {
        None
    }
}

/// Reads settings, falling back to defaults when the file is missing or
/// malformed.
pub fn load_settings_from(path: &Path) -> Settings {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Settings::default();
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "could not read settings, using defaults");
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&data) {
        Ok(settings) => settings.migrate(),
        Err(error) => {
            warn!(path = %path.display(), %error, "malformed settings, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let write_err = |source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let data = serde_json::to_string_pretty(&settings.clone().migrate())?;
    fs::write(path, data).map_err(write_err)?;
    Ok(())
}
