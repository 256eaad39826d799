//! `tracing` subscriber setup for the shell.
//!
//! Levels used across the crate:
//!
//! - `warn`: recovered storage corruption, missing edit targets
//! - `info`: documents created, updated, deleted
//! - `debug`: toolbar dispatch, skipped saves, settings fallbacks
//! - `trace`: individual engine commands

use std::{
    fs::OpenOptions,
    io,
    path::PathBuf,
    sync::Mutex,
};

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Where docpad's events go and how they look. The shell owns stdout, so
/// events default to stderr at `warn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Colour codes; always off when writing to a file.
    pub with_ansi: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_verbosity(0)
    }
}

impl LogConfig {
    /// `-v` count to level: none is warn, then info, debug, trace.
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            format: LogFormat::default(),
            with_ansi: true,
            log_file: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// `RUST_LOG` wins when set; otherwise only docpad's own events pass
    /// below `warn`.
    pub fn filter_directive(&self) -> String {
        format!("warn,docpad={}", self.level.as_str().to_lowercase())
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened for appending.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), config.with_ansi),
    };

    let base = fmt::layer().with_writer(writer).with_target(false).without_time();
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => base.with_ansi(ansi).boxed(),
        LogFormat::Compact => base.compact().with_ansi(ansi).boxed(),
        LogFormat::Json => base.json().boxed(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));
    tracing_subscriber::registry().with(layer).with(filter).init();
    Ok(())
}
