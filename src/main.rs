use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use docpad::{
    app::App,
    document::store::{FileBackend, KeyValueBackend, MemoryBackend},
    logging::{LogConfig, LogFormat, init_logging},
    settings::{SettingsStore, save_settings_to},
    shell,
};

#[derive(Parser)]
#[command(
    name = "docpad",
    version,
    about = "Rich-text drafting pad with locally saved documents"
)]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding saved documents.
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Keep documents in memory only.
    #[arg(long, conflicts_with = "data_dir")]
    memory: bool,

    /// Write the effective settings file and exit.
    #[arg(long = "init-config")]
    init_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose)
        .with_format(format)
        .with_ansi(cli.log_file.is_none() && io::stderr().is_terminal())
        .with_log_file(cli.log_file.clone())
}

fn run(cli: Cli) -> Result<()> {
    let store = match &cli.config {
        Some(path) => SettingsStore::with_path(path),
        None => SettingsStore::load(),
    };

    if cli.init_config {
        save_settings_to(store.path(), store.settings())
            .with_context(|| format!("writing {}", store.path().display()))?;
        println!("{}", store.path().display());
        return Ok(());
    }

    let settings = store.into_settings();
    let backend: Box<dyn KeyValueBackend> = if cli.memory {
        Box::new(MemoryBackend::new())
    } else {
        let dir = cli
            .data_dir
            .or_else(|| settings.storage.data_dir.clone())
            .unwrap_or_else(FileBackend::default_dir);
        info!(dir = %dir.display(), "using file storage");
        Box::new(FileBackend::new(dir))
    };

    let mut app = App::new(&settings, backend);
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    shell::run(&mut app, stdin.lock(), &mut stdout).context("shell i/o failed")
}
