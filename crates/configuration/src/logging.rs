//! Process-wide logging: console output plus a single, non-rotating log file.

use crate::error::ConfigError;
use crate::settings::LoggingConfig;
use serde::Deserialize;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Timestamp layout used in the log file.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log file of the installed subscriber, once there is one.
static INSTALLED: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Minimum severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Line layout. Every layout carries timestamp, level, source file and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// The log directory is created on every call (an existing directory is not an
/// error). The subscriber itself is installed at most once per process; later
/// calls leave the existing console and file outputs untouched, so handlers are
/// never duplicated. Returns the path of the log file actually being written,
/// which after the first call is the one from the first call.
pub fn setup_logging(config: &LoggingConfig) -> Result<PathBuf, ConfigError> {
    let directory = Path::new(&config.directory);
    fs::create_dir_all(directory).map_err(|source| ConfigError::LogDirectory {
        path: directory.display().to_string(),
        source,
    })?;
    let log_path = directory.join(&config.file_name);

    let mut installed = INSTALLED.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(active) = installed.as_ref() {
        tracing::debug!(path = %active.display(), "Logging already initialised; skipping.");
        return Ok(active.clone());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let file_writer = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&config.file_name)
        .build(directory)
        .map_err(|e| ConfigError::LogFile(e.to_string()))?;
    let layers = vec![
        format_layer(
            config.format,
            std::io::stderr,
            std::io::stderr().is_terminal(),
            ChronoLocal::rfc_3339(),
        ),
        format_layer(
            config.format,
            file_writer,
            false,
            ChronoLocal::new(FILE_TIMESTAMP_FORMAT.to_string()),
        ),
    ];

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| ConfigError::Subscriber(e.to_string()))?;
    *installed = Some(log_path.clone());

    tracing::info!(
        level = config.level.as_str(),
        path = %log_path.display(),
        "Logging initialised."
    );
    Ok(log_path)
}

/// Builds one `fmt` layer writing to `writer` in the requested layout.
fn format_layer<W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
    timer: ChronoLocal,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(timer)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
