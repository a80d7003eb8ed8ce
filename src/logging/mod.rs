//! Log handler derivation and subscriber installation.
//!
//! Handlers are derived from the active [`Config`] every time the
//! application boots: a console handler always, and a daily file handler
//! when file logging is enabled. Installing them builds a fresh
//! subscriber, so records reach exactly the derived handlers once each.

mod error;
mod format;

pub use error::LoggingError;
pub use format::{LineFormat, TIMESTAMP_FORMAT, level_name};

use chrono::{Local, NaiveDate};
use std::io;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::Config;

/// Destination of a log handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Standard output.
    Console,
    /// Append-only file, one per calendar day.
    File(PathBuf),
}

/// One destination plus the minimum severity it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHandler {
    pub level: Level,
    pub sink: Sink,
}

impl LogHandler {
    pub fn console(level: Level) -> Self {
        Self {
            level,
            sink: Sink::Console,
        }
    }

    pub fn file(level: Level, path: PathBuf) -> Self {
        Self {
            level,
            sink: Sink::File(path),
        }
    }
}

/// Derives the handlers for `config`.
///
/// The log directory is created on demand when file logging is enabled.
pub fn handlers(config: &Config) -> Result<Vec<LogHandler>, LoggingError> {
    let mut handlers = vec![LogHandler::console(config.log_level)];

    if let Some(file) = file_handler(config)? {
        handlers.push(file);
    }

    Ok(handlers)
}

/// File handler for today's log, or `None` when file logging is off.
pub fn file_handler(config: &Config) -> Result<Option<LogHandler>, LoggingError> {
    if !config.log_to_file {
        return Ok(None);
    }

    let dir = config
        .paths
        .ensure_logs_dir()
        .map_err(LoggingError::Directory)?;
    let path = dir.join(log_file_name(Local::now().date_naive()));

    Ok(Some(LogHandler::file(config.log_level, path)))
}

/// `YYYY-MM-DD.log` for the given day.
pub fn log_file_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d.log").to_string()
}

/// Keeps file writers alive; dropping it flushes pending records.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _workers: Vec<WorkerGuard>,
    _scope: Option<DefaultGuard>,
}

/// Installs `handlers` as the process-wide subscriber.
///
/// `RUST_LOG`, when set, narrows what the handlers see.
pub fn install(handlers: &[LogHandler]) -> Result<LogGuard, LoggingError> {
    let (layers, workers) = build_layers(handlers)?;

    tracing_subscriber::registry()
        .with(layers)
        .with(EnvFilter::try_from_default_env().ok())
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    Ok(LogGuard {
        _workers: workers,
        _scope: None,
    })
}

/// Installs `handlers` for the current thread only, until the guard drops.
pub fn install_scoped(handlers: &[LogHandler]) -> Result<LogGuard, LoggingError> {
    let (layers, workers) = build_layers(handlers)?;
    let scope = tracing_subscriber::registry().with(layers).set_default();

    Ok(LogGuard {
        _workers: workers,
        _scope: Some(scope),
    })
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn build_layers(
    handlers: &[LogHandler],
) -> Result<(Vec<BoxedLayer>, Vec<WorkerGuard>), LoggingError> {
    let mut layers = Vec::with_capacity(handlers.len());
    let mut workers = Vec::new();

    for handler in handlers {
        let filter = LevelFilter::from_level(handler.level);
        let layer: BoxedLayer = match &handler.sink {
            Sink::Console => fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(io::stdout)
                .with_filter(filter)
                .boxed(),
            Sink::File(path) => {
                let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
                workers.push(guard);
                fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter)
                    .boxed()
            }
        };
        layers.push(layer);
    }

    Ok((layers, workers))
}

/// Opens `path` for appending without any rotation.
fn open_log_file(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("app");

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(stem);
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        builder = builder.filename_suffix(ext);
    }

    Ok(builder.build(dir)?)
}
