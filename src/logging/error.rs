//! Logging setup error types.

use thiserror::Error;

/// Errors raised while deriving or installing log handlers.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory: {0}")]
    Directory(#[source] std::io::Error),
    #[error("failed to open log file: {0}")]
    File(#[from] tracing_appender::rolling::InitError),
    #[error("a global log subscriber is already installed")]
    AlreadyInstalled,
}
