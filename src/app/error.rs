//! Application bootstrap error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::extensions::ExtensionError;
use crate::logging::LoggingError;

/// Any failure that aborts startup.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("extension error: {0}")]
    Extension(#[from] ExtensionError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
