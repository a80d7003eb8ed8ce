//! Configuration error types.

use thiserror::Error;

/// Configuration resolution error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("undefined environment: {0:?} (expected production, development or testing)")]
    UndefinedEnvironment(String),
    #[error("failed to provision directory: {0}")]
    Provision(#[source] std::io::Error),
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation failed: {0}")]
    Validation(String),
}
