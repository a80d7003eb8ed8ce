//! Optional YAML overrides applied on top of an environment's defaults.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::Level;

use super::ConfigError;

/// Values an operator may override without changing environment.
///
/// The database locator is deliberately absent: it always follows the
/// environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    pub debug: Option<bool>,
    /// Logging verbosity: "trace", "debug", "info", "warn", "error".
    pub log_level: Option<String>,
    pub log_to_file: Option<bool>,
    pub csrf_enabled: Option<bool>,
    /// Seconds an issued CSRF token stays valid.
    pub csrf_time_limit: Option<u64>,
    pub server: Option<ServerOverrides>,
}

/// HTTP server overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerOverrides {
    /// Socket address to listen on, e.g. "0.0.0.0:8080".
    pub bind: Option<String>,
}

impl Overrides {
    /// Load overrides from a YAML file at the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parsed `log_level`, if set.
    pub fn level(&self) -> Result<Option<Level>, ConfigError> {
        self.log_level
            .as_deref()
            .map(|s| {
                parse_level(s)
                    .ok_or_else(|| ConfigError::Validation(format!("unknown log_level: {}", s)))
            })
            .transpose()
    }

    pub fn bind(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.bind.as_deref())
    }
}

/// Maps a level name to a tracing level. Accepts "warning" as an alias.
pub fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
