//! Environment-driven configuration for the application.
//!
//! Each deployment environment maps to one configuration variant. Variants
//! are plain struct literals chosen by [`Environment`]; building one
//! provisions the working `tmp/` directory first.

mod environment;
mod error;
mod overrides;
mod paths;
mod secret;

pub use environment::Environment;
pub use error::ConfigError;
pub use overrides::{Overrides, ServerOverrides, parse_level};
pub use paths::{Paths, ensure_dir};
pub use secret::{KeyOrigin, SECRET_KEY_VAR, SecretKey};

use std::env::{self, VarError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Environment variable selecting the configuration variant.
pub const ENV_VAR: &str = "APP_ENV";
/// Environment used when `APP_ENV` is unset.
pub const DEFAULT_ENV: Environment = Environment::Production;
/// URL scheme understood by the storage layer.
pub const DATABASE_SCHEME: &str = "sqlite://";
/// Default HTTP listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// bcrypt cost used outside of tests.
const DEFAULT_BCRYPT_COST: u32 = 12;
/// Lowest cost bcrypt accepts; keeps test hashing fast.
const TESTING_BCRYPT_COST: u32 = 4;
/// How long an issued CSRF token is accepted.
const DEFAULT_CSRF_TIME_LIMIT: Duration = Duration::from_secs(3600);

/// Identifies the persistent store of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// SQLite database file on disk.
    File(PathBuf),
    /// Non-persistent store that disappears with its connection.
    Memory,
}

impl Locator {
    /// Connection string: scheme followed by the locator.
    ///
    /// Used for display; file stores are opened by path.
    pub fn database_url(&self) -> String {
        match self {
            Locator::File(path) => format!("{}{}", DATABASE_SCHEME, path.display()),
            Locator::Memory => format!("{}:memory:", DATABASE_SCHEME),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Locator::File(_))
    }
}

/// The active configuration variant.
#[derive(Debug, Clone)]
pub struct Config {
    pub env: Environment,
    pub secret_key: SecretKey,
    /// Verbose debug behaviour.
    pub debug: bool,
    pub testing: bool,
    /// Cross-site request forgery safeguard.
    pub csrf_enabled: bool,
    pub csrf_time_limit: Duration,
    /// Minimum severity accepted by every log handler.
    pub log_level: Level,
    /// Also persist log output to `tmp/logs/YYYY-MM-DD.log`.
    pub log_to_file: bool,
    pub database: Locator,
    pub bcrypt_cost: u32,
    pub static_folder: String,
    pub templates_folder: String,
    pub bind: String,
    pub paths: Paths,
}

impl Config {
    /// Resolve the variant named by `tag` under `working_dir`.
    ///
    /// The secret is read from `SECRET_KEY` or generated.
    pub fn resolve(tag: &str, working_dir: &Path) -> Result<Self, ConfigError> {
        let env: Environment = tag.parse()?;
        Self::for_environment(env, Paths::new(working_dir), SecretKey::from_env())
    }

    /// Resolve using `APP_ENV`, defaulting to production when it is unset.
    pub fn from_env(working_dir: &Path) -> Result<Self, ConfigError> {
        match env::var(ENV_VAR) {
            Ok(tag) => Self::resolve(&tag, working_dir),
            Err(VarError::NotPresent) => Self::for_environment(
                DEFAULT_ENV,
                Paths::new(working_dir),
                SecretKey::from_env(),
            ),
            Err(VarError::NotUnicode(raw)) => Err(ConfigError::UndefinedEnvironment(
                raw.to_string_lossy().into_owned(),
            )),
        }
    }

    /// Build the variant for `env`, provisioning the temp directory first.
    pub fn for_environment(
        env: Environment,
        paths: Paths,
        secret_key: SecretKey,
    ) -> Result<Self, ConfigError> {
        let temp_dir = paths.ensure_temp_dir().map_err(ConfigError::Provision)?;

        let config = match env {
            Environment::Production => Config {
                env,
                secret_key,
                debug: false,
                testing: false,
                csrf_enabled: true,
                csrf_time_limit: DEFAULT_CSRF_TIME_LIMIT,
                log_level: Level::WARN,
                log_to_file: true,
                database: Locator::File(temp_dir.join("production.db")),
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                static_folder: "static".to_string(),
                templates_folder: "templates".to_string(),
                bind: DEFAULT_BIND.to_string(),
                paths,
            },
            Environment::Development => Config {
                env,
                secret_key,
                debug: true,
                testing: false,
                csrf_enabled: false,
                csrf_time_limit: DEFAULT_CSRF_TIME_LIMIT,
                log_level: Level::DEBUG,
                log_to_file: false,
                database: Locator::File(temp_dir.join("development.db")),
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                static_folder: "static".to_string(),
                templates_folder: "templates".to_string(),
                bind: DEFAULT_BIND.to_string(),
                paths,
            },
            Environment::Testing => Config {
                env,
                secret_key,
                debug: true,
                testing: true,
                csrf_enabled: false,
                csrf_time_limit: DEFAULT_CSRF_TIME_LIMIT,
                log_level: Level::INFO,
                log_to_file: false,
                database: Locator::Memory,
                bcrypt_cost: TESTING_BCRYPT_COST,
                static_folder: "static".to_string(),
                templates_folder: "templates".to_string(),
                bind: DEFAULT_BIND.to_string(),
                paths,
            },
        };

        Ok(config)
    }

    /// Apply operator overrides and re-validate.
    pub fn apply(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        if let Some(level) = overrides.level()? {
            self.log_level = level;
        }
        if let Some(log_to_file) = overrides.log_to_file {
            self.log_to_file = log_to_file;
        }
        if let Some(csrf_enabled) = overrides.csrf_enabled {
            self.csrf_enabled = csrf_enabled;
        }
        if let Some(secs) = overrides.csrf_time_limit {
            self.csrf_time_limit = Duration::from_secs(secs);
        }
        if let Some(bind) = overrides.bind() {
            self.bind = bind.to_string();
        }

        self.validate()
    }

    /// Connection string of the configured store.
    pub fn database_url(&self) -> String {
        self.database.database_url()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Validation("server.bind must not be empty".into()));
        }

        if self.env == Environment::Testing && self.database.is_persistent() {
            return Err(ConfigError::Validation(
                "testing must use a non-persistent database".into(),
            ));
        }

        if self.csrf_time_limit.is_zero() {
            return Err(ConfigError::Validation("csrf_time_limit must be positive".into()));
        }

        if let Locator::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation("database path is required".into()));
            }
        }

        Ok(())
    }
}
