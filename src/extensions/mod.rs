//! Per-application utilities: database, password hashing, login
//! management and CSRF protection.
//!
//! Each is initialised once per application and then only read.

mod csrf;
mod login;
mod password;
mod signing;

pub use csrf::{CSRF_HEADER, CsrfError, CsrfProtect, DEFAULT_TIME_LIMIT, protect};
pub use login::{CurrentUser, LoginManager, REMEMBER_COOKIE_NAME, UserLoader, remember_user};
pub use password::Bcrypt;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::storage::{Database, StorageError, User};

/// Extension initialisation or use failure.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

/// The extensions owned by one application instance.
#[derive(Clone)]
pub struct Extensions {
    pub db: Database,
    pub bcrypt: Bcrypt,
    pub login_manager: LoginManager,
    pub csrf: CsrfProtect,
}

impl Extensions {
    /// Connects the database, applies migrations and builds the rest.
    pub async fn init(config: &Config) -> Result<Self, ExtensionError> {
        let db = Database::connect(&config.database).await?;
        let migrations = db.migrate().await?;

        let extensions = Self {
            db,
            bcrypt: Bcrypt::new(config.bcrypt_cost),
            login_manager: LoginManager::new(&config.secret_key),
            csrf: CsrfProtect::new(&config.secret_key, config.csrf_enabled)
                .with_time_limit(config.csrf_time_limit),
        };

        info!(
            migrations,
            persistent = extensions.db.is_persistent(),
            csrf = extensions.csrf.is_enabled(),
            bcrypt_cost = extensions.bcrypt.cost(),
            "Extensions initialized"
        );

        Ok(extensions)
    }

    /// Creates an account with a hashed password.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, ExtensionError> {
        let hash = self.bcrypt.hash(password)?;
        Ok(self.db.create_user(username, &hash).await?)
    }

    /// Returns the user when `password` matches.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, ExtensionError> {
        let Some(user) = self.db.find_user_by_username(username).await? else {
            return Ok(None);
        };

        if self.bcrypt.verify(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
