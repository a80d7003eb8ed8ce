//! SQLite-backed persistence handed to the application at startup.

mod migrate;
mod users;

pub use migrate::{MIGRATIONS, Migration, Migrator};
pub use users::User;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::Locator;

/// Pool size for on-disk databases.
const MAX_FILE_CONNECTIONS: u32 = 5;

/// Database handle shared by request handlers.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    persistent: bool,
}

impl Database {
    /// Opens the store named by `locator`.
    ///
    /// Files are created when missing. Each call with [`Locator::Memory`]
    /// yields a fresh store that shares nothing with earlier ones.
    pub async fn connect(locator: &Locator) -> Result<Self, StorageError> {
        let pool = match locator {
            // By path, so characters that mean something in a URL stay literal.
            Locator::File(path) => {
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal);
                SqlitePoolOptions::new()
                    .max_connections(MAX_FILE_CONNECTIONS)
                    .connect_with(options)
                    .await?
            }
            // The store lives only as long as a connection does, so pin one.
            Locator::Memory => {
                let options = SqliteConnectOptions::from_str(&locator.database_url())?;
                SqlitePoolOptions::new()
                    .min_connections(1)
                    .max_connections(1)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>)
                    .connect_with(options)
                    .await?
            }
        };

        info!(url = %locator.database_url(), "Database connected");

        Ok(Self {
            pool,
            persistent: locator.is_persistent(),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Applies pending schema migrations, returning how many ran.
    pub async fn migrate(&self) -> Result<usize, StorageError> {
        Migrator::new(MIGRATIONS).run(&self.pool).await
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// StorageError represents errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests;
