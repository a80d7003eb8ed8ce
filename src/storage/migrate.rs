//! Versioned schema migrations.

use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;
use tracing::{debug, info};

use super::StorageError;

/// One forward-only schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Every migration, in version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create users",
    sql: r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
    "#,
}];

/// Applies migrations not yet recorded in `_schema_migrations`.
pub struct Migrator {
    migrations: &'static [Migration],
}

impl Migrator {
    pub fn new(migrations: &'static [Migration]) -> Self {
        Self { migrations }
    }

    /// Runs pending migrations, each in its own transaction.
    pub async fn run(&self, pool: &Pool<Sqlite>) -> Result<usize, StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _schema_migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TEXT DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        let applied = self.applied_versions(pool).await?;
        let mut count = 0;

        for migration in self.migrations {
            if applied.contains(&migration.version) {
                continue;
            }

            let failed = |source: sqlx::Error| StorageError::Migration {
                version: migration.version,
                source,
            };

            let mut tx = pool.begin().await?;
            sqlx::query(migration.sql)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
            sqlx::query("INSERT INTO _schema_migrations (version, description) VALUES (?1, ?2)")
                .bind(migration.version)
                .bind(migration.description)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
            tx.commit().await.map_err(failed)?;

            debug!(
                version = migration.version,
                description = migration.description,
                "Migration applied"
            );
            count += 1;
        }

        if count > 0 {
            info!(applied = count, "Database schema upgraded");
        }

        Ok(count)
    }

    /// Versions already recorded as applied.
    pub async fn applied_versions(&self, pool: &Pool<Sqlite>) -> Result<HashSet<i64>, StorageError> {
        let rows = sqlx::query("SELECT version FROM _schema_migrations")
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("version").map_err(StorageError::from))
            .collect()
    }
}
