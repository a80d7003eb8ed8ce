//! Tests for storage module.

use super::*;
use tempfile::TempDir;

async fn memory_db() -> Database {
    let db = Database::connect(&Locator::Memory).await.unwrap();
    db.migrate().await.unwrap();
    db
}

// ==================== Connection tests ====================

#[tokio::test]
async fn test_connect_memory() {
    let db = Database::connect(&Locator::Memory).await.unwrap();
    assert!(!db.is_persistent());
    db.close().await;
}

#[tokio::test]
async fn test_connect_file_creates_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("development.db");

    let db = Database::connect(&Locator::File(path.clone())).await.unwrap();

    assert!(db.is_persistent());
    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn test_connect_file_with_url_characters_in_path() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("site?v2#draft");
    std::fs::create_dir(&nested).unwrap();
    let path = nested.join("development.db");

    let db = Database::connect(&Locator::File(path.clone())).await.unwrap();

    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn test_memory_databases_are_independent() {
    let first = memory_db().await;
    let second = memory_db().await;

    first.create_user("alice", "hash").await.unwrap();

    assert_eq!(first.count_users().await.unwrap(), 1);
    assert_eq!(second.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let locator = Locator::File(dir.path().join("production.db"));

    {
        let db = Database::connect(&locator).await.unwrap();
        db.migrate().await.unwrap();
        db.create_user("alice", "hash").await.unwrap();
        db.close().await;
    }

    let db = Database::connect(&locator).await.unwrap();
    assert_eq!(db.migrate().await.unwrap(), 0);
    assert_eq!(db.count_users().await.unwrap(), 1);
    db.close().await;
}

// ==================== Migration tests ====================

#[tokio::test]
async fn test_migrate_applies_once() {
    let db = Database::connect(&Locator::Memory).await.unwrap();

    assert_eq!(db.migrate().await.unwrap(), MIGRATIONS.len());
    assert_eq!(db.migrate().await.unwrap(), 0);

    let applied = Migrator::new(MIGRATIONS)
        .applied_versions(db.pool())
        .await
        .unwrap();
    assert!(applied.contains(&1));
}

#[tokio::test]
async fn test_failed_migration_is_not_recorded() {
    static BROKEN: &[Migration] = &[Migration {
        version: 1,
        description: "broken",
        sql: "CREATE TABL nope",
    }];
    let db = Database::connect(&Locator::Memory).await.unwrap();

    let err = Migrator::new(BROKEN).run(db.pool()).await.unwrap_err();

    assert!(matches!(err, StorageError::Migration { version: 1, .. }));
    let applied = Migrator::new(BROKEN)
        .applied_versions(db.pool())
        .await
        .unwrap();
    assert!(applied.is_empty());
}

#[test]
fn test_migrations_are_ordered() {
    let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
    let mut sorted = versions.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(versions, sorted);
}

// ==================== User tests ====================

#[tokio::test]
async fn test_create_and_find_user() {
    let db = memory_db().await;

    let created = db.create_user("alice", "$2b$04$hash").await.unwrap();
    let by_id = db.find_user(created.id).await.unwrap().unwrap();
    let by_name = db.find_user_by_username("alice").await.unwrap().unwrap();

    assert_eq!(by_id.username, "alice");
    assert_eq!(by_id.password_hash, "$2b$04$hash");
    assert_eq!(by_id.id, by_name.id);
}

#[tokio::test]
async fn test_find_missing_user() {
    let db = memory_db().await;
    assert!(db.find_user(42).await.unwrap().is_none());
    assert!(db.find_user_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let db = memory_db().await;
    db.create_user("alice", "a").await.unwrap();

    let err = db.create_user("alice", "b").await.unwrap_err();

    assert!(matches!(err, StorageError::Database(_)));
}

#[tokio::test]
async fn test_empty_username_rejected() {
    let db = memory_db().await;
    let err = db.create_user("  ", "hash").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));
}
