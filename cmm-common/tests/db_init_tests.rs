//! Tests for database initialization
//!
//! Covers automatic database creation, idempotent re-opening, and the
//! cascade behaviour the catalog relies on.

use cmm_common::db::init::{init_database, init_memory_database};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("cmm.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cmm.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO composers (name_ru) VALUES ('Бах')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    // Second open must keep existing rows
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM composers")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_all_tables_created() {
    let pool = init_memory_database().await.unwrap();
    let tables = table_names(&pool).await;

    for expected in [
        "composers",
        "compositions",
        "feedback_messages",
        "genres",
        "playlist_recording",
        "playlists",
        "post_tags",
        "posts",
        "recording_favorites",
        "recordings",
        "scores",
        "tags",
        "users",
        "works",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "Should have table: {}",
            expected
        );
    }
}

#[tokio::test]
async fn test_foreign_keys_cascade_composer_delete() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO composers (id, name_ru) VALUES (1, 'Бах')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO works (id, name_ru, composer_id) VALUES (1, 'Месса си минор', 1)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO compositions (id, title_ru, work_id) VALUES (1, 'Kyrie', 1)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO recordings (id, duration, file_path, composition_id) VALUES (1, 300, '/static/music/1.mp3', 1)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO scores (score_type, source_text, url, work_id) VALUES ('full_score', 'IMSLP', 'https://imslp.org/x', 1)",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("DELETE FROM composers WHERE id = 1")
        .execute(&pool)
        .await
        .unwrap();

    for table in ["works", "compositions", "recordings", "scores"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{} should be emptied by cascade", table);
    }
}

#[tokio::test]
async fn test_score_requires_target() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query(
        "INSERT INTO scores (score_type, source_text, url) VALUES ('part', 'IMSLP', 'https://imslp.org/y')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Score without work or composition must be rejected");
}
