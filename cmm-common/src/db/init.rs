//! Database initialization
//!
//! Opens (or creates) the catalog database and creates every table
//! idempotently. Every parent/child relation uses `ON DELETE CASCADE`, so a
//! single `DELETE` on a composer removes its works, compositions,
//! recordings, scores, playlist memberships and favorites.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign_keys is a per-connection pragma, so it goes on the connect
    // options rather than a one-off PRAGMA against the pool
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to a single connection that is never recycled, since every
/// SQLite in-memory connection would otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Create every catalog table (idempotent)
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    // Music hierarchy
    create_composers_table(pool).await?;
    create_works_table(pool).await?;
    create_compositions_table(pool).await?;
    create_recordings_table(pool).await?;

    // Accounts and user collections
    create_users_table(pool).await?;
    create_playlists_table(pool).await?;
    create_playlist_recording_table(pool).await?;
    create_recording_favorites_table(pool).await?;

    // Catalog extras
    create_scores_table(pool).await?;
    create_genres_table(pool).await?;

    // Blog and feedback
    create_posts_table(pool).await?;
    create_tags_table(pool).await?;
    create_post_tags_table(pool).await?;
    create_feedback_messages_table(pool).await?;

    Ok(())
}

/// Create the composers table
pub async fn create_composers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS composers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            name TEXT UNIQUE,
            name_ru TEXT NOT NULL,
            original_name TEXT,
            year_born INTEGER,
            year_died INTEGER,
            portrait_url TEXT,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_composers_name_ru ON composers(name_ru)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the works table
pub async fn create_works_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS works (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            name TEXT,
            name_ru TEXT NOT NULL,
            original_name TEXT,
            tonality TEXT,
            genre TEXT,
            nickname TEXT,
            is_no_catalog INTEGER NOT NULL DEFAULT 0,
            catalog_number TEXT,
            publication_year INTEGER,
            publication_year_end INTEGER,
            notes TEXT,
            cover_art_url TEXT,
            composer_id INTEGER NOT NULL REFERENCES composers(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_works_composer ON works(composer_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_works_genre ON works(genre)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the compositions table (movements / parts of a work)
pub async fn create_compositions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS compositions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            tonality TEXT,
            is_no_catalog INTEGER NOT NULL DEFAULT 0,
            title TEXT,
            title_ru TEXT NOT NULL,
            title_original TEXT,
            catalog_number TEXT,
            composition_year INTEGER,
            notes TEXT,
            cover_art_url TEXT,
            work_id INTEGER NOT NULL REFERENCES works(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_compositions_work ON compositions(work_id, sort_order)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the recordings table
///
/// `duration` is in whole seconds; 0 marks a video-only (YouTube) entry.
pub async fn create_recordings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recordings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            performers TEXT,
            recording_year INTEGER,
            duration INTEGER NOT NULL DEFAULT 0,
            youtube_url TEXT,
            file_path TEXT NOT NULL UNIQUE,
            file_hash TEXT UNIQUE,
            composition_id INTEGER NOT NULL REFERENCES compositions(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (duration >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recordings_composition ON recordings(composition_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the users table
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the playlists table
pub async fn create_playlists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_playlists_owner ON playlists(owner_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the ordered playlist membership table
pub async fn create_playlist_recording_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_recording (
            playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
            recording_id INTEGER NOT NULL REFERENCES recordings(id) ON DELETE CASCADE,
            recording_order INTEGER NOT NULL,
            PRIMARY KEY (playlist_id, recording_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the favorites link table
pub async fn create_recording_favorites_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recording_favorites (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            recording_id INTEGER NOT NULL REFERENCES recordings(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, recording_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the scores table (sheet music links)
pub async fn create_scores_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            score_type TEXT NOT NULL,
            editor TEXT,
            license TEXT,
            source_text TEXT NOT NULL,
            url TEXT NOT NULL,
            work_id INTEGER REFERENCES works(id) ON DELETE CASCADE,
            composition_id INTEGER REFERENCES compositions(id) ON DELETE CASCADE,
            CHECK (work_id IS NOT NULL OR composition_id IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the genres table
pub async fn create_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the blog posts table
pub async fn create_posts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            summary TEXT,
            meta_description TEXT,
            meta_keywords TEXT,
            cover_image_url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_post_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_tags (
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (post_id, tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the feedback messages table
///
/// Messages outlive their author: deleting a user only clears `user_id`.
pub async fn create_feedback_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            is_read INTEGER NOT NULL DEFAULT 0,
            user_id INTEGER REFERENCES users(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
