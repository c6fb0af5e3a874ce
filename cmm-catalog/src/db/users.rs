//! User accounts and favorites
//!
//! Passwords are stored as `sha256(salt || password)` in hex, with a random
//! per-user salt.

use super::recordings::fetch_recording;
use super::rows::{self, recordings_with_details_sql};
use crate::models::{RecordingWithDetails, User};
use crate::{ApiError, ApiResult};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

const SALT_BYTES: usize = 16;

/// Random salt as lowercase hex
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Salted SHA-256 of a password, 64 hex chars
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        is_admin: row.try_get("is_admin")?,
        created_at: row.try_get("created_at")?,
    })
}

fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(ApiError::BadRequest(format!("Invalid email: {}", email)));
    }
    Ok(email)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> ApiResult<User> {
    let row = sqlx::query("SELECT id, email, is_admin, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;
    Ok(user_from_row(&row)?)
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> ApiResult<Option<User>> {
    let row = sqlx::query("SELECT id, email, is_admin, created_at FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| user_from_row(&r)).transpose()?)
}

/// Register an account (400 for a bad or taken email, or an empty password)
pub async fn create_user(pool: &SqlitePool, email: &str, password: &str) -> ApiResult<User> {
    let email = normalize_email(email)?;
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }
    if get_user_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "The user with this email already exists".to_string(),
        ));
    }

    let salt = generate_salt();
    let id = sqlx::query(
        "INSERT INTO users (email, password_hash, password_salt) VALUES (?, ?, ?)",
    )
    .bind(&email)
    .bind(hash_password(password, &salt))
    .bind(&salt)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(user_id = id, "Created user");
    get_user(pool, id).await
}

/// Check credentials (401 on unknown email or wrong password)
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> ApiResult<User> {
    let row = sqlx::query(
        r#"
        SELECT id, email, is_admin, created_at, password_hash, password_salt
        FROM users WHERE email = ?
        "#,
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    let unauthorized = || ApiError::Unauthorized("Incorrect email or password".to_string());
    let row = row.ok_or_else(unauthorized)?;

    let stored: String = row.try_get("password_hash")?;
    let salt: String = row.try_get("password_salt")?;
    if hash_password(password, &salt) != stored {
        return Err(unauthorized());
    }

    Ok(user_from_row(&row)?)
}

/// Grant or revoke admin rights by email (404 for unknown users)
pub async fn set_admin(pool: &SqlitePool, email: &str, is_admin: bool) -> ApiResult<User> {
    let email = email.trim().to_lowercase();
    let result = sqlx::query("UPDATE users SET is_admin = ? WHERE email = ?")
        .bind(is_admin)
        .bind(&email)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("User {} not found", email)));
    }

    info!(%email, is_admin, "Changed admin flag");
    get_user_by_email(pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", email)))
}

/// 403 unless the user is an admin
pub fn require_admin(user: &User) -> ApiResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "The user doesn't have enough privileges".to_string(),
        ))
    }
}

async fn ensure_recording(pool: &SqlitePool, recording_id: i64) -> ApiResult<()> {
    if fetch_recording(pool, recording_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Recording {} not found",
            recording_id
        )));
    }
    Ok(())
}

/// Mark a recording as favorite (no-op if it already is)
pub async fn add_favorite(pool: &SqlitePool, user_id: i64, recording_id: i64) -> ApiResult<()> {
    ensure_recording(pool, recording_id).await?;

    sqlx::query("INSERT OR IGNORE INTO recording_favorites (user_id, recording_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(recording_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_favorite(pool: &SqlitePool, user_id: i64, recording_id: i64) -> ApiResult<()> {
    ensure_recording(pool, recording_id).await?;

    sqlx::query("DELETE FROM recording_favorites WHERE user_id = ? AND recording_id = ?")
        .bind(user_id)
        .bind(recording_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// A user's favorite recordings with details
pub async fn list_favorites(pool: &SqlitePool, user_id: i64) -> ApiResult<Vec<RecordingWithDetails>> {
    let sql = format!(
        "{} JOIN recording_favorites f ON f.recording_id = r.id WHERE f.user_id = ? ORDER BY r.id",
        recordings_with_details_sql()
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;

    rows.iter()
        .map(|r| rows::recording_with_details(r).map_err(ApiError::from))
        .collect()
}
