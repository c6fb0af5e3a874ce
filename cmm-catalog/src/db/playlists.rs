//! Playlists
//!
//! Membership rows carry an explicit `recording_order`; detail views sort
//! by it. Every operation takes the acting user's id and fails with 403 on
//! someone else's playlist.

use super::recordings::fetch_recording;
use super::rows::{self, recordings_with_details_sql};
use super::{reorder_positions, require_text};
use crate::models::{Playlist, PlaylistDetail};
use crate::pagination::Page;
use crate::{ApiError, ApiResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

fn playlist_from_row(row: &SqliteRow) -> sqlx::Result<Playlist> {
    Ok(Playlist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        owner_id: row.try_get("owner_id")?,
    })
}

pub async fn create_playlist(pool: &SqlitePool, owner_id: i64, name: &str) -> ApiResult<Playlist> {
    let name = require_text("name", name)?;

    let id = sqlx::query("INSERT INTO playlists (name, owner_id) VALUES (?, ?)")
        .bind(&name)
        .bind(owner_id)
        .execute(pool)
        .await?
        .last_insert_rowid();

    info!(playlist_id = id, owner_id, "Created playlist");
    Ok(Playlist { id, name, owner_id })
}

/// Playlists owned by a user
pub async fn list_playlists(pool: &SqlitePool, owner_id: i64, page: Page) -> ApiResult<Vec<Playlist>> {
    let rows = sqlx::query(
        "SELECT id, name, owner_id FROM playlists WHERE owner_id = ? ORDER BY id LIMIT ? OFFSET ?",
    )
    .bind(owner_id)
    .bind(page.limit)
    .bind(page.skip)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| playlist_from_row(r).map_err(ApiError::from))
        .collect()
}

/// Playlist owned by `user_id` (404 if missing, 403 if someone else's)
pub async fn get_owned_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
) -> ApiResult<Playlist> {
    let row = sqlx::query("SELECT id, name, owner_id FROM playlists WHERE id = ?")
        .bind(playlist_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Playlist {} not found", playlist_id)))?;

    let playlist = playlist_from_row(&row)?;
    if playlist.owner_id != user_id {
        return Err(ApiError::Forbidden("Not enough permissions".to_string()));
    }
    Ok(playlist)
}

async fn load_detail(pool: &SqlitePool, playlist: Playlist) -> ApiResult<PlaylistDetail> {
    let sql = format!(
        "{} JOIN playlist_recording pr ON pr.recording_id = r.id \
         WHERE pr.playlist_id = ? ORDER BY pr.recording_order, r.id",
        recordings_with_details_sql()
    );
    let rows = sqlx::query(&sql).bind(playlist.id).fetch_all(pool).await?;
    let recordings = rows
        .iter()
        .map(rows::recording_with_details)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PlaylistDetail {
        playlist,
        recordings,
    })
}

/// Playlist with its recordings in playlist order
pub async fn get_playlist_detail(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
) -> ApiResult<PlaylistDetail> {
    let playlist = get_owned_playlist(pool, playlist_id, user_id).await?;
    load_detail(pool, playlist).await
}

pub async fn rename_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
    name: &str,
) -> ApiResult<Playlist> {
    let mut playlist = get_owned_playlist(pool, playlist_id, user_id).await?;
    let name = require_text("name", name)?;

    sqlx::query("UPDATE playlists SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(playlist_id)
        .execute(pool)
        .await?;

    playlist.name = name;
    Ok(playlist)
}

pub async fn delete_playlist(pool: &SqlitePool, playlist_id: i64, user_id: i64) -> ApiResult<()> {
    get_owned_playlist(pool, playlist_id, user_id).await?;

    sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(playlist_id)
        .execute(pool)
        .await?;

    info!(playlist_id, "Deleted playlist");
    Ok(())
}

/// Append a recording at the end; a recording already present stays put
pub async fn add_recording_to_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
    recording_id: i64,
) -> ApiResult<PlaylistDetail> {
    let playlist = get_owned_playlist(pool, playlist_id, user_id).await?;
    if fetch_recording(pool, recording_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Recording {} not found",
            recording_id
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO playlist_recording (playlist_id, recording_id, recording_order)
        SELECT ?, ?, COALESCE(MAX(recording_order), 0) + 1
        FROM playlist_recording WHERE playlist_id = ?
        "#,
    )
    .bind(playlist_id)
    .bind(recording_id)
    .bind(playlist_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(playlist_id, recording_id, "Added recording to playlist");
    }
    load_detail(pool, playlist).await
}

pub async fn remove_recording_from_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
    recording_id: i64,
) -> ApiResult<PlaylistDetail> {
    remove_recordings_from_playlist(pool, playlist_id, user_id, &[recording_id]).await
}

/// Remove several recordings at once; ids not in the playlist are ignored
pub async fn remove_recordings_from_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
    recording_ids: &[i64],
) -> ApiResult<PlaylistDetail> {
    let playlist = get_owned_playlist(pool, playlist_id, user_id).await?;

    let mut tx = pool.begin().await?;
    let mut removed = 0;
    for recording_id in recording_ids {
        removed += sqlx::query(
            "DELETE FROM playlist_recording WHERE playlist_id = ? AND recording_id = ?",
        )
        .bind(playlist_id)
        .bind(recording_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }
    tx.commit().await?;

    info!(playlist_id, removed, "Removed recordings from playlist");
    load_detail(pool, playlist).await
}

/// Persist a new playlist order
///
/// Listed members get positions 1..n in exactly the given sequence. Ids
/// that are not members are ignored; members left out keep their relative
/// order after the listed ones.
pub async fn reorder_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    user_id: i64,
    recording_ids: &[i64],
) -> ApiResult<PlaylistDetail> {
    let playlist = get_owned_playlist(pool, playlist_id, user_id).await?;

    let mut tx = pool.begin().await?;

    let current: Vec<i64> = sqlx::query(
        "SELECT recording_id FROM playlist_recording WHERE playlist_id = ? \
         ORDER BY recording_order, recording_id",
    )
    .bind(playlist_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|r| r.try_get("recording_id"))
    .collect::<Result<_, _>>()?;

    let ordered = reorder_positions(&current, recording_ids);
    for (index, recording_id) in ordered.iter().enumerate() {
        sqlx::query(
            "UPDATE playlist_recording SET recording_order = ? \
             WHERE playlist_id = ? AND recording_id = ?",
        )
        .bind(index as i64 + 1)
        .bind(playlist_id)
        .bind(recording_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(playlist_id, count = ordered.len(), "Reordered playlist");
    load_detail(pool, playlist).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::create_user;

    #[tokio::test]
    async fn test_owner_checks() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        let alice = create_user(&pool, "alice@example.com", "pw").await.unwrap();
        let bob = create_user(&pool, "bob@example.com", "pw").await.unwrap();

        let playlist = create_playlist(&pool, alice.id, "Утро").await.unwrap();

        assert!(get_owned_playlist(&pool, playlist.id, alice.id).await.is_ok());
        assert!(matches!(
            get_owned_playlist(&pool, playlist.id, bob.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            get_owned_playlist(&pool, 999, alice.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            delete_playlist(&pool, playlist.id, bob.id).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_rejects_blank() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        let user = create_user(&pool, "u@example.com", "pw").await.unwrap();
        let playlist = create_playlist(&pool, user.id, "Old").await.unwrap();

        assert!(matches!(
            rename_playlist(&pool, playlist.id, user.id, "  ").await,
            Err(ApiError::BadRequest(_))
        ));
        let renamed = rename_playlist(&pool, playlist.id, user.id, "New")
            .await
            .unwrap();
        assert_eq!(renamed.name, "New");

        let listed = list_playlists(&pool, user.id, Page::default()).await.unwrap();
        assert_eq!(listed, vec![renamed]);
    }

    #[tokio::test]
    async fn test_add_unknown_recording() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        let user = create_user(&pool, "u@example.com", "pw").await.unwrap();
        let playlist = create_playlist(&pool, user.id, "P").await.unwrap();

        assert!(matches!(
            add_recording_to_playlist(&pool, playlist.id, user.id, 5).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
