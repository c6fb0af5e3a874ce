//! Recording database operations
//!
//! A recording is either an audio file stored under `static/music/` or a
//! video-only YouTube link. Video-only rows have `duration = 0` and
//! placeholder `file_path` / `file_hash` values so both columns stay unique.

use super::rows::{self, recordings_with_details_sql, select_list, RECORDING_COLUMNS};
use super::{
    composers::apply_composer_update, compositions, compositions::apply_composition_update,
    non_blank, works::apply_work_update,
};
use crate::models::{
    AudioUpload, Recording, RecordingCreate, RecordingFullUpdate, RecordingPage,
    RecordingUpdate, RecordingWithDetails,
};
use crate::pagination::Page;
use crate::{ApiError, ApiResult};
use cmm_common::media::hash_file;
use cmm_common::MediaStore;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

/// Placeholder `file_path` prefix for video-only recordings
pub const YOUTUBE_PATH_PREFIX: &str = "youtube_only_";

/// Placeholder `file_hash` prefix for video-only recordings
pub const YOUTUBE_HASH_PREFIX: &str = "yt_";

/// Default page size of the recordings list
pub const DEFAULT_PAGE_SIZE: i64 = 20;

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Recording {} not found", id))
}

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT {} FROM recordings r {}",
        select_list("r", "r_", RECORDING_COLUMNS),
        filter
    )
}

pub(crate) async fn fetch_recording<'e, E>(executor: E, id: i64) -> ApiResult<Option<Recording>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = select_sql("WHERE r.id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(|r| rows::recording(&r, "r_")).transpose()?)
}

pub async fn get_recording(pool: &SqlitePool, id: i64) -> ApiResult<Recording> {
    fetch_recording(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Recording with composition, work and composer
pub async fn get_recording_details(pool: &SqlitePool, id: i64) -> ApiResult<RecordingWithDetails> {
    let sql = format!("{} WHERE r.id = ?", recordings_with_details_sql());
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(rows::recording_with_details(&row)?)
}

pub async fn list_recordings_for_composition(
    pool: &SqlitePool,
    composition_id: i64,
) -> ApiResult<Vec<Recording>> {
    let sql = select_sql("WHERE r.composition_id = ? ORDER BY r.id");
    let rows = sqlx::query(&sql)
        .bind(composition_id)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|r| rows::recording(r, "r_").map_err(ApiError::from))
        .collect()
}

/// Every recording with details, newest first
pub async fn list_all_recordings_with_details(
    pool: &SqlitePool,
) -> ApiResult<Vec<RecordingWithDetails>> {
    let sql = format!("{} ORDER BY r.id DESC", recordings_with_details_sql());
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|r| rows::recording_with_details(r).map_err(ApiError::from))
        .collect()
}

fn matches_query(recording: &RecordingWithDetails, needle: &str) -> bool {
    let contains = |field: Option<&str>| {
        field
            .map(|f| f.to_lowercase().contains(needle))
            .unwrap_or(false)
    };
    contains(recording.recording.performers.as_deref())
        || contains(Some(recording.composition.title_ru.as_str()))
}

/// Newest-first page of recordings, optionally filtered
///
/// Pages hold [`DEFAULT_PAGE_SIZE`] recordings unless `limit` is given.
/// `q` matches case-insensitively against performers and the composition's
/// display title. Matching is done here rather than with `LIKE`, which only
/// folds ASCII case in SQLite.
pub async fn list_recordings(
    pool: &SqlitePool,
    skip: Option<i64>,
    limit: Option<i64>,
    q: Option<&str>,
) -> ApiResult<RecordingPage> {
    let page = Page::from_query(skip, limit, DEFAULT_PAGE_SIZE);

    let Some(needle) = non_blank(q).map(str::to_lowercase) else {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM recordings")
            .fetch_one(pool)
            .await?
            .try_get("total")?;

        let sql = format!(
            "{} ORDER BY r.id DESC LIMIT ? OFFSET ?",
            recordings_with_details_sql()
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(pool)
            .await?;
        let recordings = rows
            .iter()
            .map(rows::recording_with_details)
            .collect::<Result<Vec<_>, _>>()?;

        return Ok(RecordingPage { total, recordings });
    };

    let matching: Vec<RecordingWithDetails> = list_all_recordings_with_details(pool)
        .await?
        .into_iter()
        .filter(|r| matches_query(r, &needle))
        .collect();

    let total = matching.len() as i64;
    let recordings = matching
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect();

    Ok(RecordingPage { total, recordings })
}

/// Add a recording to a composition
///
/// With `audio`, the file is hashed (an already-known hash is a 409
/// "Duplicate file") and moved to `static/music/<id>.<ext>`. With only a
/// YouTube URL, a video-only row is created. Neither is a 400.
pub async fn add_recording(
    pool: &SqlitePool,
    media: &MediaStore,
    composition_id: i64,
    input: RecordingCreate,
) -> ApiResult<Recording> {
    compositions::get_composition(pool, composition_id).await?;

    let performers = non_blank(input.performers.as_deref()).map(str::to_string);
    let youtube_url = non_blank(input.youtube_url.as_deref()).map(str::to_string);

    let id = match (&input.audio, &youtube_url) {
        (Some(audio), _) => {
            insert_audio_recording(
                pool,
                media,
                composition_id,
                audio,
                performers.as_deref(),
                input.recording_year,
                youtube_url.as_deref(),
            )
            .await?
        }
        (None, Some(url)) => {
            insert_youtube_recording(
                pool,
                composition_id,
                url,
                performers.as_deref(),
                input.recording_year,
            )
            .await?
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either an audio file or a YouTube URL is required".to_string(),
            ))
        }
    };

    get_recording(pool, id).await
}

async fn insert_audio_recording(
    pool: &SqlitePool,
    media: &MediaStore,
    composition_id: i64,
    audio: &AudioUpload,
    performers: Option<&str>,
    recording_year: Option<i64>,
    youtube_url: Option<&str>,
) -> ApiResult<i64> {
    if audio.duration <= 0 {
        return Err(ApiError::BadRequest(
            "Audio duration must be positive".to_string(),
        ));
    }
    if !audio.path.is_file() {
        return Err(ApiError::BadRequest(format!(
            "Audio file not found: {}",
            audio.path.display()
        )));
    }

    let file_hash = hash_file(&audio.path).await?;

    let existing = sqlx::query("SELECT id FROM recordings WHERE file_hash = ?")
        .bind(&file_hash)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Duplicate file".to_string()));
    }

    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO recordings (
            performers, recording_year, duration, youtube_url,
            file_path, file_hash, composition_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(performers)
    .bind(recording_year)
    .bind(audio.duration)
    .bind(youtube_url)
    .bind(format!("pending_{}", Uuid::new_v4()))
    .bind(&file_hash)
    .bind(composition_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    // Dropping the transaction on error rolls the row back
    let file_url = media.store_recording_file(&audio.path, id)?;

    let finished = async {
        sqlx::query("UPDATE recordings SET file_path = ? WHERE id = ?")
            .bind(&file_url)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }
    .await;

    if let Err(e) = finished {
        warn!(recording_id = id, "Rolling back stored audio file: {}", e);
        media.remove_url(&file_url);
        return Err(e.into());
    }

    info!(recording_id = id, composition_id, %file_url, "Added audio recording");
    Ok(id)
}

async fn insert_youtube_recording(
    pool: &SqlitePool,
    composition_id: i64,
    youtube_url: &str,
    performers: Option<&str>,
    recording_year: Option<i64>,
) -> ApiResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO recordings (
            performers, recording_year, duration, youtube_url,
            file_path, file_hash, composition_id
        ) VALUES (?, ?, 0, ?, ?, ?, ?)
        "#,
    )
    .bind(performers)
    .bind(recording_year)
    .bind(youtube_url)
    .bind(format!("{}{}", YOUTUBE_PATH_PREFIX, Uuid::new_v4()))
    .bind(format!("{}{}", YOUTUBE_HASH_PREFIX, Uuid::new_v4()))
    .bind(composition_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(recording_id = id, composition_id, "Added video-only recording");
    Ok(id)
}

pub(crate) async fn apply_recording_update(
    conn: &mut SqliteConnection,
    id: i64,
    update: &RecordingUpdate,
) -> ApiResult<Recording> {
    let current = fetch_recording(&mut *conn, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let duration = update.duration.unwrap_or(current.duration);
    if duration < 0 {
        return Err(ApiError::BadRequest(
            "Duration must not be negative".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE recordings
        SET performers = ?, recording_year = ?, youtube_url = ?, duration = ?
        WHERE id = ?
        "#,
    )
    .bind(update.performers.as_ref().or(current.performers.as_ref()))
    .bind(update.recording_year.or(current.recording_year))
    .bind(update.youtube_url.as_ref().or(current.youtube_url.as_ref()))
    .bind(duration)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(current)
}

pub async fn update_recording(
    pool: &SqlitePool,
    id: i64,
    update: RecordingUpdate,
) -> ApiResult<Recording> {
    let mut tx = pool.begin().await?;
    apply_recording_update(&mut tx, id, &update).await?;
    tx.commit().await?;

    info!(recording_id = id, "Updated recording");
    get_recording(pool, id).await
}

/// Update a recording together with its composition, work and composer
///
/// All four changes commit together or not at all.
pub async fn update_recording_full(
    pool: &SqlitePool,
    id: i64,
    update: RecordingFullUpdate,
) -> ApiResult<RecordingWithDetails> {
    let mut tx = pool.begin().await?;

    let recording = apply_recording_update(&mut tx, id, &update.recording).await?;

    let work_id: i64 = sqlx::query("SELECT work_id FROM compositions WHERE id = ?")
        .bind(recording.composition_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("work_id")?;
    let composer_id: i64 = sqlx::query("SELECT composer_id FROM works WHERE id = ?")
        .bind(work_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("composer_id")?;

    apply_composition_update(&mut tx, recording.composition_id, &update.composition).await?;
    apply_work_update(&mut tx, work_id, &update.work).await?;
    apply_composer_update(&mut tx, composer_id, &update.composer).await?;

    tx.commit().await?;

    info!(recording_id = id, work_id, composer_id, "Updated recording with details");
    get_recording_details(pool, id).await
}

/// Delete a recording and its audio file
pub async fn delete_recording(pool: &SqlitePool, media: &MediaStore, id: i64) -> ApiResult<()> {
    let recording = get_recording(pool, id).await?;

    sqlx::query("DELETE FROM recordings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    media.remove_url(&recording.file_path);
    info!(recording_id = id, "Deleted recording");
    Ok(())
}
