//! Composition (movement) database operations

use super::recordings::list_recordings_for_composition;
use super::rows::{self, compositions_with_work_sql, select_list, COMPOSITION_COLUMNS};
use super::{non_blank, reorder_positions, require_text, works};
use crate::models::{
    Composition, CompositionCreate, CompositionSummary, CompositionUpdate, CompositionWithWork,
    Recording,
};
use crate::slug::{generate_unique_slug, SlugTable};
use crate::{ApiError, ApiResult};
use cmm_common::MediaStore;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Composition {} not found", id))
}

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT {} FROM compositions c {}",
        select_list("c", "c_", COMPOSITION_COLUMNS),
        filter
    )
}

pub(crate) async fn fetch_composition<'e, E>(executor: E, id: i64) -> ApiResult<Option<Composition>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = select_sql("WHERE c.id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(|r| rows::composition(&r, "c_")).transpose()?)
}

pub async fn get_composition(pool: &SqlitePool, id: i64) -> ApiResult<Composition> {
    fetch_composition(pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn resolve_composition_id(pool: &SqlitePool, key: &str) -> ApiResult<i64> {
    let row = sqlx::query("SELECT id FROM compositions WHERE slug = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    if let Some(row) = row {
        return Ok(row.try_get("id")?);
    }

    if let Ok(id) = key.parse::<i64>() {
        if fetch_composition(pool, id).await?.is_some() {
            return Ok(id);
        }
    }

    Err(ApiError::NotFound(format!("Composition '{}' not found", key)))
}

/// Composition by slug (or numeric id) with its work and composer
pub async fn get_composition_detail(pool: &SqlitePool, key: &str) -> ApiResult<CompositionWithWork> {
    let id = resolve_composition_id(pool, key).await?;
    let sql = format!("{} WHERE c.id = ?", compositions_with_work_sql());
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(rows::composition_with_work(&row)?)
}

/// Recordings of a composition given by slug (or numeric id)
pub async fn list_composition_recordings(pool: &SqlitePool, key: &str) -> ApiResult<Vec<Recording>> {
    let id = resolve_composition_id(pool, key).await?;
    list_recordings_for_composition(pool, id).await
}

/// Movements of a work in play order, with audio/video flags
pub async fn list_composition_summaries(
    pool: &SqlitePool,
    work_id: i64,
) -> ApiResult<Vec<CompositionSummary>> {
    let sql = format!(
        r#"
        SELECT {},
            EXISTS(SELECT 1 FROM recordings r
                   WHERE r.composition_id = c.id AND r.duration > 0) AS has_audio,
            EXISTS(SELECT 1 FROM recordings r
                   WHERE r.composition_id = c.id AND r.duration = 0) AS has_video
        FROM compositions c
        WHERE c.work_id = ?
        ORDER BY c.sort_order, c.id
        "#,
        select_list("c", "c_", COMPOSITION_COLUMNS)
    );
    let rows = sqlx::query(&sql).bind(work_id).fetch_all(pool).await?;

    rows.iter()
        .map(|r| -> ApiResult<CompositionSummary> {
            Ok(CompositionSummary {
                composition: rows::composition(r, "c_")?,
                has_audio: r.try_get("has_audio")?,
                has_video: r.try_get("has_video")?,
            })
        })
        .collect()
}

/// Every composition with work and composer
pub async fn list_all_compositions_with_work(
    pool: &SqlitePool,
) -> ApiResult<Vec<CompositionWithWork>> {
    let sql = format!(
        "{} ORDER BY w.name_ru, c.sort_order, c.id",
        compositions_with_work_sql()
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|r| rows::composition_with_work(r).map_err(ApiError::from))
        .collect()
}

/// Append a composition to a work (404 if the work is missing)
///
/// It takes the next `sort_order` after the work's current last movement.
pub async fn create_composition(
    pool: &SqlitePool,
    work_id: i64,
    input: CompositionCreate,
) -> ApiResult<Composition> {
    let title_ru = require_text("title_ru", &input.title_ru)?;
    let title = non_blank(input.title.as_deref()).map(str::to_string);

    let mut tx = pool.begin().await?;

    if works::fetch_work(&mut *tx, work_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Work {} not found", work_id)));
    }

    let sort_order: i64 = sqlx::query(
        "SELECT COALESCE(MAX(sort_order), 0) + 1 AS next FROM compositions WHERE work_id = ?",
    )
    .bind(work_id)
    .fetch_one(&mut *tx)
    .await?
    .try_get("next")?;

    let slug_base = title.clone().unwrap_or_else(|| title_ru.clone());
    let slug = generate_unique_slug(&mut tx, SlugTable::Compositions, &slug_base, None).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO compositions (
            slug, sort_order, tonality, is_no_catalog, title, title_ru,
            title_original, catalog_number, composition_year, notes, work_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&slug)
    .bind(sort_order)
    .bind(&input.tonality)
    .bind(input.is_no_catalog)
    .bind(&title)
    .bind(&title_ru)
    .bind(&input.title_original)
    .bind(&input.catalog_number)
    .bind(input.composition_year)
    .bind(&input.notes)
    .bind(work_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(composition_id = id, work_id, sort_order, "Created composition");
    get_composition(pool, id).await
}

pub(crate) async fn apply_composition_update(
    conn: &mut SqliteConnection,
    id: i64,
    update: &CompositionUpdate,
) -> ApiResult<()> {
    let current = fetch_composition(&mut *conn, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let title = match &update.title {
        Some(t) => non_blank(Some(t)).map(str::to_string),
        None => current.title.clone(),
    };
    let title_ru = match &update.title_ru {
        Some(t) => require_text("title_ru", t)?,
        None => current.title_ru.clone(),
    };

    let slug = if title != current.title || title_ru != current.title_ru {
        let base = title.clone().unwrap_or_else(|| title_ru.clone());
        Some(
            generate_unique_slug(conn, SlugTable::Compositions, &base, current.slug.as_deref())
                .await?,
        )
    } else {
        current.slug.clone()
    };

    sqlx::query(
        r#"
        UPDATE compositions
        SET slug = ?, sort_order = ?, tonality = ?, is_no_catalog = ?, title = ?,
            title_ru = ?, title_original = ?, catalog_number = ?,
            composition_year = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(&slug)
    .bind(update.sort_order.unwrap_or(current.sort_order))
    .bind(update.tonality.as_ref().or(current.tonality.as_ref()))
    .bind(update.is_no_catalog.unwrap_or(current.is_no_catalog))
    .bind(&title)
    .bind(&title_ru)
    .bind(update.title_original.as_ref().or(current.title_original.as_ref()))
    .bind(update.catalog_number.as_ref().or(current.catalog_number.as_ref()))
    .bind(update.composition_year.or(current.composition_year))
    .bind(update.notes.as_ref().or(current.notes.as_ref()))
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_composition(
    pool: &SqlitePool,
    id: i64,
    update: CompositionUpdate,
) -> ApiResult<Composition> {
    let mut tx = pool.begin().await?;
    apply_composition_update(&mut tx, id, &update).await?;
    tx.commit().await?;

    info!(composition_id = id, "Updated composition");
    get_composition(pool, id).await
}

pub async fn set_composition_cover(
    pool: &SqlitePool,
    media: &MediaStore,
    id: i64,
    cover_art_url: Option<&str>,
) -> ApiResult<Composition> {
    let current = get_composition(pool, id).await?;

    sqlx::query("UPDATE compositions SET cover_art_url = ? WHERE id = ?")
        .bind(cover_art_url)
        .bind(id)
        .execute(pool)
        .await?;

    if let Some(old) = current.cover_art_url.as_deref() {
        if Some(old) != cover_art_url {
            media.remove_url(old);
        }
    }

    get_composition(pool, id).await
}

/// Put a work's movements in the given order
///
/// Listed compositions get `sort_order` 1..n exactly as given; ids from
/// other works are ignored and unlisted movements follow in their previous
/// order.
pub async fn reorder_compositions(
    pool: &SqlitePool,
    work_id: i64,
    composition_ids: &[i64],
) -> ApiResult<Vec<CompositionSummary>> {
    let mut tx = pool.begin().await?;

    if works::fetch_work(&mut *tx, work_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Work {} not found", work_id)));
    }

    let current: Vec<i64> =
        sqlx::query("SELECT id FROM compositions WHERE work_id = ? ORDER BY sort_order, id")
            .bind(work_id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|r| r.try_get("id"))
            .collect::<Result<_, _>>()?;

    let ordered = reorder_positions(&current, composition_ids);
    for (index, id) in ordered.iter().enumerate() {
        sqlx::query("UPDATE compositions SET sort_order = ? WHERE id = ?")
            .bind(index as i64 + 1)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(work_id, count = ordered.len(), "Reordered compositions");
    list_composition_summaries(pool, work_id).await
}

async fn collect_media_urls(conn: &mut SqliteConnection, id: i64) -> ApiResult<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT cover_art_url AS url FROM compositions
        WHERE id = ? AND cover_art_url IS NOT NULL
        UNION ALL
        SELECT file_path FROM recordings WHERE composition_id = ?
        "#,
    )
    .bind(id)
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .iter()
        .map(|r| r.try_get("url"))
        .collect::<Result<Vec<String>, _>>()?)
}

/// Delete a composition with its recordings, then their files
pub async fn delete_composition(pool: &SqlitePool, media: &MediaStore, id: i64) -> ApiResult<()> {
    let mut tx = pool.begin().await?;

    if fetch_composition(&mut *tx, id).await?.is_none() {
        return Err(not_found(id));
    }
    let urls = collect_media_urls(&mut tx, id).await?;

    sqlx::query("DELETE FROM compositions WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let removed = media.remove_urls(&urls);
    info!(composition_id = id, files = urls.len(), removed, "Deleted composition");
    Ok(())
}
