//! Composer database operations

use super::rows::{self, select_list, COMPOSER_COLUMNS};
use super::{non_blank, require_text};
use crate::models::{Composer, ComposerCreate, ComposerUpdate};
use crate::pagination::Page;
use crate::slug::{generate_unique_slug, SlugTable};
use crate::{ApiError, ApiResult};
use cmm_common::MediaStore;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Composer {} not found", id))
}

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT {} FROM composers m {}",
        select_list("m", "m_", COMPOSER_COLUMNS),
        filter
    )
}

/// Load a composer by id
pub(crate) async fn fetch_composer<'e, E>(executor: E, id: i64) -> ApiResult<Option<Composer>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = select_sql("WHERE m.id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(|r| rows::composer(&r, "m_")).transpose()?)
}

/// Get composer by id (404 if missing)
pub async fn get_composer(pool: &SqlitePool, id: i64) -> ApiResult<Composer> {
    fetch_composer(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Get composer by slug, falling back to a numeric id
pub async fn get_composer_by_slug_or_id(pool: &SqlitePool, key: &str) -> ApiResult<Composer> {
    let sql = select_sql("WHERE m.slug = ?");
    if let Some(row) = sqlx::query(&sql).bind(key).fetch_optional(pool).await? {
        return Ok(rows::composer(&row, "m_")?);
    }

    if let Ok(id) = key.parse::<i64>() {
        if let Some(composer) = fetch_composer(pool, id).await? {
            return Ok(composer);
        }
    }

    Err(ApiError::NotFound(format!("Composer '{}' not found", key)))
}

/// One page of composers ordered by display name
pub async fn list_composers(pool: &SqlitePool, page: Page) -> ApiResult<Vec<Composer>> {
    let sql = select_sql("ORDER BY m.name_ru, m.id LIMIT ? OFFSET ?");
    let rows = sqlx::query(&sql)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|r| rows::composer(r, "m_").map_err(ApiError::from))
        .collect()
}

/// Every composer, ordered by display name
pub async fn list_all_composers(pool: &SqlitePool) -> ApiResult<Vec<Composer>> {
    let sql = select_sql("ORDER BY m.name_ru, m.id");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|r| rows::composer(r, "m_").map_err(ApiError::from))
        .collect()
}

/// Create a composer
///
/// The slug comes from the Latin `name` when given, else from `name_ru`.
pub async fn create_composer(pool: &SqlitePool, input: ComposerCreate) -> ApiResult<Composer> {
    let name_ru = require_text("name_ru", &input.name_ru)?;
    let name = non_blank(input.name.as_deref()).map(str::to_string);

    let mut tx = pool.begin().await?;

    let slug_base = name.clone().unwrap_or_else(|| name_ru.clone());
    let slug = generate_unique_slug(&mut tx, SlugTable::Composers, &slug_base, None).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO composers (slug, name, name_ru, original_name, year_born, year_died, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&slug)
    .bind(&name)
    .bind(&name_ru)
    .bind(&input.original_name)
    .bind(input.year_born)
    .bind(input.year_died)
    .bind(&input.notes)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(composer_id = id, %slug, "Created composer");
    get_composer(pool, id).await
}

/// Apply a partial update inside an open transaction
pub(crate) async fn apply_composer_update(
    conn: &mut SqliteConnection,
    id: i64,
    update: &ComposerUpdate,
) -> ApiResult<()> {
    let current = fetch_composer(&mut *conn, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let name = match &update.name {
        Some(n) => non_blank(Some(n)).map(str::to_string),
        None => current.name.clone(),
    };
    let name_ru = match &update.name_ru {
        Some(n) => require_text("name_ru", n)?,
        None => current.name_ru.clone(),
    };

    let slug = if name != current.name || name_ru != current.name_ru {
        let base = name.clone().unwrap_or_else(|| name_ru.clone());
        Some(generate_unique_slug(conn, SlugTable::Composers, &base, current.slug.as_deref()).await?)
    } else {
        current.slug.clone()
    };

    sqlx::query(
        r#"
        UPDATE composers
        SET slug = ?, name = ?, name_ru = ?, original_name = ?,
            year_born = ?, year_died = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(&slug)
    .bind(&name)
    .bind(&name_ru)
    .bind(update.original_name.as_ref().or(current.original_name.as_ref()))
    .bind(update.year_born.or(current.year_born))
    .bind(update.year_died.or(current.year_died))
    .bind(update.notes.as_ref().or(current.notes.as_ref()))
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Update a composer; the slug follows a changed name
pub async fn update_composer(
    pool: &SqlitePool,
    id: i64,
    update: ComposerUpdate,
) -> ApiResult<Composer> {
    let mut tx = pool.begin().await?;
    apply_composer_update(&mut tx, id, &update).await?;
    tx.commit().await?;

    info!(composer_id = id, "Updated composer");
    get_composer(pool, id).await
}

/// Replace the portrait URL, removing the previous image file
pub async fn set_composer_portrait(
    pool: &SqlitePool,
    media: &MediaStore,
    id: i64,
    portrait_url: Option<&str>,
) -> ApiResult<Composer> {
    let current = get_composer(pool, id).await?;

    sqlx::query("UPDATE composers SET portrait_url = ? WHERE id = ?")
        .bind(portrait_url)
        .bind(id)
        .execute(pool)
        .await?;

    if let Some(old) = current.portrait_url.as_deref() {
        if Some(old) != portrait_url {
            media.remove_url(old);
        }
    }

    get_composer(pool, id).await
}

/// Media files owned by a composer and everything below it
async fn collect_media_urls(conn: &mut SqliteConnection, id: i64) -> ApiResult<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT portrait_url AS url FROM composers
        WHERE id = ? AND portrait_url IS NOT NULL
        UNION ALL
        SELECT cover_art_url FROM works
        WHERE composer_id = ? AND cover_art_url IS NOT NULL
        UNION ALL
        SELECT c.cover_art_url FROM compositions c
        JOIN works w ON w.id = c.work_id
        WHERE w.composer_id = ? AND c.cover_art_url IS NOT NULL
        UNION ALL
        SELECT r.file_path FROM recordings r
        JOIN compositions c ON c.id = r.composition_id
        JOIN works w ON w.id = c.work_id
        WHERE w.composer_id = ?
        "#,
    )
    .bind(id)
    .bind(id)
    .bind(id)
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .iter()
        .map(|r| r.try_get("url"))
        .collect::<Result<Vec<String>, _>>()?)
}

/// Delete a composer with all works, compositions and recordings
///
/// Rows go through `ON DELETE CASCADE`; the files they referenced are
/// removed (best-effort) once the delete is committed.
pub async fn delete_composer(pool: &SqlitePool, media: &MediaStore, id: i64) -> ApiResult<()> {
    let mut tx = pool.begin().await?;

    if fetch_composer(&mut *tx, id).await?.is_none() {
        return Err(not_found(id));
    }
    let urls = collect_media_urls(&mut tx, id).await?;

    sqlx::query("DELETE FROM composers WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let removed = media.remove_urls(&urls);
    info!(
        composer_id = id,
        files = urls.len(),
        removed,
        "Deleted composer"
    );
    Ok(())
}
