//! Work database operations

use super::compositions::list_composition_summaries;
use super::rows::{self, select_list, works_with_composer_sql, WORK_COLUMNS};
use super::{composers, non_blank, require_text};
use crate::models::{Work, WorkCreate, WorkDetail, WorkUpdate, WorkWithComposer};
use crate::slug::{generate_unique_slug, SlugTable};
use crate::{ApiError, ApiResult};
use cmm_common::MediaStore;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Work {} not found", id))
}

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT {} FROM works w {}",
        select_list("w", "w_", WORK_COLUMNS),
        filter
    )
}

pub(crate) async fn fetch_work<'e, E>(executor: E, id: i64) -> ApiResult<Option<Work>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = select_sql("WHERE w.id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(|r| rows::work(&r, "w_")).transpose()?)
}

pub(crate) async fn fetch_work_with_composer<'e, E>(
    executor: E,
    id: i64,
) -> ApiResult<Option<WorkWithComposer>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE w.id = ?", works_with_composer_sql());
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(|r| rows::work_with_composer(&r)).transpose()?)
}

pub async fn get_work(pool: &SqlitePool, id: i64) -> ApiResult<Work> {
    fetch_work(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn get_work_with_composer(pool: &SqlitePool, id: i64) -> ApiResult<WorkWithComposer> {
    fetch_work_with_composer(pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn resolve_work_id(pool: &SqlitePool, key: &str) -> ApiResult<i64> {
    let row = sqlx::query("SELECT id FROM works WHERE slug = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    if let Some(row) = row {
        return Ok(row.try_get("id")?);
    }

    if let Ok(id) = key.parse::<i64>() {
        if fetch_work(pool, id).await?.is_some() {
            return Ok(id);
        }
    }

    Err(ApiError::NotFound(format!("Work '{}' not found", key)))
}

/// Work page by slug (or numeric id): composer plus ordered movements
pub async fn get_work_detail(pool: &SqlitePool, key: &str) -> ApiResult<WorkDetail> {
    let id = resolve_work_id(pool, key).await?;
    let WorkWithComposer { work, composer } = get_work_with_composer(pool, id).await?;
    let compositions = list_composition_summaries(pool, id).await?;

    Ok(WorkDetail {
        work,
        composer,
        compositions,
    })
}

/// Works of one composer, ordered by display name
pub async fn list_works_for_composer(pool: &SqlitePool, composer_id: i64) -> ApiResult<Vec<Work>> {
    composers::get_composer(pool, composer_id).await?;

    let sql = select_sql("WHERE w.composer_id = ? ORDER BY w.name_ru, w.id");
    let rows = sqlx::query(&sql).bind(composer_id).fetch_all(pool).await?;

    rows.iter()
        .map(|r| rows::work(r, "w_").map_err(ApiError::from))
        .collect()
}

/// Every work with its composer
pub async fn list_all_works_with_composer(pool: &SqlitePool) -> ApiResult<Vec<WorkWithComposer>> {
    let sql = format!("{} ORDER BY w.name_ru, w.id", works_with_composer_sql());
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|r| rows::work_with_composer(r).map_err(ApiError::from))
        .collect()
}

/// Create a work under a composer (404 if the composer is missing)
pub async fn create_work(
    pool: &SqlitePool,
    composer_id: i64,
    input: WorkCreate,
) -> ApiResult<WorkWithComposer> {
    let name_ru = require_text("name_ru", &input.name_ru)?;
    let name = non_blank(input.name.as_deref()).map(str::to_string);

    let mut tx = pool.begin().await?;

    if composers::fetch_composer(&mut *tx, composer_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Composer {} not found",
            composer_id
        )));
    }

    let slug_base = name.clone().unwrap_or_else(|| name_ru.clone());
    let slug = generate_unique_slug(&mut tx, SlugTable::Works, &slug_base, None).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO works (
            slug, name, name_ru, original_name, tonality, genre, nickname,
            is_no_catalog, catalog_number, publication_year, publication_year_end,
            notes, composer_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&slug)
    .bind(&name)
    .bind(&name_ru)
    .bind(&input.original_name)
    .bind(&input.tonality)
    .bind(&input.genre)
    .bind(&input.nickname)
    .bind(input.is_no_catalog)
    .bind(&input.catalog_number)
    .bind(input.publication_year)
    .bind(input.publication_year_end)
    .bind(&input.notes)
    .bind(composer_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(work_id = id, composer_id, %slug, "Created work");
    get_work_with_composer(pool, id).await
}

pub(crate) async fn apply_work_update(
    conn: &mut SqliteConnection,
    id: i64,
    update: &WorkUpdate,
) -> ApiResult<()> {
    let current = fetch_work(&mut *conn, id).await?.ok_or_else(|| not_found(id))?;

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
        Some(generate_unique_slug(conn, SlugTable::Works, &base, current.slug.as_deref()).await?)
    } else {
        current.slug.clone()
    };

    sqlx::query(
        r#"
        UPDATE works
        SET slug = ?, name = ?, name_ru = ?, original_name = ?, tonality = ?,
            genre = ?, nickname = ?, is_no_catalog = ?, catalog_number = ?,
            publication_year = ?, publication_year_end = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(&slug)
    .bind(&name)
    .bind(&name_ru)
    .bind(update.original_name.as_ref().or(current.original_name.as_ref()))
    .bind(update.tonality.as_ref().or(current.tonality.as_ref()))
    .bind(update.genre.as_ref().or(current.genre.as_ref()))
    .bind(update.nickname.as_ref().or(current.nickname.as_ref()))
    .bind(update.is_no_catalog.unwrap_or(current.is_no_catalog))
    .bind(update.catalog_number.as_ref().or(current.catalog_number.as_ref()))
    .bind(update.publication_year.or(current.publication_year))
    .bind(update.publication_year_end.or(current.publication_year_end))
    .bind(update.notes.as_ref().or(current.notes.as_ref()))
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_work(pool: &SqlitePool, id: i64, update: WorkUpdate) -> ApiResult<Work> {
    let mut tx = pool.begin().await?;
    apply_work_update(&mut tx, id, &update).await?;
    tx.commit().await?;

    info!(work_id = id, "Updated work");
    get_work(pool, id).await
}

/// Replace the cover URL, removing the previous image file
pub async fn set_work_cover(
    pool: &SqlitePool,
    media: &MediaStore,
    id: i64,
    cover_art_url: Option<&str>,
) -> ApiResult<Work> {
    let current = get_work(pool, id).await?;

    sqlx::query("UPDATE works SET cover_art_url = ? WHERE id = ?")
        .bind(cover_art_url)
        .bind(id)
        .execute(pool)
        .await?;

    if let Some(old) = current.cover_art_url.as_deref() {
        if Some(old) != cover_art_url {
            media.remove_url(old);
        }
    }

    get_work(pool, id).await
}

async fn collect_media_urls(conn: &mut SqliteConnection, id: i64) -> ApiResult<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT cover_art_url AS url FROM works
        WHERE id = ? AND cover_art_url IS NOT NULL
        UNION ALL
        SELECT cover_art_url FROM compositions
        WHERE work_id = ? AND cover_art_url IS NOT NULL
        UNION ALL
        SELECT r.file_path FROM recordings r
        JOIN compositions c ON c.id = r.composition_id
        WHERE c.work_id = ?
        "#,
    )
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

/// Delete a work with its compositions and recordings, then their files
pub async fn delete_work(pool: &SqlitePool, media: &MediaStore, id: i64) -> ApiResult<()> {
    let mut tx = pool.begin().await?;

    if fetch_work(&mut *tx, id).await?.is_none() {
        return Err(not_found(id));
    }
    let urls = collect_media_urls(&mut tx, id).await?;

    sqlx::query("DELETE FROM works WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let removed = media.remove_urls(&urls);
    info!(work_id = id, files = urls.len(), removed, "Deleted work");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::compositions::create_composition;
    use crate::models::{ComposerCreate, CompositionCreate};

    async fn setup() -> (SqlitePool, i64) {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        let composer = composers::create_composer(
            &pool,
            ComposerCreate {
                name: Some("Ludwig van Beethoven".into()),
                name_ru: "Людвиг ван Бетховен".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (pool, composer.id)
    }

    fn symphony(n: u8) -> WorkCreate {
        WorkCreate {
            name: Some(format!("Symphony No. {}", n)),
            name_ru: format!("Симфония № {}", n),
            genre: Some("Symphony".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_work_for_missing_composer() {
        let (pool, _) = setup().await;
        let err = create_work(&pool, 999, symphony(5)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_work_detail_lists_compositions_in_order() {
        let (pool, composer_id) = setup().await;
        let work = create_work(&pool, composer_id, symphony(5)).await.unwrap();
        assert_eq!(work.work.slug.as_deref(), Some("symphony-no-5"));
        assert_eq!(work.composer.id, composer_id);

        for title in ["Allegro con brio", "Andante con moto"] {
            create_composition(
                &pool,
                work.work.id,
                CompositionCreate {
                    title: Some(title.into()),
                    title_ru: title.into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let detail = get_work_detail(&pool, "symphony-no-5").await.unwrap();
        let titles: Vec<_> = detail
            .compositions
            .iter()
            .map(|c| c.composition.title_ru.as_str())
            .collect();
        assert_eq!(titles, vec!["Allegro con brio", "Andante con moto"]);
        assert!(detail.compositions.iter().all(|c| !c.has_audio && !c.has_video));
    }

    #[tokio::test]
    async fn test_same_name_works_get_distinct_slugs() {
        let (pool, composer_id) = setup().await;
        let a = create_work(&pool, composer_id, symphony(1)).await.unwrap();
        let b = create_work(&pool, composer_id, symphony(1)).await.unwrap();
        assert_ne!(a.work.slug, b.work.slug);
    }

    #[tokio::test]
    async fn test_list_for_composer_sorted_by_name_ru() {
        let (pool, composer_id) = setup().await;
        create_work(&pool, composer_id, symphony(9)).await.unwrap();
        create_work(&pool, composer_id, symphony(3)).await.unwrap();

        let works = list_works_for_composer(&pool, composer_id).await.unwrap();
        let names: Vec<_> = works.iter().map(|w| w.name_ru.as_str()).collect();
        assert_eq!(names, vec!["Симфония № 3", "Симфония № 9"]);
    }

    #[tokio::test]
    async fn test_update_work_keeps_unset_fields() {
        let (pool, composer_id) = setup().await;
        let work = create_work(&pool, composer_id, symphony(3)).await.unwrap();

        let updated = update_work(
            &pool,
            work.work.id,
            WorkUpdate {
                nickname: Some("Eroica".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("Eroica"));
        assert_eq!(updated.genre.as_deref(), Some("Symphony"));
        assert_eq!(updated.slug, work.work.slug);
    }
}
