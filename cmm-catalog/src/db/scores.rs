//! Sheet music links attached to works or compositions

use super::rows::{self, select_list, SCORE_COLUMNS};
use super::{compositions, require_text, works};
use crate::models::{Score, ScoreCreate, ScoreUpdate};
use crate::{ApiError, ApiResult};
use sqlx::SqlitePool;
use tracing::info;

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT {} FROM scores s {}",
        select_list("s", "", SCORE_COLUMNS),
        filter
    )
}

pub async fn get_score(pool: &SqlitePool, id: i64) -> ApiResult<Score> {
    let sql = select_sql("WHERE s.id = ?");
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Score {} not found", id)))?;
    Ok(rows::score(&row)?)
}

/// Attach a score to a work and/or composition
///
/// At least one target is required (400); each given target must exist
/// (404).
pub async fn create_score(pool: &SqlitePool, input: ScoreCreate) -> ApiResult<Score> {
    if input.work_id.is_none() && input.composition_id.is_none() {
        return Err(ApiError::BadRequest(
            "A score must belong to a work or a composition".to_string(),
        ));
    }
    let score_type = require_text("score_type", &input.score_type)?;
    let source_text = require_text("source_text", &input.source_text)?;
    let url = require_text("url", &input.url)?;

    if let Some(work_id) = input.work_id {
        works::get_work(pool, work_id).await?;
    }
    if let Some(composition_id) = input.composition_id {
        compositions::get_composition(pool, composition_id).await?;
    }

    let id = sqlx::query(
        r#"
        INSERT INTO scores (score_type, editor, license, source_text, url, work_id, composition_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&score_type)
    .bind(&input.editor)
    .bind(&input.license)
    .bind(&source_text)
    .bind(&url)
    .bind(input.work_id)
    .bind(input.composition_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(score_id = id, "Created score");
    get_score(pool, id).await
}

pub async fn update_score(pool: &SqlitePool, id: i64, update: ScoreUpdate) -> ApiResult<Score> {
    let current = get_score(pool, id).await?;

    let score_type = match &update.score_type {
        Some(t) => require_text("score_type", t)?,
        None => current.score_type,
    };
    let source_text = match &update.source_text {
        Some(t) => require_text("source_text", t)?,
        None => current.source_text,
    };
    let url = match &update.url {
        Some(u) => require_text("url", u)?,
        None => current.url,
    };

    sqlx::query(
        r#"
        UPDATE scores
        SET score_type = ?, editor = ?, license = ?, source_text = ?, url = ?
        WHERE id = ?
        "#,
    )
    .bind(&score_type)
    .bind(update.editor.or(current.editor))
    .bind(update.license.or(current.license))
    .bind(&source_text)
    .bind(&url)
    .bind(id)
    .execute(pool)
    .await?;

    get_score(pool, id).await
}

pub async fn delete_score(pool: &SqlitePool, id: i64) -> ApiResult<()> {
    let result = sqlx::query("DELETE FROM scores WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Score {} not found", id)));
    }
    info!(score_id = id, "Deleted score");
    Ok(())
}

pub async fn list_scores_for_work(pool: &SqlitePool, work_id: i64) -> ApiResult<Vec<Score>> {
    let sql = select_sql("WHERE s.work_id = ? ORDER BY s.id");
    let rows = sqlx::query(&sql).bind(work_id).fetch_all(pool).await?;
    rows.iter()
        .map(|r| rows::score(r).map_err(ApiError::from))
        .collect()
}

pub async fn list_scores_for_composition(
    pool: &SqlitePool,
    composition_id: i64,
) -> ApiResult<Vec<Score>> {
    let sql = select_sql("WHERE s.composition_id = ? ORDER BY s.id");
    let rows = sqlx::query(&sql).bind(composition_id).fetch_all(pool).await?;
    rows.iter()
        .map(|r| rows::score(r).map_err(ApiError::from))
        .collect()
}
