//! Landing page summary

use super::rows::{self, works_with_composer_sql};
use crate::models::{DashboardStats, DashboardSummary, WorkWithComposer, NO_COLLECTION_WORK};
use crate::{ApiError, ApiResult};
use sqlx::{Row, SqlitePool};

/// Works shown in each dashboard list
pub const DASHBOARD_WORKS: i64 = 12;

async fn count_rows(pool: &SqlitePool, table: &str) -> ApiResult<i64> {
    let sql = format!("SELECT COUNT(*) AS total FROM {}", table);
    let row = sqlx::query(&sql).fetch_one(pool).await?;
    Ok(row.try_get("total")?)
}

/// Catalog totals; the placeholder work is not counted
pub async fn get_stats(pool: &SqlitePool) -> ApiResult<DashboardStats> {
    let total_works: i64 = sqlx::query("SELECT COUNT(*) AS total FROM works WHERE name_ru != ?")
        .bind(NO_COLLECTION_WORK)
        .fetch_one(pool)
        .await?
        .try_get("total")?;

    Ok(DashboardStats {
        total_recordings: count_rows(pool, "recordings").await?,
        total_compositions: count_rows(pool, "compositions").await?,
        total_works,
        total_composers: count_rows(pool, "composers").await?,
    })
}

async fn works_ordered_by(pool: &SqlitePool, order: &str) -> ApiResult<Vec<WorkWithComposer>> {
    let sql = format!(
        "{} WHERE w.name_ru != ? ORDER BY {} LIMIT ?",
        works_with_composer_sql(),
        order
    );
    let rows = sqlx::query(&sql)
        .bind(NO_COLLECTION_WORK)
        .bind(DASHBOARD_WORKS)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|r| rows::work_with_composer(r).map_err(ApiError::from))
        .collect()
}

/// Stats, the newest works and a random selection
pub async fn get_dashboard_summary(pool: &SqlitePool) -> ApiResult<DashboardSummary> {
    Ok(DashboardSummary {
        stats: get_stats(pool).await?,
        recently_added_works: works_ordered_by(pool, "w.id DESC").await?,
        random_works: works_ordered_by(pool, "RANDOM()").await?,
    })
}
