//! Probable-duplicate lookups run before creating composers or works

use super::{composers, works};
use crate::models::{Composer, Work};
use crate::similarity::is_probable_duplicate;
use crate::ApiResult;
use sqlx::SqlitePool;

/// Existing composers whose Russian or Latin name resembles `name`
pub async fn similar_composers(pool: &SqlitePool, name: &str) -> ApiResult<Vec<Composer>> {
    let found = composers::list_all_composers(pool)
        .await?
        .into_iter()
        .filter(|c| {
            is_probable_duplicate(name, &c.name_ru)
                || c.name
                    .as_deref()
                    .map(|n| is_probable_duplicate(name, n))
                    .unwrap_or(false)
        })
        .collect();
    Ok(found)
}

/// Works of one composer whose name resembles `name`
pub async fn similar_works(pool: &SqlitePool, composer_id: i64, name: &str) -> ApiResult<Vec<Work>> {
    let found = works::list_works_for_composer(pool, composer_id)
        .await?
        .into_iter()
        .filter(|w| {
            [Some(w.name_ru.as_str()), w.name.as_deref(), w.original_name.as_deref()]
                .into_iter()
                .flatten()
                .any(|candidate| is_probable_duplicate(name, candidate))
        })
        .collect();
    Ok(found)
}
