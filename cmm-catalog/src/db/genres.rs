//! Genres with typo protection

use crate::models::Genre;
use crate::similarity::is_genre_typo;
use crate::{ApiError, ApiResult};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// All genres ordered by name
pub async fn list_genres(pool: &SqlitePool) -> ApiResult<Vec<Genre>> {
    let rows = sqlx::query("SELECT id, name FROM genres ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|r| -> sqlx::Result<Genre> {
            Ok(Genre {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(ApiError::from)
}

/// Existing genre within typo distance of `name`, ignoring exact matches
///
/// Blank names have no similar genre.
pub async fn check_typo(pool: &SqlitePool, name: &str) -> ApiResult<Option<Genre>> {
    let clean = name.trim();
    if clean.is_empty() {
        return Ok(None);
    }

    let similar = list_genres(pool)
        .await?
        .into_iter()
        .find(|genre| is_genre_typo(clean, &genre.name));
    Ok(similar)
}

/// Return the matching genre, or create it unless it looks like a typo
///
/// - blank name: 400
/// - same name in any letter case: the existing genre
/// - within typo distance of an existing genre: 409 naming that genre
pub async fn check_and_create(pool: &SqlitePool, name: &str) -> ApiResult<Genre> {
    let clean = name.trim();
    if clean.is_empty() {
        return Err(ApiError::BadRequest(
            "Genre name cannot be empty".to_string(),
        ));
    }

    let genres = list_genres(pool).await?;
    let lowered = clean.to_lowercase();

    if let Some(existing) = genres.iter().find(|g| g.name.to_lowercase() == lowered) {
        return Ok(existing.clone());
    }

    if let Some(similar) = genres.iter().find(|g| is_genre_typo(clean, &g.name)) {
        return Err(ApiError::Conflict(format!(
            "Genre '{}' is very similar to existing '{}'. Possibly a typo.",
            clean, similar.name
        )));
    }

    let id = sqlx::query("INSERT INTO genres (name) VALUES (?)")
        .bind(clean)
        .execute(pool)
        .await?
        .last_insert_rowid();

    info!(genre_id = id, name = clean, "Created genre");
    Ok(Genre {
        id,
        name: clean.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_match_returns_existing() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        let opera = check_and_create(&pool, "Opera").await.unwrap();
        let again = check_and_create(&pool, "  OPERA ").await.unwrap();
        assert_eq!(opera, again);
        assert_eq!(list_genres(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        assert!(matches!(
            check_and_create(&pool, "   ").await,
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(check_typo(&pool, "").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_check_typo_ignores_exact_match() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        check_and_create(&pool, "Sonata").await.unwrap();

        assert_eq!(check_typo(&pool, "sonata").await.unwrap(), None);
        let similar = check_typo(&pool, "Sonta").await.unwrap().unwrap();
        assert_eq!(similar.name, "Sonata");
    }

    #[tokio::test]
    async fn test_typo_of_existing_genre_is_conflict() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        check_and_create(&pool, "Opera").await.unwrap();
        check_and_create(&pool, "Symphony").await.unwrap();

        // Short name, one edit away
        match check_and_create(&pool, "Opira").await {
            Err(ApiError::Conflict(msg)) => assert!(msg.contains("'Opera'")),
            other => panic!("expected conflict, got {:?}", other),
        }

        // Long name, two edits away
        match check_and_create(&pool, "Symphonie").await {
            Err(ApiError::Conflict(msg)) => assert!(msg.contains("'Symphony'")),
            other => panic!("expected conflict, got {:?}", other),
        }

        assert_eq!(list_genres(&pool).await.unwrap().len(), 2);

        // Far enough from both
        check_and_create(&pool, "Serenade").await.unwrap();
        assert_eq!(list_genres(&pool).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_short_name_two_edits_away_is_created() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        check_and_create(&pool, "Opera").await.unwrap();

        let created = check_and_create(&pool, "Ostra").await.unwrap();
        assert_eq!(created.name, "Ostra");
        assert_eq!(list_genres(&pool).await.unwrap().len(), 2);
    }
}
