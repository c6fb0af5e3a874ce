//! URL slugs
//!
//! Slugs are derived from display names (transliterated to ASCII) and are
//! unique per table. On collision a random 4-hex-digit suffix is appended,
//! retrying until the slug is free.

use crate::ApiResult;
use rand::Rng;
use sqlx::SqliteConnection;
use tracing::debug;

/// Tables that carry a `slug` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugTable {
    Composers,
    Works,
    Compositions,
}

impl SlugTable {
    fn table_name(self) -> &'static str {
        match self {
            SlugTable::Composers => "composers",
            SlugTable::Works => "works",
            SlugTable::Compositions => "compositions",
        }
    }
}

/// Lowercase ASCII slug: non-alphanumeric runs collapse to one `-`
///
/// Cyrillic and accented text is transliterated first.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let digit: u32 = rng.gen_range(0..16);
            char::from_digit(digit, 16).unwrap_or('0')
        })
        .collect()
}

async fn slug_taken(conn: &mut SqliteConnection, table: SlugTable, slug: &str) -> ApiResult<bool> {
    let query = format!("SELECT 1 FROM {} WHERE slug = ? LIMIT 1", table.table_name());
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

/// Slug for `base_text` that no other row of `table` uses
///
/// `old_slug` is the row's current slug when updating: if the name still
/// produces it, it is kept as is.
pub async fn generate_unique_slug(
    conn: &mut SqliteConnection,
    table: SlugTable,
    base_text: &str,
    old_slug: Option<&str>,
) -> ApiResult<String> {
    let base = slugify(base_text);
    if base.is_empty() {
        // Nothing transliterable; a random slug still has to be free
        loop {
            let candidate = random_hex(8);
            if !slug_taken(conn, table, &candidate).await? {
                return Ok(candidate);
            }
        }
    }

    if old_slug == Some(base.as_str()) {
        return Ok(base);
    }

    let mut candidate = base.clone();
    while slug_taken(conn, table, &candidate).await? {
        candidate = format!("{}-{}", base, random_hex(4));
        debug!(table = table.table_name(), %candidate, "Slug taken, retrying with suffix");
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_latin() {
        assert_eq!(slugify("Ludwig van Beethoven"), "ludwig-van-beethoven");
        assert_eq!(slugify("  Op. 27, No. 2 "), "op-27-no-2");
        assert_eq!(slugify("Dvořák"), "dvorak");
    }

    #[test]
    fn test_slugify_cyrillic_is_ascii() {
        let slug = slugify("Сергей Рахманинов");
        assert!(!slug.is_empty());
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        assert!(slug.contains('-'));
    }

    #[test]
    fn test_slugify_only_punctuation_is_empty() {
        assert_eq!(slugify("--- !!! ---"), "");
    }

    #[test]
    fn test_random_hex_shape() {
        let s = random_hex(8);
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_unique_slug_appends_suffix_on_collision() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        sqlx::query("INSERT INTO composers (slug, name_ru) VALUES ('bach', 'Бах')")
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let slug = generate_unique_slug(&mut conn, SlugTable::Composers, "Bach", None)
            .await
            .unwrap();
        assert_ne!(slug, "bach");
        assert!(slug.starts_with("bach-"));
        assert_eq!(slug.len(), "bach-".len() + 4);

        // Unchanged name keeps the current slug
        let kept = generate_unique_slug(&mut conn, SlugTable::Composers, "Bach", Some("bach"))
            .await
            .unwrap();
        assert_eq!(kept, "bach");

        // Other tables are independent
        let work_slug = generate_unique_slug(&mut conn, SlugTable::Works, "Bach", None)
            .await
            .unwrap();
        assert_eq!(work_slug, "bach");
    }

    #[tokio::test]
    async fn test_empty_base_gets_random_slug() {
        let pool = cmm_common::db::init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let slug = generate_unique_slug(&mut conn, SlugTable::Works, "***", None)
            .await
            .unwrap();
        assert_eq!(slug.len(), 8);
    }
}
