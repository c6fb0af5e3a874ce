//! Fuzzy universal search
//!
//! Every query token must either appear verbatim in a candidate's
//! normalized searchable text or reach the similarity threshold against it
//! by partial ratio. Short tokens (< 4 chars) must match exactly. When
//! nothing at all matches, the query is retried once with the keyboard
//! layout swapped.

pub mod fuzz;
pub mod layout;
pub mod normalize;

use crate::db::{composers, compositions, recordings, works};
use crate::models::{
    Composer, CompositionWithWork, RecordingWithDetails, SearchResults, WorkWithComposer,
};
use crate::ApiResult;
use sqlx::SqlitePool;
use tracing::debug;

pub use layout::swap_layout;
pub use normalize::{normalize, searchable_text, tokenize};

/// Queries shorter than this return nothing
pub const MIN_QUERY_CHARS: usize = 2;

pub const MAX_COMPOSERS: usize = 10;
pub const MAX_WORKS: usize = 20;
pub const MAX_COMPOSITIONS: usize = 20;
pub const MAX_RECORDINGS: usize = 50;

/// Tokens shorter than this need a perfect match
const SHORT_TOKEN_CHARS: usize = 4;

/// Similarity required for a token, by length
pub fn token_threshold(token: &str) -> u8 {
    if token.chars().count() < SHORT_TOKEN_CHARS {
        100
    } else {
        80
    }
}

/// Every token matches `text` (substring or fuzzy)
pub fn matches_all_tokens(tokens: &[String], text: &str) -> bool {
    if tokens.is_empty() || text.is_empty() {
        return false;
    }
    tokens.iter().all(|token| {
        text.contains(token.as_str()) || fuzz::partial_ratio(token, text) >= token_threshold(token)
    })
}

fn composer_text(c: &Composer) -> String {
    searchable_text([
        Some(c.name_ru.as_str()),
        c.name.as_deref(),
        c.original_name.as_deref(),
    ])
}

fn work_text(w: &WorkWithComposer) -> String {
    searchable_text([
        Some(w.work.name_ru.as_str()),
        w.work.name.as_deref(),
        w.work.original_name.as_deref(),
        w.work.nickname.as_deref(),
        w.work.catalog_number.as_deref(),
        Some(w.composer.name_ru.as_str()),
        w.composer.name.as_deref(),
    ])
}

fn composition_text(c: &CompositionWithWork) -> String {
    searchable_text([
        Some(c.composition.title_ru.as_str()),
        c.composition.title.as_deref(),
        c.composition.title_original.as_deref(),
        c.composition.catalog_number.as_deref(),
        Some(c.work.work.name_ru.as_str()),
        Some(c.work.composer.name_ru.as_str()),
    ])
}

fn recording_text(r: &RecordingWithDetails) -> String {
    let year = r.recording.recording_year.map(|y| y.to_string());
    searchable_text([
        r.recording.performers.as_deref(),
        year.as_deref(),
        Some(r.composition.title_ru.as_str()),
        Some(r.work.name_ru.as_str()),
        Some(r.composer.name_ru.as_str()),
    ])
}

/// Everything the search runs over, loaded once per query
struct Corpus {
    composers: Vec<Composer>,
    works: Vec<WorkWithComposer>,
    compositions: Vec<CompositionWithWork>,
    recordings: Vec<RecordingWithDetails>,
}

impl Corpus {
    async fn load(pool: &SqlitePool) -> ApiResult<Self> {
        Ok(Self {
            composers: composers::list_all_composers(pool).await?,
            works: works::list_all_works_with_composer(pool).await?,
            compositions: compositions::list_all_compositions_with_work(pool).await?,
            recordings: recordings::list_all_recordings_with_details(pool).await?,
        })
    }

    fn search(&self, query: &str, tokens: &[String]) -> SearchResults {
        fn pick<T: Clone>(
            items: &[T],
            limit: usize,
            text: impl Fn(&T) -> String,
            tokens: &[String],
        ) -> Vec<T> {
            items
                .iter()
                .filter(|item| matches_all_tokens(tokens, &text(*item)))
                .take(limit)
                .cloned()
                .collect()
        }

        SearchResults {
            query: query.to_string(),
            composers: pick(&self.composers, MAX_COMPOSERS, composer_text, tokens),
            works: pick(&self.works, MAX_WORKS, work_text, tokens),
            compositions: pick(&self.compositions, MAX_COMPOSITIONS, composition_text, tokens),
            recordings: pick(&self.recordings, MAX_RECORDINGS, recording_text, tokens),
        }
    }
}

/// Search composers, works, compositions and recordings at once
pub async fn universal_search(pool: &SqlitePool, query: &str) -> ApiResult<SearchResults> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Ok(SearchResults::empty(query));
    }

    let tokens = tokenize(trimmed);
    if tokens.is_empty() {
        return Ok(SearchResults::empty(query));
    }

    let corpus = Corpus::load(pool).await?;
    let results = corpus.search(query, &tokens);
    if !results.is_empty() {
        return Ok(results);
    }

    let swapped = tokenize(&swap_layout(trimmed));
    if swapped.is_empty() || swapped == tokens {
        return Ok(results);
    }

    debug!(query, "No matches, retrying with swapped keyboard layout");
    Ok(corpus.search(query, &swapped))
}
