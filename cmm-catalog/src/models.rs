//! Catalog record types
//!
//! Row types mirror the tables created by `cmm_common::db`. The `*With*`
//! and `*Detail` types are the eager-loaded shapes returned to callers;
//! `*Create` / `*Update` types are inputs. Update types are partial: a
//! `None` field leaves the stored value unchanged.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Display name of the placeholder work holding loose compositions
pub const NO_COLLECTION_WORK: &str = "Без сборника";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composer {
    pub id: i64,
    pub slug: Option<String>,
    /// Latin name, also the slug source when present
    pub name: Option<String>,
    pub name_ru: String,
    pub original_name: Option<String>,
    pub year_born: Option<i64>,
    pub year_died: Option<i64>,
    pub portrait_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: i64,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub name_ru: String,
    pub original_name: Option<String>,
    pub tonality: Option<String>,
    pub genre: Option<String>,
    pub nickname: Option<String>,
    pub is_no_catalog: bool,
    pub catalog_number: Option<String>,
    pub publication_year: Option<i64>,
    pub publication_year_end: Option<i64>,
    pub notes: Option<String>,
    pub cover_art_url: Option<String>,
    pub composer_id: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub id: i64,
    pub slug: Option<String>,
    pub sort_order: i64,
    pub tonality: Option<String>,
    pub is_no_catalog: bool,
    pub title: Option<String>,
    pub title_ru: String,
    pub title_original: Option<String>,
    pub catalog_number: Option<String>,
    pub composition_year: Option<i64>,
    pub notes: Option<String>,
    pub cover_art_url: Option<String>,
    pub work_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub performers: Option<String>,
    pub recording_year: Option<i64>,
    /// Seconds; 0 for video-only entries
    pub duration: i64,
    pub youtube_url: Option<String>,
    pub file_path: String,
    pub file_hash: Option<String>,
    pub composition_id: i64,
    pub created_at: NaiveDateTime,
}

impl Recording {
    /// Has a playable audio file
    pub fn is_playable(&self) -> bool {
        self.duration > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkWithComposer {
    #[serde(flatten)]
    pub work: Work,
    pub composer: Composer,
}

/// Composition plus media availability flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionSummary {
    #[serde(flatten)]
    pub composition: Composition,
    /// Any recording with duration > 0
    pub has_audio: bool,
    /// Any video-only recording
    pub has_video: bool,
}

/// Work page: the work, its composer and its movements in order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkDetail {
    #[serde(flatten)]
    pub work: Work,
    pub composer: Composer,
    pub compositions: Vec<CompositionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionWithWork {
    #[serde(flatten)]
    pub composition: Composition,
    pub work: WorkWithComposer,
}

/// Recording with its full ancestry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingWithDetails {
    #[serde(flatten)]
    pub recording: Recording,
    pub composition: Composition,
    pub work: Work,
    pub composer: Composer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingPage {
    pub total: i64,
    pub recordings: Vec<RecordingWithDetails>,
}

/// Account as exposed to callers (no credentials)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    /// Sorted by playlist position
    pub recordings: Vec<RecordingWithDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub score_type: String,
    pub editor: Option<String>,
    pub license: Option<String>,
    pub source_text: String,
    pub url: String,
    pub work_id: Option<i64>,
    pub composition_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A random work and one performance of it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomWork {
    #[serde(flatten)]
    pub work: WorkWithComposer,
    /// One (performers, year) group, ordered by movement
    pub recordings: Vec<RecordingWithDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_recordings: i64,
    pub total_compositions: i64,
    pub total_works: i64,
    pub total_composers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub recently_added_works: Vec<WorkWithComposer>,
    pub random_works: Vec<WorkWithComposer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub composers: Vec<Composer>,
    pub works: Vec<WorkWithComposer>,
    pub compositions: Vec<CompositionWithWork>,
    pub recordings: Vec<RecordingWithDetails>,
}

impl SearchResults {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.composers.is_empty()
            && self.works.is_empty()
            && self.compositions.is_empty()
            && self.recordings.is_empty()
    }
}

// ----- inputs -----

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposerCreate {
    pub name: Option<String>,
    pub name_ru: String,
    pub original_name: Option<String>,
    pub year_born: Option<i64>,
    pub year_died: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposerUpdate {
    pub name: Option<String>,
    pub name_ru: Option<String>,
    pub original_name: Option<String>,
    pub year_born: Option<i64>,
    pub year_died: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkCreate {
    pub name: Option<String>,
    pub name_ru: String,
    pub original_name: Option<String>,
    pub tonality: Option<String>,
    pub genre: Option<String>,
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_no_catalog: bool,
    pub catalog_number: Option<String>,
    pub publication_year: Option<i64>,
    pub publication_year_end: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkUpdate {
    pub name: Option<String>,
    pub name_ru: Option<String>,
    pub original_name: Option<String>,
    pub tonality: Option<String>,
    pub genre: Option<String>,
    pub nickname: Option<String>,
    pub is_no_catalog: Option<bool>,
    pub catalog_number: Option<String>,
    pub publication_year: Option<i64>,
    pub publication_year_end: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompositionCreate {
    pub title: Option<String>,
    pub title_ru: String,
    pub title_original: Option<String>,
    pub tonality: Option<String>,
    #[serde(default)]
    pub is_no_catalog: bool,
    pub catalog_number: Option<String>,
    pub composition_year: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompositionUpdate {
    pub title: Option<String>,
    pub title_ru: Option<String>,
    pub title_original: Option<String>,
    pub tonality: Option<String>,
    pub is_no_catalog: Option<bool>,
    pub catalog_number: Option<String>,
    pub composition_year: Option<i64>,
    pub notes: Option<String>,
    pub sort_order: Option<i64>,
}

/// Audio file already on disk, waiting to be moved into the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct AudioUpload {
    pub path: PathBuf,
    /// Seconds, as probed by the uploader
    pub duration: i64,
}

/// New recording: an audio file, a YouTube link, or both
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingCreate {
    pub performers: Option<String>,
    pub recording_year: Option<i64>,
    pub youtube_url: Option<String>,
    pub audio: Option<AudioUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingUpdate {
    pub performers: Option<String>,
    pub recording_year: Option<i64>,
    pub youtube_url: Option<String>,
    pub duration: Option<i64>,
}

/// Edit a recording and its whole ancestry at once
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingFullUpdate {
    #[serde(default)]
    pub recording: RecordingUpdate,
    #[serde(default)]
    pub composition: CompositionUpdate,
    #[serde(default)]
    pub work: WorkUpdate,
    #[serde(default)]
    pub composer: ComposerUpdate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreCreate {
    pub score_type: String,
    pub editor: Option<String>,
    pub license: Option<String>,
    pub source_text: String,
    pub url: String,
    pub work_id: Option<i64>,
    pub composition_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreUpdate {
    pub score_type: Option<String>,
    pub editor: Option<String>,
    pub license: Option<String>,
    pub source_text: Option<String>,
    pub url: Option<String>,
}
