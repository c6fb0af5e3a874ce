//! Row mapping shared by the data-access modules
//!
//! Joined queries alias every column with a per-table prefix (`m_` composer,
//! `w_` work, `c_` composition, `r_` recording) so one row can be split
//! back into its parts.

use crate::models::{
    Composer, Composition, CompositionWithWork, Recording, RecordingWithDetails, Score, Work,
    WorkWithComposer,
};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::Row;

pub(crate) const COMPOSER_COLUMNS: &[&str] = &[
    "id",
    "slug",
    "name",
    "name_ru",
    "original_name",
    "year_born",
    "year_died",
    "portrait_url",
    "notes",
];

pub(crate) const WORK_COLUMNS: &[&str] = &[
    "id",
    "slug",
    "name",
    "name_ru",
    "original_name",
    "tonality",
    "genre",
    "nickname",
    "is_no_catalog",
    "catalog_number",
    "publication_year",
    "publication_year_end",
    "notes",
    "cover_art_url",
    "composer_id",
    "created_at",
];

pub(crate) const COMPOSITION_COLUMNS: &[&str] = &[
    "id",
    "slug",
    "sort_order",
    "tonality",
    "is_no_catalog",
    "title",
    "title_ru",
    "title_original",
    "catalog_number",
    "composition_year",
    "notes",
    "cover_art_url",
    "work_id",
];

pub(crate) const RECORDING_COLUMNS: &[&str] = &[
    "id",
    "performers",
    "recording_year",
    "duration",
    "youtube_url",
    "file_path",
    "file_hash",
    "composition_id",
    "created_at",
];

pub(crate) const SCORE_COLUMNS: &[&str] = &[
    "id",
    "score_type",
    "editor",
    "license",
    "source_text",
    "url",
    "work_id",
    "composition_id",
];

/// `alias.col AS prefixcol, ...`
pub(crate) fn select_list(alias: &str, prefix: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{alias}.{c} AS {prefix}{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Works joined with their composer
pub(crate) fn works_with_composer_sql() -> String {
    format!(
        "SELECT {}, {} FROM works w JOIN composers m ON m.id = w.composer_id",
        select_list("w", "w_", WORK_COLUMNS),
        select_list("m", "m_", COMPOSER_COLUMNS),
    )
}

/// Compositions joined with work and composer
pub(crate) fn compositions_with_work_sql() -> String {
    format!(
        "SELECT {}, {}, {} FROM compositions c \
         JOIN works w ON w.id = c.work_id \
         JOIN composers m ON m.id = w.composer_id",
        select_list("c", "c_", COMPOSITION_COLUMNS),
        select_list("w", "w_", WORK_COLUMNS),
        select_list("m", "m_", COMPOSER_COLUMNS),
    )
}

/// Recordings joined with their full ancestry
pub(crate) fn recordings_with_details_sql() -> String {
    format!(
        "SELECT {}, {}, {}, {} FROM recordings r \
         JOIN compositions c ON c.id = r.composition_id \
         JOIN works w ON w.id = c.work_id \
         JOIN composers m ON m.id = w.composer_id",
        select_list("r", "r_", RECORDING_COLUMNS),
        select_list("c", "c_", COMPOSITION_COLUMNS),
        select_list("w", "w_", WORK_COLUMNS),
        select_list("m", "m_", COMPOSER_COLUMNS),
    )
}

/// Typed access to prefixed columns
struct Prefixed<'r> {
    row: &'r SqliteRow,
    prefix: &'r str,
}

impl<'r> Prefixed<'r> {
    fn get<T>(&self, column: &str) -> sqlx::Result<T>
    where
        T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
    {
        self.row.try_get(format!("{}{}", self.prefix, column).as_str())
    }
}

pub(crate) fn composer(row: &SqliteRow, prefix: &str) -> sqlx::Result<Composer> {
    let r = Prefixed { row, prefix };
    Ok(Composer {
        id: r.get("id")?,
        slug: r.get("slug")?,
        name: r.get("name")?,
        name_ru: r.get("name_ru")?,
        original_name: r.get("original_name")?,
        year_born: r.get("year_born")?,
        year_died: r.get("year_died")?,
        portrait_url: r.get("portrait_url")?,
        notes: r.get("notes")?,
    })
}

pub(crate) fn work(row: &SqliteRow, prefix: &str) -> sqlx::Result<Work> {
    let r = Prefixed { row, prefix };
    Ok(Work {
        id: r.get("id")?,
        slug: r.get("slug")?,
        name: r.get("name")?,
        name_ru: r.get("name_ru")?,
        original_name: r.get("original_name")?,
        tonality: r.get("tonality")?,
        genre: r.get("genre")?,
        nickname: r.get("nickname")?,
        is_no_catalog: r.get("is_no_catalog")?,
        catalog_number: r.get("catalog_number")?,
        publication_year: r.get("publication_year")?,
        publication_year_end: r.get("publication_year_end")?,
        notes: r.get("notes")?,
        cover_art_url: r.get("cover_art_url")?,
        composer_id: r.get("composer_id")?,
        created_at: r.get("created_at")?,
    })
}

pub(crate) fn composition(row: &SqliteRow, prefix: &str) -> sqlx::Result<Composition> {
    let r = Prefixed { row, prefix };
    Ok(Composition {
        id: r.get("id")?,
        slug: r.get("slug")?,
        sort_order: r.get("sort_order")?,
        tonality: r.get("tonality")?,
        is_no_catalog: r.get("is_no_catalog")?,
        title: r.get("title")?,
        title_ru: r.get("title_ru")?,
        title_original: r.get("title_original")?,
        catalog_number: r.get("catalog_number")?,
        composition_year: r.get("composition_year")?,
        notes: r.get("notes")?,
        cover_art_url: r.get("cover_art_url")?,
        work_id: r.get("work_id")?,
    })
}

pub(crate) fn recording(row: &SqliteRow, prefix: &str) -> sqlx::Result<Recording> {
    let r = Prefixed { row, prefix };
    Ok(Recording {
        id: r.get("id")?,
        performers: r.get("performers")?,
        recording_year: r.get("recording_year")?,
        duration: r.get("duration")?,
        youtube_url: r.get("youtube_url")?,
        file_path: r.get("file_path")?,
        file_hash: r.get("file_hash")?,
        composition_id: r.get("composition_id")?,
        created_at: r.get("created_at")?,
    })
}

pub(crate) fn score(row: &SqliteRow) -> sqlx::Result<Score> {
    Ok(Score {
        id: row.try_get("id")?,
        score_type: row.try_get("score_type")?,
        editor: row.try_get("editor")?,
        license: row.try_get("license")?,
        source_text: row.try_get("source_text")?,
        url: row.try_get("url")?,
        work_id: row.try_get("work_id")?,
        composition_id: row.try_get("composition_id")?,
    })
}

pub(crate) fn work_with_composer(row: &SqliteRow) -> sqlx::Result<WorkWithComposer> {
    Ok(WorkWithComposer {
        work: work(row, "w_")?,
        composer: composer(row, "m_")?,
    })
}

pub(crate) fn composition_with_work(row: &SqliteRow) -> sqlx::Result<CompositionWithWork> {
    Ok(CompositionWithWork {
        composition: composition(row, "c_")?,
        work: work_with_composer(row)?,
    })
}

pub(crate) fn recording_with_details(row: &SqliteRow) -> sqlx::Result<RecordingWithDetails> {
    Ok(RecordingWithDetails {
        recording: recording(row, "r_")?,
        composition: composition(row, "c_")?,
        work: work(row, "w_")?,
        composer: composer(row, "m_")?,
    })
}
