//! Test Helper Utilities
//!
//! On-disk catalog in a temp folder plus seeding shortcuts

#![allow(dead_code)]

use cmm_catalog::db::{composers, compositions, recordings, works};
use cmm_catalog::models::{
    AudioUpload, Composer, ComposerCreate, Composition, CompositionCreate, Recording,
    RecordingCreate, WorkCreate, WorkWithComposer,
};
use cmm_catalog::AppState;
use cmm_common::config::CatalogConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Catalog rooted in a temp folder; the folder lives as long as this value
pub struct TestCatalog {
    pub dir: TempDir,
    pub state: AppState,
}

impl TestCatalog {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig::new(dir.path());
        let state = AppState::open(&config).await.unwrap();
        Self { dir, state }
    }

    pub fn db(&self) -> &sqlx::SqlitePool {
        &self.state.db
    }

    pub async fn composer(&self, name_ru: &str) -> Composer {
        composers::create_composer(
            self.db(),
            ComposerCreate {
                name_ru: name_ru.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    pub async fn work(&self, composer_id: i64, name_ru: &str) -> WorkWithComposer {
        works::create_work(
            self.db(),
            composer_id,
            WorkCreate {
                name_ru: name_ru.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    pub async fn composition(&self, work_id: i64, title_ru: &str) -> Composition {
        compositions::create_composition(
            self.db(),
            work_id,
            CompositionCreate {
                title_ru: title_ru.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    /// Audio recording with unique file contents
    pub async fn audio(
        &self,
        composition_id: i64,
        performers: &str,
        year: Option<i64>,
    ) -> Recording {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);

        let path = self.dir.path().join(format!("upload_{}.mp3", n));
        std::fs::write(&path, format!("audio #{} for {}", n, performers)).unwrap();

        recordings::add_recording(
            self.db(),
            &self.state.media,
            composition_id,
            RecordingCreate {
                performers: Some(performers.into()),
                recording_year: year,
                audio: Some(AudioUpload {
                    path,
                    duration: 240,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    /// Video-only recording
    pub async fn video(&self, composition_id: i64, performers: &str) -> Recording {
        recordings::add_recording(
            self.db(),
            &self.state.media,
            composition_id,
            RecordingCreate {
                performers: Some(performers.into()),
                youtube_url: Some("https://www.youtube.com/watch?v=test".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    /// Write a cover image under `static/covers/<kind>/` and return its URL
    pub fn cover(&self, kind: &str, name: &str) -> String {
        let dir = self.state.media.covers_dir(kind);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"jpeg").unwrap();
        self.state.media.url_for(&path).unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        sqlx::query_scalar(&sql).fetch_one(self.db()).await.unwrap()
    }
}
