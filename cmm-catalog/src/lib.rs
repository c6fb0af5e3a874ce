//! cmm-catalog library - classical music catalog core
//!
//! Composers, works, compositions (movements) and recordings, plus user
//! playlists and favorites, scores, genres, fuzzy search and the random
//! "play something" picker. Every operation returns [`ApiResult`], whose
//! error maps onto an HTTP status.

use cmm_common::config::{CatalogConfig, RootFolderInitializer};
use cmm_common::MediaStore;
use sqlx::SqlitePool;

pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod search;
pub mod similarity;
pub mod slug;

pub use error::{ApiError, ApiResult};

/// Shared state for anything serving the catalog
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Audio and cover image files
    pub media: MediaStore,
}

impl AppState {
    pub fn new(db: SqlitePool, media: MediaStore) -> Self {
        Self { db, media }
    }

    /// Create the root folder layout and open (or create) the database
    pub async fn open(config: &CatalogConfig) -> ApiResult<Self> {
        let initializer = RootFolderInitializer::new(config.clone());
        initializer.ensure_directory_exists()?;

        let db = cmm_common::db::init_database(&initializer.database_path()).await?;
        Ok(Self::new(db, MediaStore::new(&config.root_folder)))
    }
}
