//! Media file store
//!
//! Audio files and cover images live under `<root>/static/` and are referred
//! to in the database by their public URL (`/static/music/12.flac`,
//! `/static/covers/works/work_3_....jpg`). Deletions are best-effort: a file
//! that cannot be removed is logged and otherwise ignored.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Public URL prefix of everything served from the media root
pub const STATIC_PREFIX: &str = "/static/";

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// `root` is the folder containing `static/`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn music_dir(&self) -> PathBuf {
        self.root.join("static").join("music")
    }

    /// Cover folder for one entity kind (`composers`, `works`, ...)
    pub fn covers_dir(&self, kind: &str) -> PathBuf {
        self.root.join("static").join("covers").join(kind)
    }

    /// Map a public `/static/...` URL to its path under the root
    ///
    /// Returns `None` for anything that is not a plain relative path below
    /// `/static/`, including YouTube placeholders and `..` components.
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(STATIC_PREFIX)?;
        let relative = Path::new(relative);

        let mut path = self.root.join("static");
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                _ => return None,
            }
        }

        if path == self.root.join("static") {
            return None;
        }
        Some(path)
    }

    /// Public URL for a path inside the media root
    pub fn url_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.root.join("static")).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("{}{}", STATIC_PREFIX, parts.join("/")))
    }

    /// Delete the file behind a public URL (best-effort)
    ///
    /// Returns true when a file was actually removed.
    pub fn remove_url(&self, url: &str) -> bool {
        let Some(path) = self.resolve_url(url) else {
            debug!("Not a media URL, nothing to delete: {}", url);
            return false;
        };

        if !path.exists() {
            return false;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted media file: {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to delete media file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Delete several files (best-effort), returning how many were removed
    pub fn remove_urls<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter(|url| self.remove_url(url.as_ref()))
            .count()
    }

    /// Move an audio file into the music folder as `<id><ext>`
    ///
    /// Falls back to copy + remove when the source is on another
    /// filesystem. Returns the public URL of the stored file.
    pub fn store_recording_file(&self, source: &Path, recording_id: i64) -> Result<String> {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "mp3".to_string());

        let music_dir = self.music_dir();
        std::fs::create_dir_all(&music_dir)?;
        let target = music_dir.join(format!("{}.{}", recording_id, ext));

        if std::fs::rename(source, &target).is_err() {
            std::fs::copy(source, &target)?;
            if let Err(e) = std::fs::remove_file(source) {
                warn!("Copied {} but could not remove source: {}", source.display(), e);
            }
        }

        self.url_for(&target)
            .ok_or_else(|| Error::Internal(format!("{} is outside media root", target.display())))
    }
}

/// SHA-256 of a file's contents as lowercase hex
///
/// Runs on a blocking thread; reads in 1MB chunks.
pub async fn hash_file(path: &Path) -> Result<String> {
    let path_buf = path.to_path_buf();

    let hash = tokio::task::spawn_blocking(move || -> Result<String> {
        use std::io::Read;

        let mut file = std::fs::File::open(&path_buf)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 1024 * 1024];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    })
    .await
    .map_err(|e| Error::Internal(format!("Hash calculation task failed: {}", e)))??;

    debug!(path = %path.display(), "Calculated file hash");
    Ok(hash)
}
