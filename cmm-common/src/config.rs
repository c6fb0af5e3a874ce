//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_ENV_VAR: &str = "CMM_ROOT";

/// Folder name under the platform data and config dirs
const APP_DIR: &str = "cmm";

/// Default database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "cmm.db";

/// Contents of the optional TOML config file
///
/// ```toml
/// root_folder = "/srv/cmm"
/// database_file = "catalog.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub root_folder: Option<PathBuf>,
    pub database_file: Option<String>,
}

impl ConfigFile {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Resolved catalog configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Folder holding the database and the `static/` media tree
    pub root_folder: PathBuf,
    /// Database file name, relative to the root folder
    pub database_file: String,
}

impl CatalogConfig {
    pub fn new(root_folder: impl Into<PathBuf>) -> Self {
        Self {
            root_folder: root_folder.into(),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }

    /// Full path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(&self.database_file)
    }
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`CMM_ROOT`)
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    env_var: String,
    config_file: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self {
            cli_arg,
            env_var: ROOT_ENV_VAR.to_string(),
            config_file: default_config_file(),
        }
    }

    /// Use an explicit config file instead of the platform default
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    /// Resolve the full catalog configuration
    pub fn resolve(&self) -> CatalogConfig {
        let file = self.load_config_file();

        let root_folder = if let Some(path) = &self.cli_arg {
            path.clone()
        } else if let Ok(path) = std::env::var(&self.env_var) {
            PathBuf::from(path)
        } else if let Some(path) = file.root_folder.clone() {
            path
        } else {
            default_root_folder()
        };

        let mut config = CatalogConfig::new(root_folder);
        if let Some(name) = file.database_file {
            config.database_file = name;
        }
        debug!("Resolved root folder: {}", config.root_folder.display());
        config
    }

    fn load_config_file(&self) -> ConfigFile {
        let Some(path) = &self.config_file else {
            return ConfigFile::default();
        };
        if !path.exists() {
            return ConfigFile::default();
        }
        match ConfigFile::load(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                ConfigFile::default()
            }
        }
    }
}

/// Creates the root folder and the media tree below it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    config: CatalogConfig,
}

impl RootFolderInitializer {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        let root = &self.config.root_folder;
        std::fs::create_dir_all(root)?;
        std::fs::create_dir_all(root.join("static").join("music"))?;
        std::fs::create_dir_all(root.join("static").join("covers"))?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path()
    }
}

/// Platform config file location
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if cfg!(target_os = "linux") {
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        return Some(PathBuf::from("/etc/cmm/config.toml"));
    }
    user_config
}

/// Per-user data folder for the catalog
///
/// `dirs` already picks the platform location (XDG data dir, Application
/// Support, LOCALAPPDATA); without one the catalog lives next to the binary.
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(format!("./{}_data", APP_DIR)))
}
