use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::messages::MessageCatalog;

pub mod messages;

const CONFIG_ENV: &str = "BRANDPICK_CONFIG";
const DATA_ENV: &str = "BRANDPICK_DATA";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_DATABASE_FILE: &str = "drafts.db";

/// Explicit locations that take precedence over the environment and the
/// platform defaults.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    /// A config file, or a directory that holds `config.toml`.
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl PathOverrides {
    /// Fills unset fields from `BRANDPICK_CONFIG` and `BRANDPICK_DATA`.
    pub fn with_env(mut self) -> Self {
        self.config = self.config.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        self.data_dir = self.data_dir.or_else(|| env::var_os(DATA_ENV).map(PathBuf::from));
        self
    }
}

/// Where the config file and draft database live.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover(overrides: PathOverrides) -> Result<Self> {
        let overrides = overrides.with_env();
        let project = ProjectDirs::from("io", "BrandingPicker", "brandpick");

        let config_file = match overrides.config {
            Some(path) if path.is_dir() || path.extension().is_none() => {
                path.join(CONFIG_FILE_NAME)
            }
            Some(path) => path,
            None => project
                .as_ref()
                .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
                .context("no home directory; pass --config")?,
        };
        let data_dir = match overrides.data_dir {
            Some(path) => path,
            None => project
                .as_ref()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .context("no home directory; pass --data-dir")?,
        };

        Ok(Self {
            config_file,
            data_dir,
        })
    }

    /// Lays every path out under one root.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config_file: root.join(CONFIG_FILE_NAME),
            data_dir: root.join("data"),
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        let config_dir = self.config_file.parent().filter(|p| !p.as_os_str().is_empty());
        for dir in config_dir.into_iter().chain([self.data_dir.as_path()]) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }
        Ok(())
    }
}

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover(overrides: PathOverrides) -> Result<Self> {
        Ok(Self::from_paths(ConfigPaths::discover(overrides)?))
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Loads the config file, writing one with the defaults first if none
    /// exists yet.
    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let defaults = AppConfig::default();
            let body = toml::to_string_pretty(&defaults).context("serializing default config")?;
            fs::write(&self.paths.config_file, body).with_context(|| {
                format!("writing default config {}", self.paths.config_file.display())
            })?;
            tracing::info!(path = %self.paths.config_file.display(), "wrote default config");
            return Ok(defaults.resolved(&self.paths));
        }
        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let path = &self.paths.config_file;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.resolved(&self.paths))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageOptions,
    /// Per-key overrides for the displayed strings, e.g. `Vote = "Submit"`.
    pub messages: IndexMap<String, String>,
}

impl AppConfig {
    fn resolved(mut self, paths: &ConfigPaths) -> Self {
        self.storage.database_path = paths.data_dir.join(&self.storage.database_file);
        self
    }

    pub fn message_catalog(&self) -> MessageCatalog {
        MessageCatalog::with_overrides(&self.messages)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Database file; relative paths are taken from the data directory.
    pub database_file: PathBuf,
    pub wal_autocheckpoint: u32,
    #[serde(skip)]
    pub database_path: PathBuf,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from(DEFAULT_DATABASE_FILE),
            wal_autocheckpoint: 1000,
            database_path: PathBuf::new(),
        }
    }
}
