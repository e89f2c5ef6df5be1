// Configuration: where tasks live and which backend holds them

use crate::file::FileStorage;
use crate::sqlite::SqliteStorage;
use crate::storage::KeyValueStorage;
use crate::store::DEFAULT_SLOT_KEY;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "dailytasks";
const CONFIG_FILE: &str = "config.yaml";
const SQLITE_FILE: &str = "settings.db";

/// Storage backend for the task slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One SQLite settings database
    #[default]
    Sqlite,
    /// One JSON file per slot
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub slot_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().unwrap_or_default(),
            backend: Backend::default(),
            slot_key: DEFAULT_SLOT_KEY.to_string(),
        }
    }
}

fn default_data_dir() -> Option<PathBuf> {
    data_dir_from(dirs::data_local_dir(), dirs::home_dir())
}

/// Per-user data directory, falling back to `~/.local/share`.
///
/// `None` when neither is known; the config then carries an empty
/// `data_dir` and [`Config::open_storage`] refuses it.
fn data_dir_from(data_local: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    data_local
        .or_else(|| home.map(|h| h.join(".local").join("share")))
        .map(|dir| dir.join(APP_DIR))
}

/// Default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl Config {
    /// Load from a YAML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Path of the SQLite database for [`Backend::Sqlite`]
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE)
    }

    /// Open the configured backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStorage>> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(eyre!(
                "No data directory: set data_dir in the config file or pass --data-dir"
            ));
        }

        let storage: Box<dyn KeyValueStorage> = match self.backend {
            Backend::Sqlite => Box::new(
                SqliteStorage::open(self.sqlite_path())
                    .with_context(|| format!("Failed to open database {}", self.sqlite_path().display()))?,
            ),
            Backend::File => Box::new(
                FileStorage::open(&self.data_dir)
                    .with_context(|| format!("Failed to open storage directory {}", self.data_dir.display()))?,
            ),
        };
        Ok(storage)
    }
}
