//! Runtime configuration.
//!
//! Everything has a default; a JSON file only needs the keys it changes.
//!
//! ```json
//! {
//!   "database_path": "/var/lib/gronckle/catalog.db",
//!   "ranking": { "max_results": 5 },
//!   "categories": { "Writing": ["essay", "blog", "grammar"] }
//! }
//! ```

use crate::catalog::Category;
use crate::error::ConfigError;
use crate::intent::CategoryTable;
use crate::ranking::RankingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under the platform config/data dirs
const APP_DIR: &str = "gronckle";

const CONFIG_FILE: &str = "config.json";

const DATABASE_FILE: &str = "catalog.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog database; defaults to the platform data dir
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub ranking: RankingConfig,

    /// Replacement trigger table. Categories left out get no triggers.
    #[serde(default)]
    pub categories: Option<BTreeMap<Category, Vec<String>>>,
}

impl Config {
    /// Load from `explicit` if given (it must exist), otherwise from the
    /// default location if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn category_table(&self) -> CategoryTable {
        match &self.categories {
            Some(map) => CategoryTable::from_map(map.clone()),
            None => CategoryTable::default(),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(DATABASE_FILE))
            .ok_or(ConfigError::NoDataDir)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
