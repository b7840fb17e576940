//! Store configuration.
//!
//! Values come from an optional TOML file and can be overridden by
//! `DAYBOOK_*` environment variables.

use std::{
    env,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,
    /// Pool size for file-backed databases.
    pub max_connections: u32,
    /// Default tracing filter.
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: Self::default_dir().join("daybook.db"),
            max_connections: 5,
            log_level: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// `~/.daybook`, falling back to the working directory.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".daybook"))
            .unwrap_or_else(|| PathBuf::from(".daybook"))
    }

    /// Path of the default config file.
    pub fn default_path() -> PathBuf {
        Self::default_dir().join("config.toml")
    }

    /// Loads the config file at `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: StoreConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies `DAYBOOK_DATABASE_PATH`, `DAYBOOK_MAX_CONNECTIONS` and
    /// `DAYBOOK_LOG_LEVEL`.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(path) = var("DAYBOOK_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(value) = var("DAYBOOK_MAX_CONNECTIONS") {
            self.max_connections = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "DAYBOOK_MAX_CONNECTIONS",
                value,
            })?;
        }
        if let Some(level) = var("DAYBOOK_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(self)
    }
}
