//! Store configuration loaded from TOML
//!
//! ```toml
//! [database]
//! url = "sqlite://logs.db"
//! user = ""
//! max_connect_attempts = 3
//! reconnect_wait_ms = 100
//!
//! [logging]
//! profile = "development"
//! ```
//!
//! Every field is optional.

use crate::connection::ConnectionParams;
use adamsdb_core::errors::{ExError, ExErrorKind};
use adamsdb_core::logging_facility::Profile;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite://adamsdb.db";

/// Errors raised while reading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for ExError {
    fn from(err: ConfigError) -> Self {
        let kind = match &err {
            ConfigError::Io { .. } => ExErrorKind::Io,
            ConfigError::Parse(_) | ConfigError::Invalid(_) => ExErrorKind::Config,
        };
        let base = ExError::new(kind)
            .with_op("load_config")
            .with_message(err.to_string());
        match &err {
            ConfigError::Io { path, .. } => base.with_entity_id(path.display().to_string()),
            _ => base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub user: String,
    pub max_connect_attempts: u32,
    pub reconnect_wait_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DB_URL.to_string(),
            user: String::new(),
            max_connect_attempts: 3,
            reconnect_wait_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl StoreConfig {
    /// Read and validate a TOML file
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` when the file cannot be read, `Parse` or `Invalid`
    /// for bad content.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), url = %config.database.url, "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".to_string()));
        }
        if self.database.max_connect_attempts == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connect_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the database URL (command-line override)
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.database.url = url.into();
        self
    }

    pub fn to_params(&self) -> ConnectionParams {
        ConnectionParams::new(self.database.url.clone())
            .with_user(self.database.user.clone())
            .with_max_connect_attempts(self.database.max_connect_attempts)
            .with_reconnect_wait(Duration::from_millis(self.database.reconnect_wait_ms))
    }
}
