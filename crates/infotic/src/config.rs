//! Configuration management for infotic.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "infotic";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "local_storage.db";

/// Storage key holding the evidence ledger.
pub const DEFAULT_LEDGER_KEY: &str = "infotic_evidences";

/// Browsers commonly cap local storage at 5 MiB per origin.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `INFOTIC_`)
/// 2. TOML config file at `~/.config/infotic/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Capture configuration.
    pub capture: CaptureConfig,
    /// Session configuration.
    pub session: SessionConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file backing the key-value store.
    /// Defaults to `~/.local/share/infotic/local_storage.db`
    pub database_path: Option<PathBuf>,
    /// Key under which the ledger is stored.
    pub ledger_key: String,
    /// Maximum bytes the store may hold (keys plus values).
    /// Set to 0 for unlimited.
    pub quota_bytes: usize,
}

/// Capture-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Simulated upload latency before the record is saved, in milliseconds.
    pub submit_delay_ms: u64,
    /// How long to wait for a position fix, in milliseconds.
    pub geolocation_timeout_ms: u64,
}

/// Session-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulated verification latency on login, in milliseconds.
    pub login_delay_ms: u64,
    /// Inspector used when none is given on the command line.
    pub default_inspector: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            ledger_key: DEFAULT_LEDGER_KEY.to_string(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: 2100,
            geolocation_timeout_ms: 10_000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: 800,
            default_inspector: "inspector01".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Sources are applied in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file at `config_path`, or the default path (if exists)
    /// 3. Environment variables (prefixed with `INFOTIC_`, `__` between
    ///    section and key)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("INFOTIC_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.ledger_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "ledger_key must not be empty".to_string(),
            });
        }

        if self.capture.geolocation_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "geolocation_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.session.default_inspector.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "default_inspector must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the store quota, or `None` when unlimited.
    #[must_use]
    pub fn quota(&self) -> Option<usize> {
        if self.storage.quota_bytes == 0 {
            None
        } else {
            Some(self.storage.quota_bytes)
        }
    }

    /// Get the simulated submit delay as a Duration.
    #[must_use]
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.capture.submit_delay_ms)
    }

    /// Get the geolocation timeout as a Duration.
    #[must_use]
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.capture.geolocation_timeout_ms)
    }

    /// Get the simulated login delay as a Duration.
    #[must_use]
    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.session.login_delay_ms)
    }
}
