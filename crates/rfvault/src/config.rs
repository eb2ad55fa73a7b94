//! Configuration management for rfvault.
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

use crate::archive::Limits;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rfvault";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "signals.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RFVAULT_`)
/// 2. TOML config file at `~/.config/rfvault/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Archive capacity and retention configuration.
    pub archive: ArchiveConfig,
    /// Capture loop configuration.
    pub capture: CaptureConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rfvault/signals.db`
    pub database_path: Option<PathBuf>,
}

/// Archive capacity and retention configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Hard capacity of the signal archive.
    pub max_signals: usize,
    /// Soft watermark at which automatic eviction starts.
    pub cleanup_threshold: usize,
    /// Default age threshold for the purge operation, in days.
    pub purge_max_age_days: u64,
}

/// Capture-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Interval between transceiver polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_signals: Limits::DEFAULT_MAX_SIGNALS,
            cleanup_threshold: Limits::DEFAULT_CLEANUP_THRESHOLD,
            purge_max_age_days: 7,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `RFVAULT_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("RFVAULT_").split("_"));

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
        if self.archive.max_signals == 0 {
            return Err(Error::ConfigValidation {
                message: "max_signals must be greater than 0".to_string(),
            });
        }

        if self.archive.cleanup_threshold == 0
            || self.archive.cleanup_threshold > self.archive.max_signals
        {
            return Err(Error::ConfigValidation {
                message: format!(
                    "cleanup_threshold ({}) must be between 1 and max_signals ({})",
                    self.archive.cleanup_threshold, self.archive.max_signals
                ),
            });
        }

        if self.capture.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
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

    /// Get the archive capacity bounds.
    #[must_use]
    pub fn limits(&self) -> Limits {
        Limits {
            max_signals: self.archive.max_signals,
            cleanup_threshold: self.archive.cleanup_threshold,
        }
    }

    /// Get the default purge age as a Duration.
    #[must_use]
    pub fn purge_max_age(&self) -> Duration {
        Duration::from_secs(self.archive.purge_max_age_days * 24 * 60 * 60)
    }

    /// Get the transceiver poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.capture.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.archive.max_signals, 1000);
        assert_eq!(config.archive.cleanup_threshold, 950);
        assert_eq!(config.archive.purge_max_age_days, 7);
        assert_eq!(config.capture.poll_interval_ms, 10);
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_signals() {
        let mut config = Config::default();
        config.archive.max_signals = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("max_signals"));
    }

    #[test]
    fn test_validate_threshold_above_max() {
        let mut config = Config::default();
        config.archive.max_signals = 100;
        config.archive.cleanup_threshold = 200;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("cleanup_threshold"));
    }

    #[test]
    fn test_validate_zero_threshold() {
        let mut config = Config::default();
        config.archive.cleanup_threshold = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.capture.poll_interval_ms = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("signals.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_limits_from_config() {
        let mut config = Config::default();
        config.archive.max_signals = 100;
        config.archive.cleanup_threshold = 90;

        let limits = config.limits();
        assert_eq!(limits.max_signals, 100);
        assert_eq!(limits.cleanup_threshold, 90);
        assert_eq!(limits.evict_quota(), 20);
    }

    #[test]
    fn test_purge_max_age() {
        let config = Config::default();
        assert_eq!(config.purge_max_age(), Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn test_poll_interval() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("rfvault"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("rfvault"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_archive_config_deserialize() {
        let json = r#"{"max_signals": 500, "cleanup_threshold": 400}"#;
        let archive: ArchiveConfig = serde_json::from_str(json).unwrap();
        assert_eq!(archive.max_signals, 500);
        assert_eq!(archive.cleanup_threshold, 400);
        // Unset fields fall back to defaults
        assert_eq!(archive.purge_max_age_days, 7);
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("max_signals"));
        assert!(json.contains("poll_interval_ms"));
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }
}
