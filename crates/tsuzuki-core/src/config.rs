use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::TsuzukiError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub library: LibraryConfig,
    pub poller: PollerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Days without viewing before an entry is considered stale.
    pub stale_after_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between favorites sweeps.
    pub interval_secs: u64,
    /// Seconds slept between consecutive favorites within a sweep.
    pub politeness_delay_secs: u64,
    /// Per-source-call timeout during a refresh, in seconds.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the platform data directory for the list files.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load config: the user file if it exists, built-in defaults otherwise.
    pub fn load() -> Result<Self, TsuzukiError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)
                .map_err(|e| TsuzukiError::Config(e.to_string()))?;
            toml::from_str(&user_str).map_err(|e| TsuzukiError::Config(e.to_string()))
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| TsuzukiError::Config(e.to_string()))
        }
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), TsuzukiError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TsuzukiError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Path to the user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory holding the per-kind list files.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().join("lists"))
                .unwrap_or_else(|| PathBuf::from("lists"))
        })
    }

    /// Ensure the data directory exists and return it.
    pub fn ensure_data_dir(&self) -> Result<PathBuf, TsuzukiError> {
        let dir = self.data_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Inactivity threshold for the stale-status rule.
    pub fn stale_threshold(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.library.stale_after_days))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "tsuzuki")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.library.stale_after_days, 5);
        assert_eq!(config.poller.interval_secs, 3600);
        assert_eq!(config.poller.politeness_delay_secs, 3);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.poller.interval_secs,
            config.poller.interval_secs
        );
        assert_eq!(
            deserialized.library.stale_after_days,
            config.library.stale_after_days
        );
    }

    #[test]
    fn test_stale_threshold() {
        let config = AppConfig::default();
        assert_eq!(config.stale_threshold(), chrono::Duration::days(5));
    }
}
