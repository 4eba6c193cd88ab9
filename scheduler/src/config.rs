//! Runtime configuration.
//!
//! Read from `config.yaml` when one exists, then overridden by `SCHEDULE_*`
//! environment variables. Every field has a default so an empty or missing
//! file is fine.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::storage::remote::{DEFAULT_GIST_API_BASE, DEFAULT_HOLIDAY_API_BASE};

pub const CONFIG_FILE: &str = "config.yaml";
pub const DATA_DIR_NAME: &str = "Schedule Logger";

const ENV_DATA_DIR: &str = "SCHEDULE_DATA_DIR";
const ENV_BIND_ADDR: &str = "SCHEDULE_BIND_ADDR";
const ENV_HOLIDAY_API: &str = "SCHEDULE_HOLIDAY_API";
const ENV_CLOUD_API: &str = "SCHEDULE_CLOUD_API";
const ENV_AUTO_SYNC_MINUTES: &str = "SCHEDULE_AUTO_SYNC_MINUTES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub holiday_api_base: String,
    pub cloud_api_base: String,
    /// Zero turns periodic upload off
    pub auto_sync_minutes: u64,
    pub cors_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind_addr: "127.0.0.1:3000".to_string(),
            holiday_api_base: DEFAULT_HOLIDAY_API_BASE.to_string(),
            cloud_api_base: DEFAULT_GIST_API_BASE.to_string(),
            auto_sync_minutes: 5,
            cors_origin: "http://localhost:8080".to_string(),
        }
    }
}

/// `<platform data dir>/Schedule Logger`, or a relative directory when the
/// platform has none
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}

impl AppConfig {
    /// Load `path` if it exists and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Self::from_yaml(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).context("Failed to parse configuration")
    }

    /// Overwrite fields with whatever `lookup` returns for the `SCHEDULE_*` keys
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        if let Some(base) = lookup(ENV_HOLIDAY_API) {
            self.holiday_api_base = base;
        }
        if let Some(base) = lookup(ENV_CLOUD_API) {
            self.cloud_api_base = base;
        }
        if let Some(minutes) = lookup(ENV_AUTO_SYNC_MINUTES) {
            self.auto_sync_minutes = minutes
                .trim()
                .parse()
                .with_context(|| format!("{ENV_AUTO_SYNC_MINUTES} must be a whole number, got '{minutes}'"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("bind_addr: 0.0.0.0:9000\nauto_sync_minutes: 0\n").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.auto_sync_minutes, 0);
        assert_eq!(config.holiday_api_base, "https://date.nager.at");
        assert_eq!(config.cloud_api_base, "https://api.github.com");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SCHEDULE_DATA_DIR", "/tmp/schedule"),
            ("SCHEDULE_AUTO_SYNC_MINUTES", "15"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/schedule"));
        assert_eq!(config.auto_sync_minutes, 15);
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_bad_minutes_override() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "SCHEDULE_AUTO_SYNC_MINUTES").then(|| "often".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.cors_origin, "http://localhost:8080");
    }
}
