//! # YAML Settings Repository
//!
//! App title and sync credentials in `settings.yaml`:
//!
//! ```yaml
//! app_title: My Personal Schedule
//! sync_token: ghp_...
//! remote_document_id: 8f2c...
//! last_sync: 2025-03-10T02:00:00Z
//! ```

use anyhow::{Context, Result};
use log::{debug, info};

use super::connection::JsonConnection;
use crate::backend::domain::models::settings::AppSettings;
use crate::backend::storage::traits::SettingsStorage;

pub const SETTINGS_FILE: &str = "settings.yaml";

#[derive(Clone)]
pub struct SettingsRepository {
    connection: JsonConnection,
}

impl SettingsRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl SettingsStorage for SettingsRepository {
    fn load_settings(&self) -> Result<AppSettings> {
        match self.connection.read_if_exists(SETTINGS_FILE)? {
            Some(contents) => {
                let settings: AppSettings = serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {SETTINGS_FILE}"))?;
                debug!("Loaded settings from {}", SETTINGS_FILE);
                Ok(settings)
            }
            None => {
                info!("No {} yet, using default settings", SETTINGS_FILE);
                Ok(AppSettings::default())
            }
        }
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let contents = serde_yaml::to_string(settings)?;
        self.connection.write_atomic(SETTINGS_FILE, &contents)
    }
}
