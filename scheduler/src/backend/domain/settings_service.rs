use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::info;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::{ScheduleError, ScheduleResult};
use super::models::settings::AppSettings;
use crate::backend::storage::SettingsStorage;

/// App title and sync credentials, persisted on every change
#[derive(Clone)]
pub struct SettingsService {
    storage: Arc<dyn SettingsStorage>,
    settings: Arc<Mutex<AppSettings>>,
}

impl SettingsService {
    pub fn load(storage: Arc<dyn SettingsStorage>) -> ScheduleResult<Self> {
        let settings = storage.load_settings()?;
        info!(
            "Loaded settings for '{}' (sync {})",
            settings.app_title,
            if settings.sync_enabled() { "enabled" } else { "disabled" }
        );
        Ok(Self {
            storage,
            settings: Arc::new(Mutex::new(settings)),
        })
    }

    fn lock(&self) -> ScheduleResult<MutexGuard<'_, AppSettings>> {
        self.settings
            .lock()
            .map_err(|_| ScheduleError::Storage(anyhow!("Settings lock poisoned")))
    }

    fn update(&self, change: impl FnOnce(&mut AppSettings)) -> ScheduleResult<AppSettings> {
        let mut settings = self.lock()?;
        let mut working = settings.clone();
        change(&mut working);
        self.storage.save_settings(&working)?;
        *settings = working.clone();
        Ok(working)
    }

    pub fn settings(&self) -> ScheduleResult<AppSettings> {
        Ok(self.lock()?.clone())
    }

    pub fn app_title(&self) -> ScheduleResult<String> {
        Ok(self.lock()?.app_title.clone())
    }

    /// Line breaks become spaces; a blank title is rejected
    pub fn set_app_title(&self, title: &str) -> ScheduleResult<String> {
        let title = title.replace(['\r', '\n'], " ");
        let title = title.trim();
        if title.is_empty() {
            return Err(ScheduleError::validation("Title cannot be empty"));
        }

        let updated = self.update(|settings| settings.app_title = title.to_string())?;
        info!("App title set to '{}'", updated.app_title);
        Ok(updated.app_title)
    }

    /// Store a validated token, forgetting any document linked to a previous one
    pub fn store_credentials(&self, token: &str) -> ScheduleResult<AppSettings> {
        self.update(|settings| {
            if settings.sync_token.as_deref() != Some(token) {
                settings.remote_document_id = None;
                settings.last_sync = None;
            }
            settings.sync_token = Some(token.to_string());
        })
    }

    pub fn link_remote_document(&self, id: &str) -> ScheduleResult<AppSettings> {
        self.update(|settings| settings.remote_document_id = Some(id.to_string()))
    }

    /// Forget a linked document that no longer exists remotely
    pub fn unlink_remote_document(&self) -> ScheduleResult<AppSettings> {
        self.update(|settings| settings.remote_document_id = None)
    }

    /// Title, link and sync time of a downloaded data set, written together
    pub fn apply_download(&self, title: &str, id: &str, at: DateTime<Utc>) -> ScheduleResult<AppSettings> {
        self.update(|settings| {
            settings.app_title = title.to_string();
            settings.remote_document_id = Some(id.to_string());
            settings.last_sync = Some(at);
        })
    }

    /// Put back settings taken earlier with [`SettingsService::settings`]
    pub fn restore(&self, previous: AppSettings) -> ScheduleResult<AppSettings> {
        self.update(|settings| *settings = previous)
    }

    pub fn record_sync(&self, at: DateTime<Utc>) -> ScheduleResult<AppSettings> {
        self.update(|settings| settings.last_sync = Some(at))
    }

    pub fn clear_credentials(&self) -> ScheduleResult<AppSettings> {
        let cleared = self.update(|settings| {
            settings.sync_token = None;
            settings.remote_document_id = None;
            settings.last_sync = None;
        })?;
        info!("Sync credentials cleared");
        Ok(cleared)
    }
}
