use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_TITLE: &str = "My Personal Schedule";

/// User preferences and cloud sync credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub app_title: String,
    pub sync_token: Option<String>,
    /// Remote document the data set is synced to, once one exists
    pub remote_document_id: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_title: DEFAULT_APP_TITLE.to_string(),
            sync_token: None,
            remote_document_id: None,
            last_sync: None,
        }
    }
}

impl AppSettings {
    pub fn sync_enabled(&self) -> bool {
        self.sync_token.is_some()
    }
}
