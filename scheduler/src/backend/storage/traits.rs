//! # Storage Traits
//!
//! Persistence abstractions the domain services are written against. Local
//! repositories are synchronous and return `anyhow::Result`; remote
//! collaborators are async and report typed failures so callers can tell an
//! expired token from an unreachable server.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::backend::domain::error::ScheduleResult;
use crate::backend::domain::models::activity::Activity;
use crate::backend::domain::models::category::Category;
use crate::backend::domain::models::holiday::Holiday;
use crate::backend::domain::models::settings::AppSettings;

/// Activities and categories as they are saved together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// `None` when no categories were ever saved
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}

/// Holidays keyed by year; a year is either complete or absent
pub type HolidayTable = BTreeMap<i32, Vec<Holiday>>;

/// Activities and categories, always written as one unit
pub trait ScheduleStorage: Send + Sync {
    /// `None` when nothing has been saved yet
    fn load_schedule(&self) -> Result<Option<ScheduleSnapshot>>;

    /// Replace the saved schedule atomically
    fn save_schedule(&self, activities: &[Activity], categories: &[Category]) -> Result<()>;
}

pub trait HolidayStorage: Send + Sync {
    fn load_holidays(&self) -> Result<HolidayTable>;

    fn save_holidays(&self, holidays: &HolidayTable) -> Result<()>;

    /// Remove every persisted year
    fn clear_holidays(&self) -> Result<()>;
}

pub trait SettingsStorage: Send + Sync {
    /// Defaults when nothing has been saved yet
    fn load_settings(&self) -> Result<AppSettings>;

    fn save_settings(&self, settings: &AppSettings) -> Result<()>;
}

/// Where public holidays come from when a year is not cached
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn fetch_year(&self, year: i32) -> Result<Vec<Holiday>>;
}

/// A private remote document store used for sync.
///
/// Implementations map rejected credentials to `AuthFailure`, missing
/// documents to `RemoteNotFound` and everything else to `NetworkFailure`.
#[async_trait]
pub trait CloudDocumentStore: Send + Sync {
    /// Create a document and return its id
    async fn create(&self, token: &str, description: &str, content: &str) -> ScheduleResult<String>;

    async fn update(&self, token: &str, id: &str, content: &str) -> ScheduleResult<()>;

    async fn read(&self, token: &str, id: &str) -> ScheduleResult<String>;

    /// Ids of the caller's documents carrying `description`, newest first
    async fn list_by_description(&self, token: &str, description: &str) -> ScheduleResult<Vec<String>>;

    async fn validate_token(&self, token: &str) -> ScheduleResult<()>;
}
