//! # Domain Module
//!
//! Business logic of the schedule logger, independent of storage and transport.
//!
//! ## Module Organization
//!
//! - **civil_time**: fixed-offset wall clock to stored instant and back
//! - **recurrence**: expands one recurring definition into a dated series
//! - **duration**: duration form values, stored minutes and display strings
//! - **activity_store**: activities, categories and the active filter
//! - **calendar**: 42-cell month projection and calendar navigation
//! - **holiday_cache**: per-year public holidays with a built-in fallback
//! - **settings_service**: app title and sync credentials
//! - **sync_service**: whole-data-set upload and download to a cloud document
//!
//! ## Business Rules
//!
//! - All wall-clock input is read at UTC+8 and stored as a UTC instant
//! - Recurring series step on the wall clock and roll over like a lenient calendar
//! - Deleting a category deletes every activity in it
//! - A mutation is persisted before it becomes visible in memory

pub mod activity_store;
pub mod calendar;
pub mod civil_time;
pub mod duration;
pub mod error;
pub mod holiday_cache;
pub mod models;
pub mod recurrence;
pub mod settings_service;
pub mod sync_service;

pub use activity_store::{ActivityPatch, ActivityStore, CategoryFilter, CategoryRemoval};
pub use calendar::CalendarService;
pub use error::{ScheduleError, ScheduleResult};
pub use holiday_cache::HolidayCache;
pub use settings_service::SettingsService;
pub use sync_service::{SyncService, SyncStatus};
