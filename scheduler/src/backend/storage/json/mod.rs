//! # File Storage
//!
//! Local persistence in the data directory. Every file is rewritten whole
//! through a temp file and a rename.
//!
//! ```text
//! data/
//! ├── schedule.json    activities and categories
//! ├── holidays.json    holiday cache by year
//! └── settings.yaml    app title and sync credentials
//! ```

pub mod connection;
pub mod holiday_repository;
pub mod schedule_repository;
pub mod settings_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use holiday_repository::HolidayRepository;
pub use schedule_repository::ScheduleRepository;
pub use settings_repository::SettingsRepository;
