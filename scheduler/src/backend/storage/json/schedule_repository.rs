//! # JSON Schedule Repository
//!
//! Activities and categories live together in `schedule.json` at the root of
//! the data directory, so a save can never leave one updated without the
//! other.
//!
//! ```json
//! {
//!   "activities": [ { "id": "...", "title": "Yoga", "datetime": "2025-03-09T23:00:00+00:00", ... } ],
//!   "categories": [ { "id": "fitness", "name": "Fitness & Yoga", "color": "#28a745" } ]
//! }
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use super::connection::JsonConnection;
use crate::backend::domain::models::activity::Activity;
use crate::backend::domain::models::category::Category;
use crate::backend::storage::traits::{ScheduleSnapshot, ScheduleStorage};

pub const SCHEDULE_FILE: &str = "schedule.json";

#[derive(Serialize)]
struct ScheduleDocument<'a> {
    activities: &'a [Activity],
    categories: &'a [Category],
}

#[derive(Clone)]
pub struct ScheduleRepository {
    connection: JsonConnection,
}

impl ScheduleRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl ScheduleStorage for ScheduleRepository {
    fn load_schedule(&self) -> Result<Option<ScheduleSnapshot>> {
        let Some(contents) = self.connection.read_if_exists(SCHEDULE_FILE)? else {
            info!("No {} yet, starting with an empty schedule", SCHEDULE_FILE);
            return Ok(None);
        };

        let snapshot: ScheduleSnapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {SCHEDULE_FILE}"))?;
        debug!(
            "Loaded {} activities from {}",
            snapshot.activities.len(),
            SCHEDULE_FILE
        );
        Ok(Some(snapshot))
    }

    fn save_schedule(&self, activities: &[Activity], categories: &[Category]) -> Result<()> {
        let document = ScheduleDocument {
            activities,
            categories,
        };
        let contents = serde_json::to_string_pretty(&document)?;
        self.connection.write_atomic(SCHEDULE_FILE, &contents)
    }
}
