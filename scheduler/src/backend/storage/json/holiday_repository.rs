//! # JSON Holiday Repository
//!
//! Cached public holidays in `holidays.json`, keyed by year:
//!
//! ```json
//! { "2025": [ { "date": "2025-01-01", "name": "New Year's Day", "localName": "元旦" } ] }
//! ```

use anyhow::{Context, Result};
use log::debug;

use super::connection::JsonConnection;
use crate::backend::storage::traits::{HolidayStorage, HolidayTable};

pub const HOLIDAYS_FILE: &str = "holidays.json";

#[derive(Clone)]
pub struct HolidayRepository {
    connection: JsonConnection,
}

impl HolidayRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl HolidayStorage for HolidayRepository {
    fn load_holidays(&self) -> Result<HolidayTable> {
        match self.connection.read_if_exists(HOLIDAYS_FILE)? {
            Some(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {HOLIDAYS_FILE}")),
            None => Ok(HolidayTable::new()),
        }
    }

    fn save_holidays(&self, holidays: &HolidayTable) -> Result<()> {
        let contents = serde_json::to_string_pretty(holidays)?;
        self.connection.write_atomic(HOLIDAYS_FILE, &contents)?;
        debug!("Saved holidays for {} years", holidays.len());
        Ok(())
    }

    fn clear_holidays(&self) -> Result<()> {
        self.connection.remove_if_exists(HOLIDAYS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::holiday_cache::fallback_holidays;
    use crate::backend::storage::json::test_utils::TestEnvironment;

    #[test]
    fn test_round_trip_and_clear() {
        let env = TestEnvironment::new().unwrap();
        let repo = HolidayRepository::new(env.connection.clone());
        assert!(repo.load_holidays().unwrap().is_empty());

        let mut table = HolidayTable::new();
        table.insert(2025, fallback_holidays(2025));
        table.insert(2026, fallback_holidays(2026));
        repo.save_holidays(&table).unwrap();

        let raw = std::fs::read_to_string(env.base_directory().join(HOLIDAYS_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["2025"][0]["localName"], "元旦");

        assert_eq!(repo.load_holidays().unwrap(), table);

        repo.clear_holidays().unwrap();
        assert!(!env.base_directory().join(HOLIDAYS_FILE).exists());
        assert!(repo.load_holidays().unwrap().is_empty());
    }
}
