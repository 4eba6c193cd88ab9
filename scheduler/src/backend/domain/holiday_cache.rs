//! Holiday cache.
//!
//! Holidays are cached a whole year at a time. A year missing from the cache
//! is fetched from the [`HolidaySource`]; when that fails for any reason the
//! year is filled from a built-in table instead, so a calendar never waits on
//! or fails because of the holiday service.

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::civil_time;
use super::error::{ScheduleError, ScheduleResult};
use super::models::holiday::Holiday;
use crate::backend::storage::{HolidaySource, HolidayStorage, HolidayTable};

/// Year the precise fallback table was published for
pub const REFERENCE_YEAR: i32 = 2025;

/// Hong Kong general holidays of the reference year, as gazetted
const REFERENCE_YEAR_HOLIDAYS: [(u32, u32, &str, &str); 17] = [
    (1, 1, "New Year's Day", "元旦"),
    (1, 29, "Lunar New Year's Day", "農曆年初一"),
    (1, 30, "The second day of Lunar New Year", "農曆年初二"),
    (1, 31, "The third day of Lunar New Year", "農曆年初三"),
    (4, 4, "Ching Ming Festival", "清明節"),
    (4, 18, "Good Friday", "耶穌受難節"),
    (4, 19, "The day following Good Friday", "耶穌受難節翌日"),
    (4, 21, "Easter Monday", "復活節星期一"),
    (5, 1, "Labour Day", "勞動節"),
    (5, 5, "Buddha's Birthday", "佛誕"),
    (5, 31, "Tuen Ng Festival", "端午節"),
    (7, 1, "HKSAR Establishment Day", "香港特別行政區成立紀念日"),
    (10, 1, "National Day", "國慶日"),
    (10, 7, "The day following Mid-Autumn Festival", "中秋節翌日"),
    (10, 29, "Chung Yeung Festival", "重陽節"),
    (12, 25, "Christmas Day", "聖誕節"),
    (12, 26, "Boxing Day", "節禮日"),
];

/// Approximate dates used for any other year; lunar holidays drift
const GENERIC_HOLIDAYS: [(u32, u32, &str, &str); 12] = [
    (1, 1, "New Year's Day", "元旦"),
    (4, 4, "Ching Ming Festival", "清明節"),
    (4, 29, "Good Friday", "耶穌受難節"),
    (5, 1, "Labour Day", "勞動節"),
    (5, 8, "Buddha's Birthday", "佛誕"),
    (6, 22, "Dragon Boat Festival", "端午節"),
    (7, 1, "HKSAR Establishment Day", "香港特別行政區成立紀念日"),
    (9, 29, "Mid-Autumn Festival", "中秋節"),
    (10, 1, "National Day", "國慶日"),
    (10, 23, "Chung Yeung Festival", "重陽節"),
    (12, 25, "Christmas Day", "聖誕節"),
    (12, 26, "Boxing Day", "節禮日"),
];

/// Built-in holidays for `year`
pub fn fallback_holidays(year: i32) -> Vec<Holiday> {
    let table: &[(u32, u32, &str, &str)] = if year == REFERENCE_YEAR {
        &REFERENCE_YEAR_HOLIDAYS
    } else {
        &GENERIC_HOLIDAYS
    };

    table
        .iter()
        .filter_map(|(month, day, name, local_name)| {
            NaiveDate::from_ymd_opt(year, *month, *day).map(|date| Holiday::new(date, name, local_name))
        })
        .collect()
}

#[derive(Clone)]
pub struct HolidayCache {
    source: Arc<dyn HolidaySource>,
    storage: Arc<dyn HolidayStorage>,
    years: Arc<Mutex<HolidayTable>>,
}

impl HolidayCache {
    /// Start from whatever years were persisted earlier
    pub fn load(source: Arc<dyn HolidaySource>, storage: Arc<dyn HolidayStorage>) -> ScheduleResult<Self> {
        let years = storage.load_holidays()?;
        info!("Loaded cached holidays for {} years", years.len());
        Ok(Self {
            source,
            storage,
            years: Arc::new(Mutex::new(years)),
        })
    }

    fn lock(&self) -> ScheduleResult<MutexGuard<'_, HolidayTable>> {
        self.years
            .lock()
            .map_err(|_| ScheduleError::Storage(anyhow!("Holiday cache lock poisoned")))
    }

    pub fn is_cached(&self, year: i32) -> ScheduleResult<bool> {
        Ok(self.lock()?.contains_key(&year))
    }

    /// Make sure `year` is cached and return its holidays.
    ///
    /// The fetch runs without holding the cache lock. When two fetches for the
    /// same year race, the one that resolves last is kept.
    pub async fn ensure_year(&self, year: i32) -> ScheduleResult<Vec<Holiday>> {
        let cached = self.lock()?.get(&year).cloned();
        if let Some(holidays) = cached {
            return Ok(holidays);
        }

        let holidays = match self.source.fetch_year(year).await {
            Ok(holidays) => {
                info!("Fetched {} holidays for {}", holidays.len(), year);
                holidays
            }
            Err(e) => {
                warn!("Could not fetch holidays for {}, using built-in table: {:#}", year, e);
                fallback_holidays(year)
            }
        };

        let mut years = self.lock()?;
        years.insert(year, holidays.clone());
        if let Err(e) = self.storage.save_holidays(&years) {
            warn!("Failed to persist holidays for {}: {:#}", year, e);
        }
        Ok(holidays)
    }

    /// Cached holidays of `years`, waiting at most `wait` for years not cached yet.
    ///
    /// Missing years are fetched concurrently on spawned tasks. A task still
    /// running when the wait ends keeps going and fills the cache for a later
    /// call; this call returns whatever is cached by then.
    pub async fn holidays_within(
        &self,
        years: RangeInclusive<i32>,
        wait: Duration,
    ) -> ScheduleResult<Vec<Holiday>> {
        let mut pending = Vec::new();
        for year in years.clone() {
            if self.is_cached(year)? {
                continue;
            }
            let cache = self.clone();
            pending.push(tokio::spawn(async move {
                if let Err(e) = cache.ensure_year(year).await {
                    warn!("Could not load holidays for {}: {}", year, e);
                }
            }));
        }

        if !pending.is_empty() {
            let all_loaded = async {
                for handle in pending {
                    if let Err(e) = handle.await {
                        warn!("Holiday fetch task failed: {}", e);
                    }
                }
            };
            if tokio::time::timeout(wait, all_loaded).await.is_err() {
                debug!("Holiday fetch still running after {:?}, using cached years", wait);
            }
        }

        let mut holidays = Vec::new();
        for year in years {
            holidays.extend(self.holidays_for_year(year)?);
        }
        Ok(holidays)
    }

    /// Cache the current and the next civil year
    pub async fn preload(&self) -> ScheduleResult<()> {
        let current_year = civil_time::today().year();
        for year in [current_year, current_year + 1] {
            self.ensure_year(year).await?;
        }
        Ok(())
    }

    /// Holiday on `date`, if its year is cached and a holiday matches exactly
    pub fn lookup(&self, date: NaiveDate) -> ScheduleResult<Option<Holiday>> {
        let years = self.lock()?;
        Ok(years
            .get(&date.year())
            .and_then(|holidays| holidays.iter().find(|holiday| holiday.date == date))
            .cloned())
    }

    /// Cached holidays of `year`; empty when the year is not cached
    pub fn holidays_for_year(&self, year: i32) -> ScheduleResult<Vec<Holiday>> {
        Ok(self.lock()?.get(&year).cloned().unwrap_or_default())
    }

    /// Drop every cached year, in memory and on disk
    pub fn invalidate(&self) -> ScheduleResult<()> {
        let mut years = self.lock()?;
        self.storage.clear_holidays()?;
        years.clear();
        info!("Holiday cache cleared");
        Ok(())
    }
}
