//! Civil-time codec.
//!
//! All wall-clock input is read in one fixed civil offset (UTC+8, no daylight
//! saving) and stored as a UTC instant. Conversions are constant-offset shifts
//! over proleptic Gregorian arithmetic, so converting a stored instant back to
//! civil time always reproduces the original wall-clock value.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use super::error::{ScheduleError, ScheduleResult};

/// Fixed civil offset east of UTC, in minutes
pub const CIVIL_OFFSET_MINUTES: i64 = 8 * 60;

/// Form-input layout for civil date-times
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const INPUT_FORMAT_WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// A wall-clock date and time as read in the civil offset, at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDateTime(NaiveDateTime);

impl CivilDateTime {
    /// Build a civil value, letting out-of-range components roll over the way
    /// a lenient calendar does: month 13 is January of the next year, day 0 is
    /// the last day of the previous month, minute 60 is the next hour.
    pub fn lenient(year: i64, month: i64, day: i64, hour: i64, minute: i64) -> ScheduleResult<Self> {
        let out_of_range = || {
            ScheduleError::validation(format!(
                "Date {year}-{month}-{day} {hour}:{minute} is outside the supported range"
            ))
        };

        let total_months = year
            .checked_mul(12)
            .and_then(|months| months.checked_add(month - 1))
            .ok_or_else(out_of_range)?;
        let normalized_year = i32::try_from(total_months.div_euclid(12)).map_err(|_| out_of_range())?;
        let normalized_month = u32::try_from(total_months.rem_euclid(12) + 1).map_err(|_| out_of_range())?;

        let first_of_month = NaiveDate::from_ymd_opt(normalized_year, normalized_month, 1)
            .ok_or_else(out_of_range)?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(out_of_range)?;

        let shifted = Duration::try_days(day - 1)
            .zip(Duration::try_hours(hour))
            .zip(Duration::try_minutes(minute))
            .and_then(|((days, hours), minutes)| {
                first_of_month
                    .checked_add_signed(days)?
                    .checked_add_signed(hours)?
                    .checked_add_signed(minutes)
            })
            .ok_or_else(out_of_range)?;

        Ok(Self(shifted))
    }

    /// Build a civil value from components that must already form a valid date and time
    pub fn from_components(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .map(Self)
    }

    /// Parse form input in `YYYY-MM-DDTHH:MM` layout (seconds are accepted and dropped)
    pub fn parse_input(input: &str) -> ScheduleResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::validation("Date and time are required"));
        }

        NaiveDateTime::parse_from_str(trimmed, INPUT_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, INPUT_FORMAT_WITH_SECONDS))
            .map(|parsed| Self(truncate_to_minute(parsed)))
            .map_err(|_| {
                ScheduleError::validation(format!(
                    "Invalid date and time '{trimmed}', expected YYYY-MM-DDTHH:MM"
                ))
            })
    }

    /// Render in the same layout `parse_input` accepts
    pub fn to_input_value(&self) -> String {
        self.0.format(INPUT_FORMAT).to_string()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// `(year, month, day, hour, minute)`
    pub fn components(&self) -> (i32, u32, u32, u32, u32) {
        (self.year(), self.month(), self.day(), self.hour(), self.minute())
    }

    /// Civil calendar date of this wall-clock value
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value.with_second(0).and_then(|v| v.with_nanosecond(0)).unwrap_or(value)
}

/// Convert a civil wall-clock reading into the stored UTC instant
pub fn to_stored_instant(civil: CivilDateTime) -> ScheduleResult<DateTime<Utc>> {
    civil
        .0
        .checked_sub_signed(Duration::minutes(CIVIL_OFFSET_MINUTES))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ScheduleError::validation("Date is outside the supported range"))
}

/// Component form of [`to_stored_instant`]; components roll over leniently
pub fn to_stored_instant_from_parts(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
) -> ScheduleResult<DateTime<Utc>> {
    to_stored_instant(CivilDateTime::lenient(year, month, day, hour, minute)?)
}

/// Convert a stored instant back into civil wall-clock time.
///
/// Any sub-minute part of the instant is dropped.
pub fn to_civil(instant: DateTime<Utc>) -> CivilDateTime {
    let shifted = instant
        .naive_utc()
        .checked_add_signed(Duration::minutes(CIVIL_OFFSET_MINUTES))
        .unwrap_or_else(|| instant.naive_utc());
    CivilDateTime(truncate_to_minute(shifted))
}

/// Today's date on the civil calendar
pub fn today() -> NaiveDate {
    to_civil(Utc::now()).date()
}

/// Long display form in civil time, e.g. "Mon, Mar 10, 2025, 10:00 AM"
pub fn format_display(instant: DateTime<Utc>) -> String {
    to_civil(instant).naive().format("%a, %b %-d, %Y, %I:%M %p").to_string()
}

/// Time-of-day display form in civil time, e.g. "10:00 AM"
pub fn format_time(instant: DateTime<Utc>) -> String {
    to_civil(instant).naive().format("%I:%M %p").to_string()
}

/// Date key used for comparisons and holiday lookups ("YYYY-MM-DD")
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
