//! Recurrence expander.
//!
//! A series is stepped on the civil wall clock, never on stored instants, so
//! every member keeps the time of day the user entered. Monthly steps roll
//! over natively: January 31st plus one month is "February 31st", which the
//! calendar reads as March 3rd in a common year.

use chrono::{DateTime, Utc};
use shared::RecurrenceFrequency;
use uuid::Uuid;

use super::civil_time::{self, CivilDateTime};
use super::error::{ScheduleError, ScheduleResult};
use super::models::activity::{Activity, ActivityDraft, SeriesMembership};

/// Dates shown before the preview collapses into "... and N more"
pub const PREVIEW_LIMIT: u32 = 5;

/// Most members a single series may have
pub const MAX_SERIES_COUNT: u32 = 1000;

/// Civil start of the 0-based `index`th member of a series anchored at `base`
pub fn step(base: CivilDateTime, frequency: RecurrenceFrequency, index: u32) -> ScheduleResult<CivilDateTime> {
    let (year, month, day, hour, minute) = base.components();
    let (year, month, day, hour, minute) = (
        i64::from(year),
        i64::from(month),
        i64::from(day),
        i64::from(hour),
        i64::from(minute),
    );
    let index = i64::from(index);

    match frequency {
        RecurrenceFrequency::Daily => CivilDateTime::lenient(year, month, day + index, hour, minute),
        RecurrenceFrequency::Weekly => CivilDateTime::lenient(year, month, day + 7 * index, hour, minute),
        RecurrenceFrequency::Monthly => CivilDateTime::lenient(year, month + index, day, hour, minute),
    }
}

fn validate_count(count: u32) -> ScheduleResult<()> {
    if count < 1 {
        return Err(ScheduleError::validation("Repeat count must be at least 1"));
    }
    if count > MAX_SERIES_COUNT {
        return Err(ScheduleError::validation(format!(
            "Repeat count must be at most {MAX_SERIES_COUNT}"
        )));
    }
    Ok(())
}

/// Fan a draft out into `count` activities sharing `series_id`.
///
/// Members are returned in index order, 1 through `count`.
pub fn expand(
    draft: &ActivityDraft,
    frequency: RecurrenceFrequency,
    count: u32,
    series_id: Uuid,
    created_at: DateTime<Utc>,
) -> ScheduleResult<Vec<Activity>> {
    validate_count(count)?;

    (0..count)
        .map(|offset| {
            let start = step(draft.start, frequency, offset)?;
            let series = SeriesMembership {
                id: series_id,
                index: offset + 1,
                total: count,
                frequency,
            };
            draft.instantiate(start, created_at, Some(series))
        })
        .collect()
}

/// Re-anchor an existing member onto a new series base, keeping its index
pub fn reanchor(new_base: CivilDateTime, series: &SeriesMembership) -> ScheduleResult<DateTime<Utc>> {
    let start = step(new_base, series.frequency, series.index.saturating_sub(1))?;
    civil_time::to_stored_instant(start)
}

/// Leading dates of a series that has not been created yet
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrencePreview {
    pub total: u32,
    pub dates: Vec<DateTime<Utc>>,
    pub remaining: u32,
}

impl RecurrencePreview {
    pub fn summary(&self) -> String {
        format!("Will create {} activities", self.total)
    }
}

/// Preview never limits what [`expand`] creates; it only shows the first few dates
pub fn preview(
    start: CivilDateTime,
    frequency: RecurrenceFrequency,
    count: u32,
) -> ScheduleResult<RecurrencePreview> {
    validate_count(count)?;

    let shown = count.min(PREVIEW_LIMIT);
    let dates = (0..shown)
        .map(|offset| step(start, frequency, offset).and_then(civil_time::to_stored_instant))
        .collect::<ScheduleResult<Vec<_>>>()?;

    Ok(RecurrencePreview {
        total: count,
        dates,
        remaining: count - shown,
    })
}
