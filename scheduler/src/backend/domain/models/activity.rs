use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::RecurrenceFrequency;
use uuid::Uuid;

use crate::backend::domain::civil_time::{self, CivilDateTime};
use crate::backend::domain::duration;
use crate::backend::domain::error::{ScheduleError, ScheduleResult};

/// One scheduled activity.
///
/// Persisted and synced in the flat wire layout of [`shared::Activity`]; the
/// conversion rejects records carrying only some of the series fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "shared::Activity", into = "shared::Activity")]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub datetime: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub series: Option<SeriesMembership>,
}

/// Position of an activity inside a recurring series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesMembership {
    pub id: Uuid,
    /// 1-based
    pub index: u32,
    pub total: u32,
    pub frequency: RecurrenceFrequency,
}

impl SeriesMembership {
    /// "2/5"
    pub fn label(&self) -> String {
        format!("{}/{}", self.index, self.total)
    }
}

impl Activity {
    pub fn generate_id() -> Uuid {
        Uuid::new_v4()
    }

    /// Wall-clock start in the civil offset
    pub fn civil_start(&self) -> CivilDateTime {
        civil_time::to_civil(self.datetime)
    }

    pub fn is_multi_day(&self) -> bool {
        self.duration_minutes
            .is_some_and(|minutes| minutes >= duration::MINUTES_PER_DAY)
    }

    /// First and last civil dates this activity occupies, inclusive.
    ///
    /// Anything shorter than a full day occupies only its start date, even when
    /// it runs past midnight.
    pub fn civil_span(&self) -> (NaiveDate, NaiveDate) {
        let start = self.civil_start().date();
        let end = match self.duration_minutes {
            Some(minutes) if minutes >= duration::MINUTES_PER_DAY => {
                let extra_days = i64::from(duration::span_days(minutes)) - 1;
                start
                    .checked_add_signed(Duration::days(extra_days))
                    .unwrap_or(NaiveDate::MAX)
            }
            _ => start,
        };
        (start, end)
    }

    pub fn touches(&self, date: NaiveDate) -> bool {
        let (start, end) = self.civil_span();
        start <= date && date <= end
    }

    pub fn series_id(&self) -> Option<Uuid> {
        self.series.map(|series| series.id)
    }
}

/// Validated input for one activity, before it is placed on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDraft {
    pub title: String,
    pub category: String,
    pub start: CivilDateTime,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
}

impl ActivityDraft {
    /// Trim and validate form values. A zero duration and empty notes are dropped.
    pub fn new(
        title: &str,
        category: &str,
        start: CivilDateTime,
        duration_minutes: Option<u32>,
        notes: Option<&str>,
    ) -> ScheduleResult<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ScheduleError::validation("Title is required"));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(ScheduleError::validation("Category is required"));
        }

        Ok(ActivityDraft {
            title: title.to_string(),
            category: category.to_string(),
            start,
            duration_minutes: duration_minutes.filter(|minutes| *minutes > 0),
            notes: notes
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
        })
    }

    /// Build a stored activity starting at `start` (civil) with a fresh id
    pub fn instantiate(
        &self,
        start: CivilDateTime,
        created_at: DateTime<Utc>,
        series: Option<SeriesMembership>,
    ) -> ScheduleResult<Activity> {
        Ok(Activity {
            id: Activity::generate_id(),
            title: self.title.clone(),
            category: self.category.clone(),
            datetime: civil_time::to_stored_instant(start)?,
            duration_minutes: self.duration_minutes,
            notes: self.notes.clone(),
            created_at,
            series,
        })
    }
}

impl TryFrom<shared::Activity> for Activity {
    type Error = anyhow::Error;

    fn try_from(dto: shared::Activity) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&dto.id)
            .with_context(|| format!("Invalid activity id '{}'", dto.id))?;
        let datetime = DateTime::parse_from_rfc3339(&dto.datetime)
            .with_context(|| format!("Invalid datetime for activity {}", dto.id))?
            .with_timezone(&Utc);
        let created_at = DateTime::parse_from_rfc3339(&dto.created_at)
            .with_context(|| format!("Invalid createdAt for activity {}", dto.id))?
            .with_timezone(&Utc);

        let series = match (
            dto.recurring_id,
            dto.recurring_index,
            dto.recurring_total,
            dto.recurring_frequency,
        ) {
            (None, None, None, None) => None,
            (Some(series_id), Some(index), Some(total), Some(frequency)) => {
                if index == 0 || index > total {
                    return Err(anyhow!(
                        "Activity {} has series index {} outside 1..={}",
                        dto.id,
                        index,
                        total
                    ));
                }
                Some(SeriesMembership {
                    id: Uuid::parse_str(&series_id)
                        .with_context(|| format!("Invalid series id '{series_id}'"))?,
                    index,
                    total,
                    frequency,
                })
            }
            _ => {
                return Err(anyhow!(
                    "Activity {} has an incomplete set of series fields",
                    dto.id
                ))
            }
        };

        Ok(Activity {
            id,
            title: dto.title,
            category: dto.category,
            datetime,
            duration_minutes: dto.duration_minutes.filter(|minutes| *minutes > 0),
            notes: dto.notes.filter(|notes| !notes.is_empty()),
            created_at,
            series,
        })
    }
}

impl From<Activity> for shared::Activity {
    fn from(activity: Activity) -> Self {
        let series = activity.series;
        shared::Activity {
            id: activity.id.to_string(),
            title: activity.title,
            category: activity.category,
            datetime: activity.datetime.to_rfc3339(),
            duration_minutes: activity.duration_minutes,
            notes: activity.notes,
            created_at: activity.created_at.to_rfc3339(),
            is_recurring: series.map(|_| true),
            recurring_id: series.map(|s| s.id.to_string()),
            recurring_index: series.map(|s| s.index),
            recurring_total: series.map(|s| s.total),
            recurring_frequency: series.map(|s| s.frequency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn activity_at(civil: CivilDateTime, duration_minutes: Option<u32>) -> Activity {
        Activity {
            id: Activity::generate_id(),
            title: "Trip".to_string(),
            category: "travel".to_string(),
            datetime: civil_time::to_stored_instant(civil).unwrap(),
            duration_minutes,
            notes: None,
            created_at: Utc::now(),
            series: None,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_two_day_activity_spans_two_dates() {
        let start = CivilDateTime::from_components(2025, 3, 10, 9, 0).unwrap();
        let activity = activity_at(start, Some(2880));

        assert!(activity.is_multi_day());
        assert_eq!(activity.civil_span(), (date(2025, 3, 10), date(2025, 3, 11)));
        assert!(activity.touches(date(2025, 3, 10)));
        assert!(activity.touches(date(2025, 3, 11)));
        assert!(!activity.touches(date(2025, 3, 9)));
        assert!(!activity.touches(date(2025, 3, 12)));
    }

    #[test]
    fn test_partial_day_rounds_span_up() {
        let start = CivilDateTime::from_components(2025, 3, 10, 9, 0).unwrap();
        let activity = activity_at(start, Some(1441));
        assert_eq!(activity.civil_span(), (date(2025, 3, 10), date(2025, 3, 11)));
    }

    #[test]
    fn test_short_activity_past_midnight_stays_on_start_date() {
        let start = CivilDateTime::from_components(2025, 3, 10, 23, 0).unwrap();
        let activity = activity_at(start, Some(180));
        assert!(!activity.is_multi_day());
        assert_eq!(activity.civil_span(), (date(2025, 3, 10), date(2025, 3, 10)));
    }

    #[test]
    fn test_civil_date_differs_from_utc_date() {
        // 07:00 civil on March 10th is still March 9th in UTC
        let start = CivilDateTime::from_components(2025, 3, 10, 7, 0).unwrap();
        let activity = activity_at(start, None);
        assert_eq!(activity.datetime, Utc.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap());
        assert!(activity.touches(date(2025, 3, 10)));
        assert!(!activity.touches(date(2025, 3, 9)));
    }

    #[test]
    fn test_wire_round_trip_with_series() {
        let start = CivilDateTime::from_components(2025, 3, 10, 9, 0).unwrap();
        let mut activity = activity_at(start, Some(60));
        activity.series = Some(SeriesMembership {
            id: Uuid::new_v4(),
            index: 2,
            total: 4,
            frequency: RecurrenceFrequency::Weekly,
        });

        let json = serde_json::to_string(&activity).unwrap();
        assert!(json.contains("\"isRecurring\":true"));
        let back: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, activity);
    }

    #[test]
    fn test_partial_series_fields_are_rejected() {
        let dto = shared::Activity {
            id: Uuid::new_v4().to_string(),
            title: "Broken".to_string(),
            category: "study".to_string(),
            datetime: "2025-03-10T02:00:00+00:00".to_string(),
            duration_minutes: None,
            notes: None,
            created_at: "2025-03-01T00:00:00+00:00".to_string(),
            is_recurring: Some(true),
            recurring_id: Some(Uuid::new_v4().to_string()),
            recurring_index: Some(1),
            recurring_total: None,
            recurring_frequency: Some(RecurrenceFrequency::Daily),
        };

        let err = Activity::try_from(dto).unwrap_err();
        assert!(err.to_string().contains("incomplete"));
    }

    #[test]
    fn test_draft_trims_and_validates() {
        let start = CivilDateTime::from_components(2025, 3, 10, 9, 0).unwrap();

        let draft = ActivityDraft::new("  Yoga  ", " fitness ", start, Some(0), Some("   ")).unwrap();
        assert_eq!(draft.title, "Yoga");
        assert_eq!(draft.category, "fitness");
        assert_eq!(draft.duration_minutes, None);
        assert_eq!(draft.notes, None);

        assert!(matches!(
            ActivityDraft::new("   ", "fitness", start, None, None),
            Err(ScheduleError::Validation(_))
        ));
        assert!(matches!(
            ActivityDraft::new("Yoga", "", start, None, None),
            Err(ScheduleError::Validation(_))
        ));
    }

    #[test]
    fn test_series_label() {
        let series = SeriesMembership {
            id: Uuid::new_v4(),
            index: 2,
            total: 5,
            frequency: RecurrenceFrequency::Daily,
        };
        assert_eq!(series.label(), "2/5");
    }
}
