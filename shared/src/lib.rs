use serde::{Deserialize, Serialize};
use std::fmt;

/// One scheduled activity as it travels over the API and inside the sync document.
///
/// Series fields are either all present or all absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// UUID of the activity
    pub id: String,
    pub title: String,
    /// Slug of the category this activity belongs to
    pub category: String,
    /// Stored instant (RFC 3339, UTC)
    pub datetime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation instant (RFC 3339, UTC)
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_frequency: Option<RecurrenceFrequency>,
}

/// How a recurring series steps from one instance to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceFrequency {
    /// Unit label used next to the repeat count ("repeat 4 weeks")
    pub fn unit_label(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Daily => "days",
            RecurrenceFrequency::Weekly => "weeks",
            RecurrenceFrequency::Monthly => "months",
        }
    }
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecurrenceFrequency::Daily => write!(f, "daily"),
            RecurrenceFrequency::Weekly => write!(f, "weekly"),
            RecurrenceFrequency::Monthly => write!(f, "monthly"),
        }
    }
}

/// Unit a duration was entered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}

/// Duration as typed into a form: a count and its unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInput {
    pub value: u32,
    pub unit: DurationUnit,
}

/// Recurrence rule attached to a create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRequest {
    pub frequency: RecurrenceFrequency,
    pub count: u32,
}

/// Which activities an edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    #[default]
    Single,
    Series,
}

/// An activity decorated with everything a list view needs to render it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub category_name: String,
    /// e.g. "Mon, Mar 10, 2025, 10:00 AM"
    pub display_datetime: String,
    /// e.g. "10:00 AM"
    pub display_time: String,
    pub display_duration: Option<String>,
    /// e.g. "2/5" for the second member of a five-instance series
    pub series_label: Option<String>,
    /// Civil wall-clock value for edit forms ("YYYY-MM-DDTHH:MM")
    pub local_datetime: String,
    /// Duration as an edit form would re-populate it
    pub duration_input: Option<DurationInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    pub category: String,
    /// Civil wall-clock input ("YYYY-MM-DDTHH:MM")
    pub datetime: String,
    #[serde(default)]
    pub duration: Option<DurationInput>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub activities: Vec<ActivityView>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityListResponse {
    pub activities: Vec<ActivityView>,
    /// Filter that produced this list ("all" or a category id)
    pub filter: String,
}

/// Partial update. Absent fields are left untouched.
///
/// A duration of zero clears the duration, an empty notes string clears the notes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateActivityRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub duration: Option<DurationInput>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub scope: EditScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteActivitiesResponse {
    pub deleted_count: usize,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePreviewRequest {
    pub datetime: String,
    pub frequency: RecurrenceFrequency,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePreviewResponse {
    pub total: u32,
    /// Display strings for the first few instances
    pub dates: Vec<String>,
    pub remaining: u32,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// "#rrggbb"
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: String,
}

/// Category plus usage and derived display colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub activity_count: usize,
    pub background_color: String,
    pub text_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCategoryResponse {
    pub deleted_activities: usize,
    pub filter_reset: bool,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFilterRequest {
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    /// Civil date ("YYYY-MM-DD")
    pub date: String,
    pub name: String,
    pub local_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayListResponse {
    pub year: i32,
    pub holidays: Vec<Holiday>,
}

/// Month header quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyQuote {
    pub text: String,
    pub author: String,
}

/// A projected calendar month: always 42 cells, Sunday first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub quote: MonthlyQuote,
    pub cells: Vec<CalendarCell>,
}

/// One day slot in the calendar grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarCell {
    /// Civil date ("YYYY-MM-DD")
    pub date: String,
    pub day: u32,
    pub is_other_month: bool,
    pub is_today: bool,
    pub holiday: Option<Holiday>,
    /// Every activity touching this day, earliest first
    pub activities: Vec<ActivityView>,
    /// How many of `activities` a cell should render before the overflow badge
    pub visible_limit: usize,
    /// Size of the "+N" badge
    pub overflow_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonthRequest {
    pub year: i32,
    pub month: u32,
}

/// Current civil date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDateResponse {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub formatted_date: String,
    pub iso_date: String,
}

/// Represents the current focus month for calendar navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarFocusDate {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCalendarFocusRequest {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCalendarFocusResponse {
    pub focus_date: CalendarFocusDate,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppTitleResponse {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAppTitleRequest {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSetupRequest {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    pub enabled: bool,
    /// A remote document is linked
    pub connected: bool,
    pub last_sync: Option<String>,
    pub activity_count: usize,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResultResponse {
    pub status: SyncStatusResponse,
    pub success_message: String,
}

/// Content of the remote sync document
///
/// Missing fields are tolerated on download; defaults are applied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub app_title: Option<String>,
    pub last_modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationFormatResponse {
    pub minutes: u32,
    pub display: String,
    pub input: DurationInput,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_wire_format_is_camel_case() {
        let activity = Activity {
            id: "a1".to_string(),
            title: "Yoga".to_string(),
            category: "fitness".to_string(),
            datetime: "2025-03-10T02:00:00Z".to_string(),
            duration_minutes: Some(60),
            notes: None,
            created_at: "2025-03-01T00:00:00Z".to_string(),
            is_recurring: Some(true),
            recurring_id: Some("s1".to_string()),
            recurring_index: Some(1),
            recurring_total: Some(3),
            recurring_frequency: Some(RecurrenceFrequency::Weekly),
        };

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["durationMinutes"], 60);
        assert_eq!(json["recurringFrequency"], "weekly");
        assert_eq!(json["createdAt"], "2025-03-01T00:00:00Z");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_point_activity_omits_series_fields() {
        let json = r#"{
            "id": "a2",
            "title": "Lunch",
            "category": "meals",
            "datetime": "2025-03-10T04:00:00Z",
            "createdAt": "2025-03-01T00:00:00Z"
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.duration_minutes, None);
        assert_eq!(activity.recurring_id, None);

        let back = serde_json::to_value(&activity).unwrap();
        assert!(back.get("isRecurring").is_none());
    }

    #[test]
    fn test_sync_payload_tolerates_missing_fields() {
        let payload: SyncPayload =
            serde_json::from_str(r#"{"lastModified": "2025-03-01T00:00:00Z"}"#).unwrap();
        assert!(payload.activities.is_empty());
        assert!(payload.categories.is_none());
        assert!(payload.app_title.is_none());
    }

    #[test]
    fn test_frequency_unit_labels() {
        assert_eq!(RecurrenceFrequency::Daily.unit_label(), "days");
        assert_eq!(RecurrenceFrequency::Weekly.unit_label(), "weeks");
        assert_eq!(RecurrenceFrequency::Monthly.unit_label(), "months");
        assert_eq!(RecurrenceFrequency::Monthly.to_string(), "monthly");
    }

    #[test]
    fn test_edit_scope_defaults_to_single() {
        let request: UpdateActivityRequest = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(request.scope, EditScope::Single);
    }
}
