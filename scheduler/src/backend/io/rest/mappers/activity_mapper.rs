use shared::{ActivityView, CreateActivityRequest, UpdateActivityRequest};

use crate::backend::domain::activity_store::ActivityPatch;
use crate::backend::domain::civil_time::{self, CivilDateTime};
use crate::backend::domain::duration;
use crate::backend::domain::error::ScheduleResult;
use crate::backend::domain::models::activity::{Activity, ActivityDraft};
use crate::backend::domain::models::category::Category;

pub struct ActivityMapper;

impl ActivityMapper {
    /// Form values of a create request as a validated draft
    pub fn to_draft(request: &CreateActivityRequest) -> ScheduleResult<ActivityDraft> {
        let start = CivilDateTime::parse_input(&request.datetime)?;
        ActivityDraft::new(
            &request.title,
            &request.category,
            start,
            request.duration.and_then(duration::normalize_input),
            request.notes.as_deref(),
        )
    }

    /// Absent fields stay untouched; a zero duration or empty notes clear the field
    pub fn to_patch(request: &UpdateActivityRequest) -> ScheduleResult<ActivityPatch> {
        Ok(ActivityPatch {
            title: request.title.clone(),
            category: request.category.clone(),
            start: request
                .datetime
                .as_deref()
                .map(CivilDateTime::parse_input)
                .transpose()?,
            duration_minutes: request.duration.map(duration::normalize_input),
            notes: request.notes.clone().map(Some),
        })
    }

    pub fn to_view(activity: Activity, category_name: String) -> ActivityView {
        let civil_start = activity.civil_start();
        ActivityView {
            category_name,
            display_datetime: civil_time::format_display(activity.datetime),
            display_time: civil_time::format_time(activity.datetime),
            display_duration: activity.duration_minutes.map(duration::format),
            series_label: activity.series.map(|series| series.label()),
            local_datetime: civil_start.to_input_value(),
            duration_input: activity.duration_minutes.map(duration::denormalize),
            activity: activity.into(),
        }
    }

    /// Category names are looked up in `categories`, falling back to the raw id
    pub fn to_view_list(activities: Vec<Activity>, categories: &[Category]) -> Vec<ActivityView> {
        activities
            .into_iter()
            .map(|activity| {
                let name = categories
                    .iter()
                    .find(|category| category.id == activity.category)
                    .map(|category| category.name.clone())
                    .unwrap_or_else(|| activity.category.clone());
                Self::to_view(activity, name)
            })
            .collect()
    }
}
