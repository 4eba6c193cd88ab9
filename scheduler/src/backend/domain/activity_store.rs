//! Activity store.
//!
//! Owns the in-memory activities, categories and the active category filter.
//! Every mutation runs against a working copy, is persisted through
//! [`ScheduleStorage`], and only then replaces the live state, so a failed
//! save leaves memory exactly as it was.

use anyhow::anyhow;
use chrono::Utc;
use log::{debug, info};
use shared::{EditScope, RecurrenceFrequency};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::civil_time::{self, CivilDateTime};
use super::error::{ScheduleError, ScheduleResult};
use super::models::activity::{Activity, ActivityDraft};
use super::models::category::{Category, Rgb};
use super::recurrence;
use crate::backend::storage::ScheduleStorage;

/// Which activities list and calendar views show
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    /// "all" (or nothing) selects every category; anything else is a category id
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" => CategoryFilter::All,
            id => CategoryFilter::Category(id.to_string()),
        }
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(id) => activity.category == *id,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Category(id) => write!(f, "{id}"),
        }
    }
}

/// Fields an edit may replace. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    /// New civil start; for a series edit this is the new start of member 1
    pub start: Option<CivilDateTime>,
    /// `Some(None)` clears the duration
    pub duration_minutes: Option<Option<u32>>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
}

/// Outcome of deleting a category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRemoval {
    pub category: Category,
    pub deleted_activities: usize,
    pub filter_reset: bool,
}

/// Patch fields after trimming and validation
struct ResolvedPatch {
    title: Option<String>,
    category: Option<String>,
    duration_minutes: Option<Option<u32>>,
    notes: Option<Option<String>>,
}

impl ResolvedPatch {
    fn resolve(patch: &ActivityPatch) -> ScheduleResult<Self> {
        Ok(ResolvedPatch {
            title: patch
                .title
                .as_deref()
                .map(|title| required_text(title, "Title"))
                .transpose()?,
            category: patch
                .category
                .as_deref()
                .map(|category| required_text(category, "Category"))
                .transpose()?,
            duration_minutes: patch
                .duration_minutes
                .map(|minutes| minutes.filter(|m| *m > 0)),
            notes: patch.notes.as_ref().map(|notes| {
                notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
            }),
        })
    }

    fn apply(&self, activity: &mut Activity) {
        if let Some(title) = &self.title {
            activity.title = title.clone();
        }
        if let Some(category) = &self.category {
            activity.category = category.clone();
        }
        if let Some(duration_minutes) = self.duration_minutes {
            activity.duration_minutes = duration_minutes;
        }
        if let Some(notes) = &self.notes {
            activity.notes = notes.clone();
        }
    }
}

fn required_text(value: &str, field: &str) -> ScheduleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| b.datetime.cmp(&a.datetime));
}

#[derive(Debug, Clone)]
struct StoreState {
    activities: Vec<Activity>,
    categories: Vec<Category>,
    filter: CategoryFilter,
}

impl StoreState {
    fn require_category(&self, id: &str) -> ScheduleResult<()> {
        if self.categories.iter().any(|category| category.id == id) {
            Ok(())
        } else {
            Err(ScheduleError::validation(format!("Unknown category '{id}'")))
        }
    }

    fn position_of(&self, id: Uuid) -> ScheduleResult<usize> {
        self.activities
            .iter()
            .position(|activity| activity.id == id)
            .ok_or_else(|| ScheduleError::not_found(format!("Activity {id}")))
    }

    /// Fall back to showing everything when the filtered category is gone
    fn reset_stale_filter(&mut self) -> bool {
        let stale = match &self.filter {
            CategoryFilter::All => false,
            CategoryFilter::Category(id) => !self.categories.iter().any(|c| c.id == *id),
        };
        if stale {
            self.filter = CategoryFilter::All;
        }
        stale
    }
}

#[derive(Clone)]
pub struct ActivityStore {
    storage: Arc<dyn ScheduleStorage>,
    state: Arc<Mutex<StoreState>>,
}

impl ActivityStore {
    /// Load the saved schedule, or start empty with the default categories
    pub fn load(storage: Arc<dyn ScheduleStorage>) -> ScheduleResult<Self> {
        let (activities, categories) = match storage.load_schedule()? {
            Some(snapshot) => (
                snapshot.activities,
                snapshot.categories.unwrap_or_else(Category::defaults),
            ),
            None => (Vec::new(), Category::defaults()),
        };
        info!(
            "Loaded schedule with {} activities and {} categories",
            activities.len(),
            categories.len()
        );

        Ok(Self {
            storage,
            state: Arc::new(Mutex::new(StoreState {
                activities,
                categories,
                filter: CategoryFilter::All,
            })),
        })
    }

    fn lock(&self) -> ScheduleResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| ScheduleError::Storage(anyhow!("Activity store lock poisoned")))
    }

    /// Apply `change` to a copy, persist the copy, then commit it
    fn mutate<T>(&self, change: impl FnOnce(&mut StoreState) -> ScheduleResult<T>) -> ScheduleResult<T> {
        let mut state = self.lock()?;
        let mut working = state.clone();
        let result = change(&mut working)?;
        self.storage
            .save_schedule(&working.activities, &working.categories)?;
        *state = working;
        Ok(result)
    }

    pub fn add(&self, draft: ActivityDraft) -> ScheduleResult<Activity> {
        self.mutate(|state| {
            state.require_category(&draft.category)?;
            let activity = draft.instantiate(draft.start, Utc::now(), None)?;
            state.activities.push(activity.clone());
            info!("Added activity {} '{}'", activity.id, activity.title);
            Ok(activity)
        })
    }

    /// Expand a recurring draft and add every member, in index order
    pub fn add_series(
        &self,
        draft: ActivityDraft,
        frequency: RecurrenceFrequency,
        count: u32,
    ) -> ScheduleResult<Vec<Activity>> {
        self.mutate(|state| {
            state.require_category(&draft.category)?;
            let series_id = Uuid::new_v4();
            let members = recurrence::expand(&draft, frequency, count, series_id, Utc::now())?;
            state.activities.extend(members.iter().cloned());
            info!(
                "Added {} series {} with {} activities '{}'",
                frequency,
                series_id,
                members.len(),
                draft.title
            );
            Ok(members)
        })
    }

    /// Edit one activity, or with [`EditScope::Series`] every member of its series.
    ///
    /// A series edit with a new start re-anchors each member at its own offset
    /// from the new start. Returns the updated activities.
    pub fn update(&self, id: Uuid, patch: ActivityPatch, scope: EditScope) -> ScheduleResult<Vec<Activity>> {
        let resolved = ResolvedPatch::resolve(&patch)?;

        self.mutate(|state| {
            if let Some(category) = &resolved.category {
                state.require_category(category)?;
            }
            let position = state.position_of(id)?;

            match scope {
                EditScope::Single => {
                    let activity = &mut state.activities[position];
                    if let Some(start) = patch.start {
                        activity.datetime = civil_time::to_stored_instant(start)?;
                    }
                    resolved.apply(activity);
                    info!("Updated activity {}", id);
                    Ok(vec![activity.clone()])
                }
                EditScope::Series => {
                    let series_id = state.activities[position].series_id().ok_or_else(|| {
                        ScheduleError::validation("Activity is not part of a recurring series")
                    })?;

                    let mut updated = Vec::new();
                    for activity in state
                        .activities
                        .iter_mut()
                        .filter(|activity| activity.series_id() == Some(series_id))
                    {
                        if let (Some(new_base), Some(series)) = (patch.start, activity.series) {
                            activity.datetime = recurrence::reanchor(new_base, &series)?;
                        }
                        resolved.apply(activity);
                        updated.push(activity.clone());
                    }
                    updated.sort_by_key(|activity| activity.series.map(|s| s.index));
                    info!("Updated {} activities in series {}", updated.len(), series_id);
                    Ok(updated)
                }
            }
        })
    }

    pub fn remove(&self, id: Uuid) -> ScheduleResult<Activity> {
        self.mutate(|state| {
            let position = state.position_of(id)?;
            let removed = state.activities.remove(position);
            info!("Removed activity {} '{}'", removed.id, removed.title);
            Ok(removed)
        })
    }

    /// Remove every member of a series, returning how many were removed
    pub fn remove_series(&self, series_id: Uuid) -> ScheduleResult<usize> {
        self.mutate(|state| {
            let before = state.activities.len();
            state
                .activities
                .retain(|activity| activity.series_id() != Some(series_id));
            let removed = before - state.activities.len();
            if removed == 0 {
                return Err(ScheduleError::not_found(format!("Series {series_id}")));
            }
            info!("Removed {} activities in series {}", removed, series_id);
            Ok(removed)
        })
    }

    pub fn add_category(&self, name: &str, color: Rgb) -> ScheduleResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScheduleError::validation("Category name is required"));
        }
        let id = Category::slug_for(name);
        if id.is_empty() {
            return Err(ScheduleError::validation(format!(
                "Category name '{name}' needs at least one letter or digit"
            )));
        }

        self.mutate(|state| {
            let lowered = name.to_lowercase();
            if state
                .categories
                .iter()
                .any(|category| category.name.to_lowercase() == lowered)
            {
                return Err(ScheduleError::DuplicateCategory(name.to_string()));
            }
            if state.categories.iter().any(|category| category.id == id) {
                return Err(ScheduleError::DuplicateCategoryId {
                    id,
                    name: name.to_string(),
                });
            }

            let category = Category {
                id,
                name: name.to_string(),
                color,
            };
            state.categories.push(category.clone());
            info!("Added category '{}' ({})", category.name, category.id);
            Ok(category)
        })
    }

    /// Delete a category together with every activity that uses it
    pub fn remove_category(&self, id: &str) -> ScheduleResult<CategoryRemoval> {
        self.mutate(|state| {
            let position = state
                .categories
                .iter()
                .position(|category| category.id == id)
                .ok_or_else(|| ScheduleError::not_found(format!("Category {id}")))?;
            let category = state.categories.remove(position);

            let before = state.activities.len();
            state.activities.retain(|activity| activity.category != id);
            let deleted_activities = before - state.activities.len();
            let filter_reset = state.reset_stale_filter();

            info!(
                "Removed category '{}' and {} of its activities",
                category.name, deleted_activities
            );
            Ok(CategoryRemoval {
                category,
                deleted_activities,
                filter_reset,
            })
        })
    }

    /// Replace everything with a downloaded data set
    pub fn replace_all(&self, activities: Vec<Activity>, categories: Vec<Category>) -> ScheduleResult<()> {
        self.mutate(|state| {
            state.activities = activities;
            state.categories = categories;
            state.reset_stale_filter();
            info!(
                "Replaced schedule with {} activities and {} categories",
                state.activities.len(),
                state.categories.len()
            );
            Ok(())
        })
    }

    pub fn active_filter(&self) -> ScheduleResult<CategoryFilter> {
        Ok(self.lock()?.filter.clone())
    }

    /// Select the filter used by list and calendar views
    pub fn set_filter(&self, filter: CategoryFilter) -> ScheduleResult<CategoryFilter> {
        let mut state = self.lock()?;
        if let CategoryFilter::Category(id) = &filter {
            if !state.categories.iter().any(|category| category.id == *id) {
                return Err(ScheduleError::not_found(format!("Category {id}")));
            }
        }
        debug!("Active filter set to {}", filter);
        state.filter = filter.clone();
        Ok(filter)
    }

    /// Activities matching `filter`, newest first
    pub fn filter_by_category(&self, filter: &CategoryFilter) -> ScheduleResult<Vec<Activity>> {
        let state = self.lock()?;
        let mut matching: Vec<Activity> = state
            .activities
            .iter()
            .filter(|activity| filter.matches(activity))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching)
    }

    /// Activities matching the active filter, newest first
    pub fn visible(&self) -> ScheduleResult<Vec<Activity>> {
        let filter = self.active_filter()?;
        self.filter_by_category(&filter)
    }

    /// Every activity, newest first
    pub fn list(&self) -> ScheduleResult<Vec<Activity>> {
        self.filter_by_category(&CategoryFilter::All)
    }

    pub fn get(&self, id: Uuid) -> ScheduleResult<Activity> {
        let state = self.lock()?;
        let position = state.position_of(id)?;
        Ok(state.activities[position].clone())
    }

    /// Members of a series in index order
    pub fn series(&self, series_id: Uuid) -> ScheduleResult<Vec<Activity>> {
        let state = self.lock()?;
        let mut members: Vec<Activity> = state
            .activities
            .iter()
            .filter(|activity| activity.series_id() == Some(series_id))
            .cloned()
            .collect();
        if members.is_empty() {
            return Err(ScheduleError::not_found(format!("Series {series_id}")));
        }
        members.sort_by_key(|activity| activity.series.map(|s| s.index));
        Ok(members)
    }

    pub fn categories(&self) -> ScheduleResult<Vec<Category>> {
        Ok(self.lock()?.categories.clone())
    }

    /// Number of activities per category id
    pub fn category_usage(&self) -> ScheduleResult<HashMap<String, usize>> {
        let state = self.lock()?;
        let mut usage = HashMap::new();
        for activity in &state.activities {
            *usage.entry(activity.category.clone()).or_insert(0) += 1;
        }
        Ok(usage)
    }

    /// Display name of a category, or the id itself when it is unknown
    pub fn category_name(&self, id: &str) -> ScheduleResult<String> {
        let state = self.lock()?;
        Ok(state
            .categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.clone())
            .unwrap_or_else(|| id.to_string()))
    }

    pub fn activity_count(&self) -> ScheduleResult<usize> {
        Ok(self.lock()?.activities.len())
    }

    /// Everything the sync document carries from the store
    pub fn snapshot(&self) -> ScheduleResult<(Vec<Activity>, Vec<Category>)> {
        let state = self.lock()?;
        Ok((state.activities.clone(), state.categories.clone()))
    }
}
