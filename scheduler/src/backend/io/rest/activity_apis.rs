//! Activity and recurring series endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;
use serde::Deserialize;
use shared::{
    ActivityListResponse, ActivityResponse, CreateActivityRequest, DeleteActivitiesResponse,
    RecurrencePreviewRequest, RecurrencePreviewResponse, UpdateActivityRequest,
};
use uuid::Uuid;

use super::mappers::ActivityMapper;
use crate::backend::domain::civil_time::{self, CivilDateTime};
use crate::backend::domain::error::{ScheduleError, ScheduleResult};
use crate::backend::domain::models::activity::Activity;
use crate::backend::domain::{recurrence, CategoryFilter};
use crate::backend::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    /// "all" or a category id; the active filter is used when absent
    pub category: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route("/activities/preview", post(preview_recurrence))
        .route(
            "/activities/:id",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/series/:id", get(get_series).delete(delete_series))
}

/// Ids that are not UUIDs cannot name anything stored
fn parse_id(raw: &str, what: &str) -> ScheduleResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ScheduleError::not_found(format!("{what} {raw}")))
}

fn views(state: &AppState, activities: Vec<Activity>) -> ScheduleResult<Vec<shared::ActivityView>> {
    let categories = state.activity_store.categories()?;
    Ok(ActivityMapper::to_view_list(activities, &categories))
}

fn list_response(state: &AppState, query: &ActivityListQuery) -> ScheduleResult<ActivityListResponse> {
    let filter = match query.category.as_deref() {
        Some(category) => CategoryFilter::parse(category),
        None => state.activity_store.active_filter()?,
    };
    let activities = state.activity_store.filter_by_category(&filter)?;
    Ok(ActivityListResponse {
        activities: views(state, activities)?,
        filter: filter.to_string(),
    })
}

async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityListQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities - query: {:?}", query);

    match list_response(&state, &query) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn create_activity(
    State(state): State<AppState>,
    Json(request): Json<CreateActivityRequest>,
) -> impl IntoResponse {
    info!("POST /api/activities - request: {:?}", request);

    let result = ActivityMapper::to_draft(&request).and_then(|draft| match &request.recurrence {
        Some(rule) => state.activity_store.add_series(draft, rule.frequency, rule.count),
        None => state.activity_store.add(draft).map(|activity| vec![activity]),
    });

    match result.and_then(|created| {
        let success_message = if request.recurrence.is_some() {
            format!("Created {} recurring activities", created.len())
        } else {
            "Activity added".to_string()
        };
        Ok(ActivityResponse {
            activities: views(&state, created)?,
            success_message,
        })
    }) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn preview_recurrence(Json(request): Json<RecurrencePreviewRequest>) -> impl IntoResponse {
    info!("POST /api/activities/preview - request: {:?}", request);

    let result = CivilDateTime::parse_input(&request.datetime)
        .and_then(|start| recurrence::preview(start, request.frequency, request.count));

    match result {
        Ok(preview) => {
            let response = RecurrencePreviewResponse {
                total: preview.total,
                dates: preview.dates.iter().copied().map(civil_time::format_display).collect(),
                remaining: preview.remaining,
                summary: preview.summary(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn get_activity(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/activities/{}", id);

    let result = parse_id(&id, "Activity")
        .and_then(|id| state.activity_store.get(id))
        .and_then(|activity| {
            let name = state.activity_store.category_name(&activity.category)?;
            Ok(ActivityMapper::to_view(activity, name))
        });

    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateActivityRequest>,
) -> impl IntoResponse {
    info!("PUT /api/activities/{} - request: {:?}", id, request);

    let result = parse_id(&id, "Activity").and_then(|id| {
        let patch = ActivityMapper::to_patch(&request)?;
        let updated = state.activity_store.update(id, patch, request.scope)?;
        let success_message = match updated.len() {
            1 => "Activity updated".to_string(),
            n => format!("Updated {n} activities in the series"),
        };
        Ok(ActivityResponse {
            activities: views(&state, updated)?,
            success_message,
        })
    });

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_activity(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/activities/{}", id);

    match parse_id(&id, "Activity").and_then(|id| state.activity_store.remove(id)) {
        Ok(removed) => {
            let response = DeleteActivitiesResponse {
                deleted_count: 1,
                success_message: format!("Deleted '{}'", removed.title),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn get_series(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/series/{}", id);

    let result = parse_id(&id, "Series")
        .and_then(|id| state.activity_store.series(id))
        .and_then(|members| views(&state, members));

    match result {
        Ok(members) => (StatusCode::OK, Json(members)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_series(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/series/{}", id);

    match parse_id(&id, "Series").and_then(|id| state.activity_store.remove_series(id)) {
        Ok(deleted_count) => {
            let response = DeleteActivitiesResponse {
                deleted_count,
                success_message: format!("Deleted {deleted_count} activities in the series"),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::io::rest::test_support::{call, get, send};
    use crate::backend::test_support::TestApp;
    use axum::http::Method;
    use serde_json::json;
    use shared::{ActivityView, ErrorResponse};

    async fn create(app: &TestApp, body: serde_json::Value) -> (StatusCode, ActivityResponse) {
        call(&app.router, Method::POST, "/api/activities", body).await
    }

    #[tokio::test]
    async fn test_create_and_get_activity() {
        let app = TestApp::new();
        let (status, created) = create(
            &app,
            json!({
                "title": "Morning run",
                "category": "fitness",
                "datetime": "2025-03-10T07:00",
                "duration": { "value": 45, "unit": "minutes" }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.activities.len(), 1);

        let view = &created.activities[0];
        assert_eq!(view.activity.datetime, "2025-03-09T23:00:00+00:00");
        assert_eq!(view.category_name, "Fitness & Yoga");
        assert_eq!(view.display_duration.as_deref(), Some("45m"));

        let (status, fetched): (_, ActivityView) =
            get(&app.router, &format!("/api/activities/{}", view.activity.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, *view);
    }

    #[tokio::test]
    async fn test_create_series_and_delete_it() {
        let app = TestApp::new();
        let (status, created) = create(
            &app,
            json!({
                "title": "Piano",
                "category": "study",
                "datetime": "2025-01-31T10:00",
                "recurrence": { "frequency": "monthly", "count": 3 }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.success_message, "Created 3 recurring activities");
        let labels: Vec<_> = created
            .activities
            .iter()
            .map(|view| view.series_label.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["1/3", "2/3", "3/3"]);
        assert_eq!(created.activities[1].local_datetime, "2025-03-03T10:00");

        let series_id = created.activities[0].activity.recurring_id.clone().unwrap();
        let (status, members): (_, Vec<ActivityView>) =
            get(&app.router, &format!("/api/series/{series_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(members.len(), 3);

        let (status, deleted): (_, DeleteActivitiesResponse) =
            call(&app.router, Method::DELETE, &format!("/api/series/{series_id}"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted.deleted_count, 3);
        assert_eq!(app.state.activity_store.activity_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = TestApp::new();
        let (status, body): (_, ErrorResponse) = call(
            &app.router,
            Method::POST,
            "/api/activities",
            json!({ "title": "  ", "category": "fitness", "datetime": "2025-03-10T07:00" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, "validation_error");

        let (status, _): (_, ErrorResponse) = call(
            &app.router,
            Method::POST,
            "/api/activities",
            json!({
                "title": "Run",
                "category": "fitness",
                "datetime": "2025-03-10T07:00",
                "recurrence": { "frequency": "daily", "count": 0 }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body): (_, ErrorResponse) = call(
            &app.router,
            Method::POST,
            "/api/activities",
            json!({
                "title": "Run",
                "category": "fitness",
                "datetime": "2025-03-10T07:00",
                "recurrence": { "frequency": "daily", "count": 4_000_000_000u32 }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, "validation_error");
        assert_eq!(app.state.activity_store.activity_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let app = TestApp::new();
        let (status, body): (_, ErrorResponse) = get(&app.router, "/api/activities/not-a-uuid").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.kind, "not_found");

        let (status, _) = send(
            &app.router,
            Method::DELETE,
            &format!("/api/activities/{}", Uuid::new_v4()),
            None::<()>,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_clears_duration() {
        let app = TestApp::new();
        let (_, created) = create(
            &app,
            json!({
                "title": "Study",
                "category": "study",
                "datetime": "2025-03-10T19:00",
                "duration": { "value": 2, "unit": "hours" },
                "notes": "chapter 4"
            }),
        )
        .await;
        let id = created.activities[0].activity.id.clone();

        let (status, updated): (_, ActivityResponse) = call(
            &app.router,
            Method::PUT,
            &format!("/api/activities/{id}"),
            json!({ "duration": { "value": 0, "unit": "minutes" }, "title": "Study hard" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let view = &updated.activities[0];
        assert_eq!(view.activity.title, "Study hard");
        assert_eq!(view.activity.duration_minutes, None);
        assert_eq!(view.activity.notes.as_deref(), Some("chapter 4"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = TestApp::new();
        for (title, category, datetime) in [
            ("Run", "fitness", "2025-03-10T07:00"),
            ("Lunch", "meals", "2025-03-10T12:00"),
            ("Swim", "fitness", "2025-03-11T07:00"),
        ] {
            create(&app, json!({ "title": title, "category": category, "datetime": datetime })).await;
        }

        let (_, all): (_, ActivityListResponse) = get(&app.router, "/api/activities").await;
        assert_eq!(all.filter, "all");
        let titles: Vec<_> = all.activities.iter().map(|view| view.activity.title.as_str()).collect();
        assert_eq!(titles, vec!["Swim", "Lunch", "Run"]);

        let (_, fitness): (_, ActivityListResponse) =
            get(&app.router, "/api/activities?category=fitness").await;
        assert_eq!(fitness.filter, "fitness");
        assert_eq!(fitness.activities.len(), 2);

        app.state
            .activity_store
            .set_filter(CategoryFilter::Category("meals".to_string()))
            .unwrap();
        let (_, active): (_, ActivityListResponse) = get(&app.router, "/api/activities").await;
        assert_eq!(active.filter, "meals");
        assert_eq!(active.activities.len(), 1);
    }

    #[tokio::test]
    async fn test_preview() {
        let app = TestApp::new();
        let (status, preview): (_, RecurrencePreviewResponse) = call(
            &app.router,
            Method::POST,
            "/api/activities/preview",
            json!({ "datetime": "2025-03-10T10:00", "frequency": "weekly", "count": 8 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview.total, 8);
        assert_eq!(preview.remaining, 3);
        assert_eq!(preview.dates.len(), 5);
        assert_eq!(preview.dates[1], "Mon, Mar 17, 2025, 10:00 AM");
        assert_eq!(preview.summary, "Will create 8 activities");
    }
}
