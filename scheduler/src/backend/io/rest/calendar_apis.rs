use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Datelike;
use log::info;
use serde::Deserialize;
use shared::{CalendarFocusDate, CalendarMonth, UpdateCalendarFocusRequest, UpdateCalendarFocusResponse};
use std::time::Duration;

use super::mappers::CalendarMapper;
use crate::backend::domain::calendar::{self, GRID_CELLS};
use crate::backend::domain::error::ScheduleResult;
use crate::backend::AppState;

// Query parameters for calendar month API
#[derive(Debug, Deserialize)]
pub struct CalendarMonthQuery {
    pub month: u32,
    pub year: i32,
}

/// Create a router for calendar related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/month", get(get_calendar_month))
        .route("/current-date", get(get_current_date))
        .route("/focus-date", get(get_focus_date).post(set_focus_date))
        .route("/focus-date/previous", post(navigate_previous_month))
        .route("/focus-date/next", post(navigate_next_month))
}

/// Longest a month request waits for holiday years that are not cached yet
const HOLIDAY_WAIT: Duration = Duration::from_millis(300);

/// Project the visible activities onto the month grid.
///
/// The grid can reach into the neighbouring years, so holidays are loaded
/// for every year it covers. A slow holiday source never holds the grid back
/// for longer than [`HOLIDAY_WAIT`].
async fn build_month(state: &AppState, query: &CalendarMonthQuery) -> ScheduleResult<CalendarMonth> {
    let start = calendar::grid_start(query.year, query.month)?;
    let end = start
        .checked_add_signed(chrono::Duration::days(GRID_CELLS as i64 - 1))
        .unwrap_or(start);

    let holidays = state
        .holiday_cache
        .holidays_within(start.year()..=end.year(), HOLIDAY_WAIT)
        .await?;

    let activities = state.activity_store.visible()?;
    let month = state
        .calendar_service
        .project_month(query.year, query.month, &activities, &holidays)?;
    let categories = state.activity_store.categories()?;
    Ok(CalendarMapper::to_dto(month, &state.calendar_service, &categories))
}

/// Get a projected calendar month with holidays and activities
async fn get_calendar_month(
    State(state): State<AppState>,
    Query(query): Query<CalendarMonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/month - query: {:?}", query);

    match build_month(&state, &query).await {
        Ok(calendar_month) => (StatusCode::OK, Json(calendar_month)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get the current civil date
async fn get_current_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/current-date");

    let current_date = state.calendar_service.get_current_date();
    (StatusCode::OK, Json(current_date)).into_response()
}

/// Get the current focus date for calendar navigation
async fn get_focus_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/focus-date");

    match state.calendar_service.get_focus_date() {
        Ok(focus_date) => (StatusCode::OK, Json(focus_date)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn focus_response(state: &AppState, focus_date: CalendarFocusDate, verb: &str) -> UpdateCalendarFocusResponse {
    let success_message = format!(
        "{} {} {}",
        verb,
        state.calendar_service.month_name(focus_date.month),
        focus_date.year
    );
    UpdateCalendarFocusResponse {
        focus_date,
        success_message,
    }
}

/// Set the focus date for calendar navigation
async fn set_focus_date(
    State(state): State<AppState>,
    Json(request): Json<UpdateCalendarFocusRequest>,
) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date - request: {:?}", request);

    match state.calendar_service.set_focus_date(request.month, request.year) {
        Ok(focus_date) => {
            let response = focus_response(&state, focus_date, "Calendar focus set to");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Navigate to the previous month
async fn navigate_previous_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date/previous");

    match state.calendar_service.navigate_previous_month() {
        Ok(focus_date) => {
            let response = focus_response(&state, focus_date, "Navigated to");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Navigate to the next month
async fn navigate_next_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date/next");

    match state.calendar_service.navigate_next_month() {
        Ok(focus_date) => {
            let response = focus_response(&state, focus_date, "Navigated to");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
