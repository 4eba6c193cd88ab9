//! Public holiday lookups backed by the holiday cache.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Datelike;
use log::info;
use shared::HolidayListResponse;

use super::mappers::HolidayMapper;
use crate::backend::domain::civil_time;
use crate::backend::domain::error::ScheduleResult;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:year", get(get_holidays))
        .route("/refresh", post(refresh_holidays))
}

async fn get_holidays(State(state): State<AppState>, Path(year): Path<i32>) -> impl IntoResponse {
    info!("GET /api/holidays/{}", year);

    match state.holiday_cache.ensure_year(year).await {
        Ok(holidays) => {
            let response = HolidayListResponse {
                year,
                holidays: HolidayMapper::to_dto_list(holidays),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn reload_current_year(state: &AppState) -> ScheduleResult<HolidayListResponse> {
    state.holiday_cache.invalidate()?;
    state.holiday_cache.preload().await?;

    let year = civil_time::today().year();
    Ok(HolidayListResponse {
        year,
        holidays: HolidayMapper::to_dto_list(state.holiday_cache.holidays_for_year(year)?),
    })
}

/// Drop every cached year and fetch the current and next year again
async fn refresh_holidays(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/holidays/refresh");

    match reload_current_year(&state).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}
