use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use shared::DurationFormatResponse;

use crate::backend::domain::duration;
use crate::backend::AppState;

#[derive(Debug, Deserialize)]
pub struct DurationQuery {
    pub minutes: u32,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/format", get(format_duration))
}

/// Display string and edit-form value for a stored duration
async fn format_duration(Query(query): Query<DurationQuery>) -> impl IntoResponse {
    info!("GET /api/duration/format - query: {:?}", query);

    let response = DurationFormatResponse {
        minutes: query.minutes,
        display: duration::format(query.minutes),
        input: duration::denormalize(query.minutes),
    };
    (StatusCode::OK, Json(response))
}
