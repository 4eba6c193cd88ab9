use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use shared::{AppTitleResponse, UpdateAppTitleRequest};

use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/title", get(get_title).put(set_title))
}

async fn get_title(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/title");

    match state.settings_service.app_title() {
        Ok(title) => (StatusCode::OK, Json(AppTitleResponse { title })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn set_title(
    State(state): State<AppState>,
    Json(request): Json<UpdateAppTitleRequest>,
) -> impl IntoResponse {
    info!("PUT /api/settings/title - request: {:?}", request);

    match state.settings_service.set_app_title(&request.title) {
        Ok(title) => (StatusCode::OK, Json(AppTitleResponse { title })).into_response(),
        Err(e) => e.into_response(),
    }
}
