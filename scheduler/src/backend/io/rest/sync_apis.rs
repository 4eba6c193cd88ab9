//! Cloud sync endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use log::info;
use shared::{SyncResultResponse, SyncSetupRequest, SyncStatusResponse};

use crate::backend::domain::SyncStatus;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", delete(disconnect))
        .route("/status", get(get_status))
        .route("/setup", post(setup))
        .route("/upload", post(upload))
        .route("/download", post(download))
}

fn status_to_dto(status: SyncStatus) -> SyncStatusResponse {
    SyncStatusResponse {
        summary: status.summary(),
        enabled: status.enabled,
        connected: status.connected,
        last_sync: status.last_sync.map(|at| at.to_rfc3339()),
        activity_count: status.activity_count,
    }
}

fn result_response(status: SyncStatus, success_message: String) -> axum::response::Response {
    let response = SyncResultResponse {
        status: status_to_dto(status),
        success_message,
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/sync/status");

    match state.sync_service.status() {
        Ok(status) => (StatusCode::OK, Json(status_to_dto(status))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn setup(State(state): State<AppState>, Json(request): Json<SyncSetupRequest>) -> impl IntoResponse {
    // The token itself is never logged
    info!("POST /api/sync/setup");

    match state.sync_service.setup(&request.token).await {
        Ok(status) => result_response(status, "Sync setup complete".to_string()),
        Err(e) => e.into_response(),
    }
}

async fn upload(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/sync/upload");

    match state.sync_service.upload().await {
        Ok(status) => {
            let message = format!("Uploaded {} activities to the cloud", status.activity_count);
            result_response(status, message)
        }
        Err(e) => e.into_response(),
    }
}

async fn download(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/sync/download");

    match state.sync_service.download().await {
        Ok(status) => {
            let message = format!("Downloaded {} activities from the cloud", status.activity_count);
            result_response(status, message)
        }
        Err(e) => e.into_response(),
    }
}

async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/sync");

    match state.sync_service.disconnect().await {
        Ok(status) => result_response(status, "Sync disconnected".to_string()),
        Err(e) => e.into_response(),
    }
}
