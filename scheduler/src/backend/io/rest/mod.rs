//! # REST API Interface Layer
//!
//! HTTP endpoints for the schedule logger, all nested under `/api`.
//! Handlers translate JSON into domain calls and domain errors into
//! status codes; no business rules live here.
//!
//! Every failing endpoint answers with [`shared::ErrorResponse`].

pub mod activity_apis;
pub mod calendar_apis;
pub mod category_apis;
pub mod duration_apis;
pub mod holiday_apis;
pub mod mappers;
pub mod settings_apis;
pub mod sync_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};
use shared::ErrorResponse;

use crate::backend::domain::ScheduleError;

impl ScheduleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
            ScheduleError::DuplicateCategory(_) | ScheduleError::DuplicateCategoryId { .. } => {
                StatusCode::CONFLICT
            }
            ScheduleError::NotFound(_) | ScheduleError::RemoteNotFound(_) => StatusCode::NOT_FOUND,
            ScheduleError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            ScheduleError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
            ScheduleError::SyncDisabled => StatusCode::PRECONDITION_FAILED,
            ScheduleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScheduleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tower::ServiceExt;

    pub async fn send(app: &Router, method: Method, uri: &str, body: Option<impl Serialize>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
        let (status, body) = send(app, Method::GET, uri, None::<()>).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn call<T: DeserializeOwned>(
        app: &Router,
        method: Method,
        uri: &str,
        body: impl Serialize,
    ) -> (StatusCode, T) {
        let (status, body) = send(app, method, uri, Some(body)).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}
