//! Sync documents stored as private GitHub gists.
//!
//! Each document is a gist holding a single `schedule-data.json` file.
//! Requests authenticate with `Authorization: token <token>`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use crate::backend::domain::error::{ScheduleError, ScheduleResult};
use crate::backend::storage::traits::CloudDocumentStore;

pub const DEFAULT_GIST_API_BASE: &str = "https://api.github.com";
pub const SYNC_FILE_NAME: &str = "schedule-data.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("schedule-logger/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Gist {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GistDocumentStore {
    client: Client,
    api_base: String,
}

impl GistDocumentStore {
    pub fn new(api_base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build gist API client")?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    /// Send and map failures onto the sync error kinds
    async fn send(request: RequestBuilder, what: &str) -> ScheduleResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ScheduleError::NetworkFailure(format!("{what}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ScheduleError::AuthFailure(format!("{what}: {message}"))
            }
            StatusCode::NOT_FOUND => ScheduleError::RemoteNotFound(format!("{what}: {message}")),
            _ => ScheduleError::NetworkFailure(format!("{what}: {status} {message}")),
        })
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response, what: &str) -> ScheduleResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ScheduleError::NetworkFailure(format!("{what}: unexpected response: {e}")))
    }

    fn document_body(content: &str) -> serde_json::Value {
        json!({ SYNC_FILE_NAME: { "content": content } })
    }
}

#[async_trait]
impl CloudDocumentStore for GistDocumentStore {
    async fn create(&self, token: &str, description: &str, content: &str) -> ScheduleResult<String> {
        let body = json!({
            "description": description,
            "public": false,
            "files": Self::document_body(content),
        });
        let request = self
            .authorized(self.client.post(format!("{}/gists", self.api_base)), token)
            .json(&body);

        let gist: Gist = Self::parse(Self::send(request, "Create gist").await?, "Create gist").await?;
        debug!("Created gist {}", gist.id);
        Ok(gist.id)
    }

    async fn update(&self, token: &str, id: &str, content: &str) -> ScheduleResult<()> {
        let body = json!({ "files": Self::document_body(content) });
        let request = self
            .authorized(self.client.patch(format!("{}/gists/{}", self.api_base, id)), token)
            .json(&body);

        Self::send(request, "Update gist").await?;
        debug!("Updated gist {}", id);
        Ok(())
    }

    async fn read(&self, token: &str, id: &str) -> ScheduleResult<String> {
        let request = self.authorized(self.client.get(format!("{}/gists/{}", self.api_base, id)), token);
        let mut gist: Gist = Self::parse(Self::send(request, "Read gist").await?, "Read gist").await?;

        let file = gist.files.remove(SYNC_FILE_NAME).ok_or_else(|| {
            ScheduleError::RemoteNotFound(format!("gist {id} has no {SYNC_FILE_NAME}"))
        })?;

        match (file.content, file.truncated, file.raw_url) {
            (Some(content), false, _) => Ok(content),
            // Large files come back truncated; the raw URL has the full text
            (_, _, Some(raw_url)) => {
                let request = self.authorized(self.client.get(raw_url), token);
                Self::send(request, "Read gist file")
                    .await?
                    .text()
                    .await
                    .map_err(|e| ScheduleError::NetworkFailure(format!("Read gist file: {e}")))
            }
            (Some(content), true, None) => Ok(content),
            (None, _, None) => Err(ScheduleError::RemoteNotFound(format!(
                "gist {id} has an empty {SYNC_FILE_NAME}"
            ))),
        }
    }

    async fn list_by_description(&self, token: &str, description: &str) -> ScheduleResult<Vec<String>> {
        let request = self
            .authorized(self.client.get(format!("{}/gists", self.api_base)), token)
            .query(&[("per_page", "100")]);
        let gists: Vec<Gist> = Self::parse(Self::send(request, "List gists").await?, "List gists").await?;

        Ok(gists
            .into_iter()
            .filter(|gist| {
                gist.description.as_deref() == Some(description) && gist.files.contains_key(SYNC_FILE_NAME)
            })
            .map(|gist| gist.id)
            .collect())
    }

    async fn validate_token(&self, token: &str) -> ScheduleResult<()> {
        let request = self.authorized(self.client.get(format!("{}/user", self.api_base)), token);
        Self::send(request, "Validate token").await?;
        Ok(())
    }
}
