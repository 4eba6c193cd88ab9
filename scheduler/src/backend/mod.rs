//! # Backend Module
//!
//! All non-UI logic of the schedule logger.
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (activity store, calendar, holidays, settings, sync)
//!     ↓
//! Storage Layer (JSON/YAML files, holiday API, gist API)
//! ```
//!
//! The binary builds an [`AppState`] with [`initialize_backend`] and serves
//! [`create_router`].

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::domain::{
    ActivityStore, CalendarService, HolidayCache, ScheduleResult, SettingsService, SyncService,
};
use crate::backend::io::rest::{
    activity_apis, calendar_apis, category_apis, duration_apis, holiday_apis, settings_apis, sync_apis,
};
use crate::backend::storage::json::{HolidayRepository, JsonConnection, ScheduleRepository, SettingsRepository};
use crate::backend::storage::remote::{GistDocumentStore, NagerHolidaySource};
use crate::backend::storage::{CloudDocumentStore, HolidaySource, HolidayStorage, ScheduleStorage, SettingsStorage};
use crate::config::AppConfig;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub activity_store: ActivityStore,
    pub calendar_service: CalendarService,
    pub holiday_cache: HolidayCache,
    pub settings_service: SettingsService,
    pub sync_service: SyncService,
}

/// Storage and remote collaborators the services are built on
pub struct Collaborators {
    pub schedule_storage: Arc<dyn ScheduleStorage>,
    pub holiday_storage: Arc<dyn HolidayStorage>,
    pub settings_storage: Arc<dyn SettingsStorage>,
    pub holiday_source: Arc<dyn HolidaySource>,
    pub cloud_store: Arc<dyn CloudDocumentStore>,
}

/// Wire up file storage in the configured data directory and the real HTTP collaborators
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up storage in {}", config.data_dir.display());
    let connection = JsonConnection::new(&config.data_dir)?;

    let collaborators = Collaborators {
        schedule_storage: Arc::new(ScheduleRepository::new(connection.clone())),
        holiday_storage: Arc::new(HolidayRepository::new(connection.clone())),
        settings_storage: Arc::new(SettingsRepository::new(connection)),
        holiday_source: Arc::new(NagerHolidaySource::new(&config.holiday_api_base)?),
        cloud_store: Arc::new(GistDocumentStore::new(&config.cloud_api_base)?),
    };

    initialize_with(collaborators).context("Failed to load saved state")
}

pub fn initialize_with(collaborators: Collaborators) -> ScheduleResult<AppState> {
    info!("Setting up domain model");
    let activity_store = ActivityStore::load(collaborators.schedule_storage)?;
    let holiday_cache = HolidayCache::load(collaborators.holiday_source, collaborators.holiday_storage)?;
    let settings_service = SettingsService::load(collaborators.settings_storage)?;
    let sync_service = SyncService::new(
        collaborators.cloud_store,
        activity_store.clone(),
        settings_service.clone(),
    );

    Ok(AppState {
        activity_store,
        calendar_service: CalendarService::new(),
        holiday_cache,
        settings_service,
        sync_service,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{cors_origin}'"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(activity_apis::router())
        .merge(category_apis::router())
        .nest("/calendar", calendar_apis::router())
        .nest("/holidays", holiday_apis::router())
        .nest("/settings", settings_apis::router())
        .nest("/sync", sync_apis::router())
        .nest("/duration", duration_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::backend::domain::holiday_cache::tests::FakeHolidaySource;
    use crate::backend::domain::sync_service::tests::FakeCloudStore;
    use crate::backend::storage::json::test_utils::TestEnvironment;

    /// A router over file storage in a temp directory with fake remote collaborators
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        pub cloud: Arc<FakeCloudStore>,
        pub env: TestEnvironment,
    }

    impl TestApp {
        pub fn with_holiday_source(source: FakeHolidaySource) -> Self {
            let env = TestEnvironment::new().unwrap();
            let cloud = Arc::new(FakeCloudStore::default());
            let connection = env.connection.clone();

            let state = initialize_with(Collaborators {
                schedule_storage: Arc::new(ScheduleRepository::new(connection.clone())),
                holiday_storage: Arc::new(HolidayRepository::new(connection.clone())),
                settings_storage: Arc::new(SettingsRepository::new(connection)),
                holiday_source: Arc::new(source),
                cloud_store: cloud.clone(),
            })
            .unwrap();
            let router = create_router(state.clone(), "http://localhost:8080").unwrap();

            Self { router, state, cloud, env }
        }

        pub fn new() -> Self {
            Self::with_holiday_source(FakeHolidaySource::failing())
        }
    }
}
