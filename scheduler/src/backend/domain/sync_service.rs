//! Cloud sync.
//!
//! The whole data set (activities, categories, app title) travels as one
//! pretty-printed JSON document in a private remote document. Upload always
//! overwrites the remote copy and download always overwrites the local one;
//! there is no merging, the last writer wins.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use shared::SyncPayload;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::activity_store::ActivityStore;
use super::civil_time;
use super::error::{ScheduleError, ScheduleResult};
use super::models::activity::Activity;
use super::models::category::Category;
use super::models::settings::{AppSettings, DEFAULT_APP_TITLE};
use super::settings_service::SettingsService;
use crate::backend::storage::CloudDocumentStore;

/// Description the sync document is created with and looked up by
pub const SYNC_DOCUMENT_DESCRIPTION: &str = "Schedule App Data";

#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub enabled: bool,
    /// A remote document is linked
    pub connected: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub activity_count: usize,
}

impl SyncStatus {
    /// One-line status, e.g. "Sync: Connected | Last: ... | Activities: 4"
    pub fn summary(&self) -> String {
        if !self.enabled {
            return format!("Sync: Not enabled | Activities: {}", self.activity_count);
        }
        let last = self
            .last_sync
            .map(civil_time::format_display)
            .unwrap_or_else(|| "Never".to_string());
        format!(
            "Sync: {} | Last: {} | Activities: {}",
            if self.connected { "Connected" } else { "Setup" },
            last,
            self.activity_count
        )
    }
}

#[derive(Clone)]
pub struct SyncService {
    cloud: Arc<dyn CloudDocumentStore>,
    store: ActivityStore,
    settings: SettingsService,
    /// Held for the whole of a sync call so calls never interleave
    in_flight: Arc<AsyncMutex<()>>,
}

impl SyncService {
    pub fn new(cloud: Arc<dyn CloudDocumentStore>, store: ActivityStore, settings: SettingsService) -> Self {
        Self {
            cloud,
            store,
            settings,
            in_flight: Arc::new(AsyncMutex::new(())),
        }
    }

    pub fn status(&self) -> ScheduleResult<SyncStatus> {
        let settings = self.settings.settings()?;
        Ok(SyncStatus {
            enabled: settings.sync_enabled(),
            connected: settings.sync_enabled() && settings.remote_document_id.is_some(),
            last_sync: settings.last_sync,
            activity_count: self.store.activity_count()?,
        })
    }

    fn require_token(settings: &AppSettings) -> ScheduleResult<String> {
        settings.sync_token.clone().ok_or(ScheduleError::SyncDisabled)
    }

    /// Check the token with the cloud store and enable sync with it
    pub async fn setup(&self, token: &str) -> ScheduleResult<SyncStatus> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ScheduleError::validation("Sync token is required"));
        }

        let _guard = self.in_flight.lock().await;
        self.cloud.validate_token(token).await?;
        self.settings.store_credentials(token)?;
        info!("Cloud sync enabled");
        self.status()
    }

    fn build_payload(&self, settings: &AppSettings, last_modified: DateTime<Utc>) -> ScheduleResult<String> {
        let (activities, categories) = self.store.snapshot()?;
        let payload = SyncPayload {
            activities: activities.into_iter().map(Into::into).collect(),
            categories: Some(categories.into_iter().map(Into::into).collect()),
            app_title: Some(settings.app_title.clone()),
            last_modified: last_modified.to_rfc3339(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| ScheduleError::Storage(e.into()))
    }

    /// Push the local data set, creating the remote document on first use.
    ///
    /// A linked document that was deleted remotely is replaced by a new one.
    pub async fn upload(&self) -> ScheduleResult<SyncStatus> {
        let _guard = self.in_flight.lock().await;
        let settings = self.settings.settings()?;
        let token = Self::require_token(&settings)?;
        let content = self.build_payload(&settings, Utc::now())?;

        let updated = match &settings.remote_document_id {
            Some(id) => match self.cloud.update(&token, id, &content).await {
                Ok(()) => {
                    info!("Uploaded schedule to remote document {}", id);
                    true
                }
                Err(ScheduleError::RemoteNotFound(_)) => {
                    warn!("Remote document {} no longer exists, creating a new one", id);
                    self.settings.unlink_remote_document()?;
                    false
                }
                Err(e) => return Err(e),
            },
            None => false,
        };

        if !updated {
            let id = self
                .cloud
                .create(&token, SYNC_DOCUMENT_DESCRIPTION, &content)
                .await?;
            self.settings.link_remote_document(&id)?;
            info!("Created remote document {} for schedule", id);
        }

        self.settings.record_sync(Utc::now())?;
        self.status()
    }

    /// Replace local data with the remote document.
    ///
    /// Without a linked document the caller's documents are searched for one
    /// carrying the sync description. The document is fully validated before
    /// anything local changes. A linked document that was deleted remotely is
    /// unlinked, so the next upload creates a fresh one.
    pub async fn download(&self) -> ScheduleResult<SyncStatus> {
        let _guard = self.in_flight.lock().await;
        let settings = self.settings.settings()?;
        let token = Self::require_token(&settings)?;

        let id = match settings.remote_document_id.clone() {
            Some(id) => id,
            None => self
                .cloud
                .list_by_description(&token, SYNC_DOCUMENT_DESCRIPTION)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    ScheduleError::RemoteNotFound("no synced schedule exists yet".to_string())
                })?,
        };

        let content = match self.cloud.read(&token, &id).await {
            Ok(content) => content,
            Err(ScheduleError::RemoteNotFound(missing)) => {
                if settings.remote_document_id.is_some() {
                    warn!("Linked remote document {} no longer exists, unlinking it", id);
                    self.settings.unlink_remote_document()?;
                }
                return Err(ScheduleError::RemoteNotFound(missing));
            }
            Err(e) => return Err(e),
        };
        let payload: SyncPayload = serde_json::from_str(&content)
            .map_err(|e| ScheduleError::validation(format!("Remote document is not a schedule: {e}")))?;

        let activities = payload
            .activities
            .into_iter()
            .map(Activity::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ScheduleError::validation(format!("Remote activity rejected: {e:#}")))?;
        let categories = match payload.categories {
            Some(categories) => categories
                .into_iter()
                .map(Category::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ScheduleError::validation(format!("Remote category rejected: {e:#}")))?,
            None => Category::defaults(),
        };
        Category::validate_set(&categories)
            .map_err(|e| ScheduleError::validation(format!("Remote categories rejected: {e:#}")))?;
        let title = payload
            .app_title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_TITLE.to_string());
        let last_modified = DateTime::parse_from_rfc3339(&payload.last_modified)
            .map_err(|e| ScheduleError::validation(format!("Remote lastModified is invalid: {e}")))?
            .with_timezone(&Utc);

        let activity_count = activities.len();
        self.settings.apply_download(&title, &id, last_modified)?;
        if let Err(e) = self.store.replace_all(activities, categories) {
            if let Err(restore_error) = self.settings.restore(settings) {
                warn!("Could not restore settings after a failed download: {}", restore_error);
            }
            return Err(e);
        }

        info!("Downloaded {} activities from remote document {}", activity_count, id);
        self.status()
    }

    /// Forget the token and the linked document
    pub async fn disconnect(&self) -> ScheduleResult<SyncStatus> {
        let _guard = self.in_flight.lock().await;
        self.settings.clear_credentials()?;
        self.status()
    }

    /// One auto-sync round: upload when enabled, log and carry on otherwise
    pub async fn auto_sync_tick(&self) {
        match self.settings.settings() {
            Ok(settings) if settings.sync_enabled() => {}
            Ok(_) => {
                debug!("Auto-sync skipped, sync is not set up");
                return;
            }
            Err(e) => {
                warn!("Auto-sync could not read settings: {}", e);
                return;
            }
        }

        match self.upload().await {
            Ok(status) => info!("Auto-sync finished: {}", status.summary()),
            Err(e) => warn!("Auto-sync failed, retrying on the next tick: {}", e),
        }
    }

    /// Upload every `period` for as long as the runtime lives
    pub fn spawn_auto_sync(&self, period: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so startup does not upload
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.auto_sync_tick().await;
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::domain::activity_store::tests::MemoryScheduleStorage;
    use crate::backend::domain::civil_time::CivilDateTime;
    use crate::backend::domain::models::activity::ActivityDraft;
    use crate::backend::domain::settings_service::tests::MemorySettingsStorage;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) const VALID_TOKEN: &str = "ghp_valid";

    /// Cloud store holding documents in memory; accepts only [`VALID_TOKEN`]
    #[derive(Default)]
    pub(crate) struct FakeCloudStore {
        /// id -> (description, content)
        pub documents: Mutex<BTreeMap<String, (String, String)>>,
        pub writes: AtomicUsize,
        created: AtomicUsize,
    }

    impl FakeCloudStore {
        fn check(token: &str) -> ScheduleResult<()> {
            if token == VALID_TOKEN {
                Ok(())
            } else {
                Err(ScheduleError::AuthFailure("Bad credentials".to_string()))
            }
        }

        pub fn content_of(&self, id: &str) -> Option<String> {
            self.documents.lock().unwrap().get(id).map(|(_, content)| content.clone())
        }
    }

    #[async_trait]
    impl CloudDocumentStore for FakeCloudStore {
        async fn create(&self, token: &str, description: &str, content: &str) -> ScheduleResult<String> {
            Self::check(token)?;
            let mut documents = self.documents.lock().unwrap();
            let id = format!("doc-{}", self.created.fetch_add(1, Ordering::SeqCst) + 1);
            documents.insert(id.clone(), (description.to_string(), content.to_string()));
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(id)
        }

        async fn update(&self, token: &str, id: &str, content: &str) -> ScheduleResult<()> {
            Self::check(token)?;
            let mut documents = self.documents.lock().unwrap();
            let document = documents
                .get_mut(id)
                .ok_or_else(|| ScheduleError::RemoteNotFound(id.to_string()))?;
            document.1 = content.to_string();
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn read(&self, token: &str, id: &str) -> ScheduleResult<String> {
            Self::check(token)?;
            self.content_of(id)
                .ok_or_else(|| ScheduleError::RemoteNotFound(id.to_string()))
        }

        async fn list_by_description(&self, token: &str, description: &str) -> ScheduleResult<Vec<String>> {
            Self::check(token)?;
            Ok(self
                .documents
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|(_, (tag, _))| tag == description)
                .map(|(id, _)| id.clone())
                .collect())
        }

        async fn validate_token(&self, token: &str) -> ScheduleResult<()> {
            Self::check(token)
        }
    }

    struct Device {
        sync: SyncService,
        store: ActivityStore,
        settings: SettingsService,
        schedule_storage: Arc<MemoryScheduleStorage>,
    }

    fn device(cloud: Arc<FakeCloudStore>) -> Device {
        let schedule_storage = Arc::new(MemoryScheduleStorage::default());
        let store = ActivityStore::load(schedule_storage.clone()).unwrap();
        let settings = SettingsService::load(Arc::new(MemorySettingsStorage::default())).unwrap();
        let sync = SyncService::new(cloud, store.clone(), settings.clone());
        Device {
            sync,
            store,
            settings,
            schedule_storage,
        }
    }

    fn add_activity(store: &ActivityStore, title: &str) {
        let start = CivilDateTime::from_components(2025, 3, 10, 9, 0).unwrap();
        store
            .add(ActivityDraft::new(title, "study", start, Some(60), None).unwrap())
            .unwrap();
    }

    fn without_last_modified(content: &str) -> serde_json::Value {
        let mut value: serde_json::Value = serde_json::from_str(content).unwrap();
        value.as_object_mut().unwrap().remove("lastModified");
        value
    }

    #[tokio::test]
    async fn test_sync_calls_need_setup() {
        let device = device(Arc::new(FakeCloudStore::default()));
        assert!(matches!(device.sync.upload().await, Err(ScheduleError::SyncDisabled)));
        assert!(matches!(device.sync.download().await, Err(ScheduleError::SyncDisabled)));
    }

    #[tokio::test]
    async fn test_setup_rejects_bad_token() {
        let device = device(Arc::new(FakeCloudStore::default()));
        assert!(matches!(
            device.sync.setup("ghp_wrong").await,
            Err(ScheduleError::AuthFailure(_))
        ));
        assert!(matches!(device.sync.setup("  ").await, Err(ScheduleError::Validation(_))));
        assert!(!device.sync.status().unwrap().enabled);
    }

    #[tokio::test]
    async fn test_upload_creates_then_updates_one_document() {
        let cloud = Arc::new(FakeCloudStore::default());
        let device = device(cloud.clone());
        add_activity(&device.store, "Lecture");

        let status = device.sync.setup(VALID_TOKEN).await.unwrap();
        assert!(status.enabled);
        assert!(!status.connected);

        let status = device.sync.upload().await.unwrap();
        assert!(status.connected);
        assert!(status.last_sync.is_some());
        let first = cloud.content_of("doc-1").unwrap();
        assert!(first.contains("\n  \"activities\""), "content should be pretty printed");

        device.sync.upload().await.unwrap();
        let second = cloud.content_of("doc-1").unwrap();
        assert_eq!(cloud.documents.lock().unwrap().len(), 1);
        assert_eq!(cloud.writes.load(Ordering::SeqCst), 2);
        assert_eq!(without_last_modified(&first), without_last_modified(&second));
    }

    #[tokio::test]
    async fn test_download_on_second_device_replaces_everything() {
        let cloud = Arc::new(FakeCloudStore::default());
        let laptop = device(cloud.clone());
        add_activity(&laptop.store, "Lecture");
        add_activity(&laptop.store, "Seminar");
        laptop.store.add_category("Chores", crate::backend::domain::models::category::Rgb(0x112233)).unwrap();
        laptop.settings.set_app_title("Shared Plan").unwrap();
        laptop.sync.setup(VALID_TOKEN).await.unwrap();
        laptop.sync.upload().await.unwrap();

        let phone = device(cloud.clone());
        add_activity(&phone.store, "Local only");
        phone.sync.setup(VALID_TOKEN).await.unwrap();
        let status = phone.sync.download().await.unwrap();

        assert!(status.connected);
        assert_eq!(status.activity_count, 2);
        assert_eq!(phone.store.list().unwrap(), laptop.store.list().unwrap());
        assert_eq!(phone.store.categories().unwrap().len(), 6);
        assert_eq!(phone.settings.app_title().unwrap(), "Shared Plan");

        let payload: SyncPayload = serde_json::from_str(&cloud.content_of("doc-1").unwrap()).unwrap();
        let expected = DateTime::parse_from_rfc3339(&payload.last_modified).unwrap();
        assert_eq!(status.last_sync, Some(expected.with_timezone(&Utc)));
    }

    #[tokio::test]
    async fn test_download_without_remote_document() {
        let device = device(Arc::new(FakeCloudStore::default()));
        device.sync.setup(VALID_TOKEN).await.unwrap();
        assert!(matches!(
            device.sync.download().await,
            Err(ScheduleError::RemoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_download_fills_in_missing_fields() {
        let cloud = Arc::new(FakeCloudStore::default());
        cloud.documents.lock().unwrap().insert(
            "doc-1".to_string(),
            (
                SYNC_DOCUMENT_DESCRIPTION.to_string(),
                r#"{"lastModified": "2025-03-10T02:00:00.000Z"}"#.to_string(),
            ),
        );
        let device = device(cloud);
        add_activity(&device.store, "Will be replaced");
        device.settings.set_app_title("Old title").unwrap();
        device.sync.setup(VALID_TOKEN).await.unwrap();

        let status = device.sync.download().await.unwrap();
        assert_eq!(status.activity_count, 0);
        assert_eq!(device.store.categories().unwrap(), Category::defaults());
        assert_eq!(device.settings.app_title().unwrap(), DEFAULT_APP_TITLE);
    }

    #[tokio::test]
    async fn test_malformed_download_changes_nothing() {
        let cloud = Arc::new(FakeCloudStore::default());
        cloud.documents.lock().unwrap().insert(
            "doc-1".to_string(),
            (SYNC_DOCUMENT_DESCRIPTION.to_string(), "not json".to_string()),
        );
        let device = device(cloud);
        add_activity(&device.store, "Keep me");
        device.sync.setup(VALID_TOKEN).await.unwrap();

        assert!(matches!(device.sync.download().await, Err(ScheduleError::Validation(_))));
        assert_eq!(device.store.activity_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upload_replaces_deleted_remote_document() {
        let cloud = Arc::new(FakeCloudStore::default());
        let device = device(cloud.clone());
        add_activity(&device.store, "Lecture");
        device.sync.setup(VALID_TOKEN).await.unwrap();
        device.sync.upload().await.unwrap();

        cloud.documents.lock().unwrap().clear();
        let status = device.sync.upload().await.unwrap();
        assert!(status.connected);
        assert!(cloud.content_of("doc-2").unwrap().contains("Lecture"));
        assert_eq!(
            device.settings.settings().unwrap().remote_document_id.as_deref(),
            Some("doc-2")
        );
    }

    #[tokio::test]
    async fn test_download_of_deleted_document_unlinks_it() {
        let cloud = Arc::new(FakeCloudStore::default());
        let device = device(cloud.clone());
        add_activity(&device.store, "Lecture");
        device.sync.setup(VALID_TOKEN).await.unwrap();
        device.sync.upload().await.unwrap();

        cloud.documents.lock().unwrap().clear();
        assert!(matches!(
            device.sync.download().await,
            Err(ScheduleError::RemoteNotFound(_))
        ));
        assert!(!device.sync.status().unwrap().connected);
        assert_eq!(device.store.activity_count().unwrap(), 1);

        // Same token again, then a fresh document on upload
        device.sync.setup(VALID_TOKEN).await.unwrap();
        let status = device.sync.upload().await.unwrap();
        assert!(status.connected);
        assert!(cloud.content_of("doc-2").is_some());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_local_settings() {
        let cloud = Arc::new(FakeCloudStore::default());
        let laptop = device(cloud.clone());
        add_activity(&laptop.store, "Lecture");
        laptop.settings.set_app_title("Shared Plan").unwrap();
        laptop.sync.setup(VALID_TOKEN).await.unwrap();
        laptop.sync.upload().await.unwrap();

        let phone = device(cloud);
        phone.settings.set_app_title("Phone Plan").unwrap();
        phone.sync.setup(VALID_TOKEN).await.unwrap();
        phone.schedule_storage.fail_saves.store(true, Ordering::SeqCst);

        assert!(matches!(phone.sync.download().await, Err(ScheduleError::Storage(_))));
        assert_eq!(phone.settings.app_title().unwrap(), "Phone Plan");
        let settings = phone.settings.settings().unwrap();
        assert_eq!(settings.remote_document_id, None);
        assert_eq!(settings.last_sync, None);
        assert_eq!(phone.store.activity_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_download_rejects_duplicate_categories() {
        let cloud = Arc::new(FakeCloudStore::default());
        cloud.documents.lock().unwrap().insert(
            "doc-1".to_string(),
            (
                SYNC_DOCUMENT_DESCRIPTION.to_string(),
                r##"{
                    "activities": [],
                    "categories": [
                        {"id": "meals", "name": "Meals", "color": "#ffc107"},
                        {"id": "dinner", "name": "MEALS", "color": "#123456"}
                    ],
                    "lastModified": "2025-03-10T02:00:00.000Z"
                }"##
                .to_string(),
            ),
        );
        let device = device(cloud);
        add_activity(&device.store, "Keep me");
        device.sync.setup(VALID_TOKEN).await.unwrap();

        assert!(matches!(device.sync.download().await, Err(ScheduleError::Validation(_))));
        assert_eq!(device.store.activity_count().unwrap(), 1);
        assert_eq!(device.store.categories().unwrap(), Category::defaults());
    }

    #[tokio::test]
    async fn test_disconnect_and_summary() {
        let device = device(Arc::new(FakeCloudStore::default()));
        add_activity(&device.store, "Lecture");
        assert_eq!(
            device.sync.status().unwrap().summary(),
            "Sync: Not enabled | Activities: 1"
        );

        device.sync.setup(VALID_TOKEN).await.unwrap();
        assert_eq!(
            device.sync.status().unwrap().summary(),
            "Sync: Setup | Last: Never | Activities: 1"
        );

        let status = device.sync.upload().await.unwrap();
        assert!(status.summary().starts_with("Sync: Connected | Last: "));

        let status = device.sync.disconnect().await.unwrap();
        assert!(!status.enabled);
        assert!(!status.connected);
    }

    #[tokio::test]
    async fn test_auto_sync_tick_uploads_only_when_enabled() {
        let cloud = Arc::new(FakeCloudStore::default());
        let device = device(cloud.clone());

        device.sync.auto_sync_tick().await;
        assert_eq!(cloud.writes.load(Ordering::SeqCst), 0);

        device.sync.setup(VALID_TOKEN).await.unwrap();
        device.sync.auto_sync_tick().await;
        device.sync.auto_sync_tick().await;
        assert_eq!(cloud.writes.load(Ordering::SeqCst), 2);
        assert_eq!(cloud.documents.lock().unwrap().len(), 1);
    }
}
