use thiserror::Error;

/// Every failure a schedule operation can surface to its caller.
///
/// Operations fail fast and apply nothing when they return one of these.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),
    #[error("A category named '{0}' already exists")]
    DuplicateCategory(String),
    #[error("Category id '{id}' derived from '{name}' is already taken")]
    DuplicateCategoryId { id: String, name: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    #[error("Sync credential rejected: {0}")]
    AuthFailure(String),
    #[error("Remote document not found: {0}")]
    RemoteNotFound(String),
    #[error("Cloud sync is not set up")]
    SyncDisabled,
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ScheduleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScheduleError::Validation(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ScheduleError::NotFound(resource.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::Validation(_) => "validation_error",
            ScheduleError::DuplicateCategory(_) => "duplicate_category",
            ScheduleError::DuplicateCategoryId { .. } => "duplicate_category_id",
            ScheduleError::NotFound(_) => "not_found",
            ScheduleError::NetworkFailure(_) => "network_failure",
            ScheduleError::AuthFailure(_) => "auth_failure",
            ScheduleError::RemoteNotFound(_) => "remote_not_found",
            ScheduleError::SyncDisabled => "sync_disabled",
            ScheduleError::Storage(_) => "storage_error",
        }
    }
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
