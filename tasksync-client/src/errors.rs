use tasksync_core::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote service returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to acquire lock: {0}")]
    LockError(String),
}

impl ClientError {
    /// True for failures raised by the remote service boundary.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::RemoteStatus { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::RemoteStatus { status: 404, .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
