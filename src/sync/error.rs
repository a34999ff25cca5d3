//! Sync error types

use thiserror::Error;

use super::types::RemoteMeta;

/// Errors returned by the merge engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Merge strategy is required")]
    MissingStrategy,
}

/// Errors returned by a sync cycle
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Sync already in progress for target: {0}")]
    InProgress(String),

    #[error("Remote collection changed during sync (expected {expected:?}, found {actual:?})")]
    RemoteConflict {
        expected: Option<RemoteMeta>,
        actual: Option<RemoteMeta>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sync storage and cycles
pub type Result<T> = std::result::Result<T, SyncError>;
