//! Error types for the Bookmark Sync server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::sync::{MergeError, SyncError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Merge(e) => (StatusCode::BAD_REQUEST, "merge_error", e.to_string()),
            AppError::Sync(e) => match e {
                SyncError::Merge(e) => (StatusCode::BAD_REQUEST, "merge_error", e.to_string()),
                SyncError::InProgress(_) => (StatusCode::CONFLICT, "sync_in_progress", e.to_string()),
                SyncError::RemoteConflict { .. } => {
                    (StatusCode::CONFLICT, "remote_conflict", e.to_string())
                }
                SyncError::Database(_) | SyncError::Serialization(_) => {
                    tracing::error!("Sync storage error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "sync_error",
                        "Sync storage error".to_string(),
                    )
                }
            },
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    "Failed to encode data".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
