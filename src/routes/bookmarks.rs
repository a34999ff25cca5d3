//! Local bookmark collection API routes

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::BookmarkRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::sync::{is_valid_bookmark_url, BookmarksData, DeleteActionType};

/// Create the bookmarks router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_bookmarks)
                .put(upsert_bookmarks)
                .delete(delete_bookmarks),
        )
        .route("/restore", post(restore_bookmarks))
}

/// A list of bookmark URLs
#[derive(Debug, Deserialize)]
pub struct UrlList {
    pub urls: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    /// Remove rows instead of writing tombstones
    #[serde(default)]
    pub purge: bool,
}

/// Number of bookmarks a write touched
#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub affected: u64,
}

/// List all bookmarks
async fn list_bookmarks(State(state): State<AppState>) -> Result<Json<BookmarksData>> {
    let repo = BookmarkRepository::new(state.db());
    Ok(Json(repo.list().await?))
}

/// Insert or replace bookmarks
async fn upsert_bookmarks(
    State(state): State<AppState>,
    Json(records): Json<BookmarksData>,
) -> Result<Json<WriteResponse>> {
    let invalid: Vec<&str> = records
        .keys()
        .map(String::as_str)
        .filter(|url| !is_valid_bookmark_url(url))
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Invalid bookmark URLs: {}",
            invalid.join(", ")
        )));
    }

    let repo = BookmarkRepository::new(state.db());
    repo.save_all(&records).await?;
    Ok(Json(WriteResponse {
        affected: records.len() as u64,
    }))
}

/// Delete bookmarks, as tombstones unless `purge` is set
async fn delete_bookmarks(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
    Json(list): Json<UrlList>,
) -> Result<Json<WriteResponse>> {
    let repo = BookmarkRepository::new(state.db());

    if params.purge {
        let affected = repo.remove_all(&list.urls).await?;
        return Ok(Json(WriteResponse { affected }));
    }

    let action_type = if list.urls.len() > 1 {
        DeleteActionType::BatchDelete
    } else {
        DeleteActionType::Delete
    };
    let now = Utc::now().timestamp_millis();

    let mut tombstones = BookmarksData::new();
    for url in &list.urls {
        if let Some(mut record) = repo.get(url).await? {
            record.mark_deleted(action_type, now);
            tombstones.insert(url.clone(), record);
        }
    }
    repo.save_all(&tombstones).await?;

    Ok(Json(WriteResponse {
        affected: tombstones.len() as u64,
    }))
}

/// Undo soft deletions
async fn restore_bookmarks(
    State(state): State<AppState>,
    Json(list): Json<UrlList>,
) -> Result<Json<WriteResponse>> {
    let repo = BookmarkRepository::new(state.db());
    let now = Utc::now().timestamp_millis();

    let mut restored = BookmarksData::new();
    for url in &list.urls {
        if let Some(mut record) = repo.get(url).await? {
            if record.is_deleted() {
                record.restore(now);
                restored.insert(url.clone(), record);
            }
        }
    }
    repo.save_all(&restored).await?;

    Ok(Json(WriteResponse {
        affected: restored.len() as u64,
    }))
}
