//! Sync API endpoints
//!
//! Provides the stateless merge engine and server-side sync cycles.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::BookmarkRepository;
use crate::error::Result;
use crate::state::AppState;
use crate::sync::{
    merge_async, BookmarksData, MergeResult, MergeStrategy, RemoteCollectionRepository,
    SyncOption, SyncReport, SyncRepository, SyncStatus,
};

/// Create the sync router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/merge", post(merge_collections))
        .route("/:target", post(sync_target).delete(reset_target))
        .route("/:target/status", get(get_sync_status))
}

/// Request to merge two collections
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default)]
    pub local_data: Option<BookmarksData>,
    #[serde(default)]
    pub remote_data: Option<BookmarksData>,
    /// Required; a missing strategy is rejected
    #[serde(default)]
    pub strategy: Option<MergeStrategy>,
    pub sync_option: SyncOption,
}

/// Request to sync with a target
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Overrides the configured default strategy
    #[serde(default)]
    pub strategy: Option<MergeStrategy>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub reset: bool,
}

/// Merge two collections without touching any stored data
async fn merge_collections(Json(req): Json<MergeRequest>) -> Result<Json<MergeResult>> {
    let result = merge_async(
        req.local_data.as_ref(),
        req.remote_data.as_ref(),
        req.strategy.as_ref(),
        &req.sync_option,
    )
    .await?;

    Ok(Json(result))
}

/// Sync the local collection with a remote target
async fn sync_target(
    State(state): State<AppState>,
    Path(target): Path<String>,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncReport>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let strategy = req
        .strategy
        .unwrap_or_else(|| state.config().sync.default_strategy.clone());

    let store = BookmarkRepository::new(state.db());
    let remote = RemoteCollectionRepository::new(state.db(), &target);
    let sync_state = SyncRepository::new(state.db());

    let report = state
        .sync_manager()
        .sync(&target, &store, &remote, &sync_state, &strategy)
        .await?;

    Ok(Json(report))
}

/// Forget when a target was last synced
async fn reset_target(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<ResetResponse>> {
    let reset = SyncRepository::new(state.db()).reset(&target).await?;
    Ok(Json(ResetResponse { reset }))
}

/// Get sync status for a target
async fn get_sync_status(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<SyncStatus>> {
    let mut status = SyncRepository::new(state.db()).get_status(&target).await?;
    status.in_progress = state.sync_manager().is_in_progress(&target);
    Ok(Json(status))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::db::create_memory_pool;
    use crate::routes::app;

    const HOUR: i64 = 60 * 60 * 1000;
    const T: i64 = 1_710_000_000_000;

    async fn test_state() -> AppState {
        let pool = create_memory_pool().await.unwrap();
        AppState::new(Config::default(), pool)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_merge_endpoint() {
        let state = test_state().await;
        let url = "https://example.com/page";
        let body = serde_json::json!({
            "localData": {
                url: { "tags": ["tag1"], "meta": { "created": T - HOUR, "updated": T - HOUR, "title": "Local" } }
            },
            "remoteData": {
                url: { "tags": ["tag2"], "meta": { "created": T - HOUR, "updated": T - HOUR + 1, "title": "Remote" } }
            },
            "strategy": { "meta": "newer", "tags": "union" },
            "syncOption": { "currentSyncTime": T, "lastSyncTime": T - 2 * HOUR }
        });

        let response = app(state)
            .oneshot(post_json("/api/v1/sync/merge", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let merged = &json["updatesForLocal"][url];
        assert_eq!(merged["tags"], serde_json::json!(["tag1", "tag2"]));
        assert_eq!(merged["meta"]["title"], "Remote");
        assert_eq!(merged["meta"]["updated3"], T - HOUR + 2);
        assert_eq!(json["localDeletions"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_merge_endpoint_requires_strategy() {
        let state = test_state().await;
        let body = serde_json::json!({
            "syncOption": { "currentSyncTime": T, "lastSyncTime": T - HOUR }
        });

        let response = app(state)
            .oneshot(post_json("/api/v1/sync/merge", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "merge_error");
    }

    #[tokio::test]
    async fn test_sync_target_and_status() {
        let state = test_state().await;
        let url = "https://example.com/";
        let mut records = BookmarksData::new();
        records.insert(
            url.to_string(),
            crate::sync::BookmarkRecord::new(vec!["a".into()], T),
        );
        BookmarkRepository::new(state.db())
            .save_all(&records)
            .await
            .unwrap();

        let response = app(state.clone())
            .oneshot(post_json("/api/v1/sync/laptop", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["remoteUpdates"], 1);
        assert_eq!(report["remoteMeta"]["version"], 1);

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/sync/laptop/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["target"], "laptop");
        assert_eq!(status["inProgress"], false);
        assert_eq!(status["lastReport"]["remoteUpdates"], 1);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/sync/laptop")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await["reset"], true);
    }
}
