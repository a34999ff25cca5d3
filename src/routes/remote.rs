//! Remote collection API routes
//!
//! Lets sync clients use this server as their remote replica: download a
//! collection with its version stamp, merge locally, upload the result.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;
use crate::sync::{BookmarksData, RemoteCollectionRepository, RemoteMeta, RemoteSnapshot, SyncTransport};

/// Create the remote collection router
pub fn router() -> Router<AppState> {
    Router::new().route("/:target", get(download).put(upload))
}

/// Upload request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub data: BookmarksData,
    /// Meta returned by the download this upload is based on
    #[serde(default)]
    pub expected_meta: Option<RemoteMeta>,
}

/// Download a remote collection
async fn download(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<RemoteSnapshot>> {
    let remote = RemoteCollectionRepository::new(state.db(), &target);
    Ok(Json(remote.download().await?))
}

/// Replace a remote collection
async fn upload(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<RemoteMeta>> {
    let remote = RemoteCollectionRepository::new(state.db(), &target);
    let meta = remote.upload(&req.data, req.expected_meta.as_ref()).await?;
    Ok(Json(meta))
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

    fn put(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_requires_current_meta() {
        let pool = create_memory_pool().await.unwrap();
        let state = AppState::new(Config::default(), pool);
        let data = serde_json::json!({
            "https://example.com/": { "tags": ["a"], "meta": { "created": 1, "updated": 1 } }
        });

        let response = app(state.clone())
            .oneshot(put("/api/v1/remote/laptop", serde_json::json!({ "data": data })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Second upload without the meta from the first is stale
        let response = app(state.clone())
            .oneshot(put("/api/v1/remote/laptop", serde_json::json!({ "data": data })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/remote/laptop")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let snapshot: RemoteSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot.meta.map(|m| m.version), Some(1));
        assert_eq!(snapshot.data.len(), 1);
    }
}
