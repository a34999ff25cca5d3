//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::BookmarkRepository;
use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub bookmarks: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let bookmarks = BookmarkRepository::new(state.db()).count().await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "bookmark-sync-server",
        bookmarks,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
