use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    uptime_seconds: i64,
    cached_cards: usize,
    version: String,
}

/// Health check endpoint.
///
/// The store is in-process, so reachability reduces to reporting its
/// size; a future database-backed store would ping here.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let uptime_seconds = (chrono::Utc::now() - state.started_at).num_seconds();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            uptime_seconds,
            cached_cards: state.store.cached_card_count(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
