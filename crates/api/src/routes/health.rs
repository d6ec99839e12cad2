use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Number of stored dashboards.
    pub dashboards: usize,
    /// Number of registered catalog nodes.
    pub catalog_nodes: usize,
}

/// GET /health -- returns service health and store sizes.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (dashboards, catalog_nodes) = state.store.counts().await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dashboards,
        catalog_nodes,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
