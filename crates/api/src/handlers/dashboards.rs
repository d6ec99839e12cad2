//! Handlers for dashboard CRUD.
//!
//! Dashboards are visible to their owner and, when public, to every
//! authenticated user. Only the owner may modify or delete one.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dlv_core::dashboard::{CreateDashboard, UpdateDashboard};
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/dashboards
pub async fn list_dashboards(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dashboards = state.store.list_dashboards_for(user.user_id).await;
    Ok(Json(dashboards))
}

/// POST /api/dashboards
///
/// A missing layout is stored as the empty layout.
pub async fn create_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDashboard>,
) -> AppResult<impl IntoResponse> {
    let dashboard = state.store.create_dashboard_for(user.user_id, &input).await?;

    tracing::info!(
        dashboard_id = %dashboard.id,
        user_id = user.user_id,
        name = %dashboard.name,
        "Dashboard created via API",
    );

    Ok((StatusCode::CREATED, Json(dashboard)))
}

/// GET /api/dashboards/{id}
pub async fn get_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let dashboard = state.store.get_dashboard_for(user.user_id, &id).await?;
    Ok(Json(dashboard))
}

/// PUT /api/dashboards/{id}
///
/// Partial update; a stale `expected_version` yields 409.
pub async fn update_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateDashboard>,
) -> AppResult<impl IntoResponse> {
    let dashboard = state
        .store
        .update_dashboard_for(user.user_id, &id, &input)
        .await?;

    tracing::info!(
        dashboard_id = %id,
        user_id = user.user_id,
        version = dashboard.version,
        "Dashboard updated via API",
    );

    Ok(Json(dashboard))
}

/// DELETE /api/dashboards/{id}
pub async fn delete_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.delete_dashboard_for(user.user_id, &id).await?;

    tracing::info!(dashboard_id = %id, user_id = user.user_id, "Dashboard deleted via API");

    Ok(Json(json!({ "message": "Dashboard deleted" })))
}
