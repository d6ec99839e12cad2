//! Handlers for the node catalog and its resource inventories.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dlv_core::catalog::{CatalogQuery, CreateCatalogNode, UpdateCatalogNode};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters for `GET /api/nodes/{id}/tables`.
#[derive(Debug, Deserialize)]
pub struct TablesParams {
    pub schema: Option<String>,
}

/// GET /api/nodes
///
/// Supports `q`, `type`, `page`, `page_size`, `sort` and `order`.
pub async fn list_nodes(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.store.list_catalog(&query).await?;
    Ok(Json(page))
}

/// POST /api/nodes
pub async fn create_node(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCatalogNode>,
) -> AppResult<impl IntoResponse> {
    let node = state.store.create_catalog_node(&input).await?;

    tracing::info!(
        node_id = %node.id,
        node_type = %node.node_type,
        user_id = user.user_id,
        "Catalog node registered via API",
    );

    Ok((StatusCode::CREATED, Json(node)))
}

/// PUT /api/nodes/{id}
///
/// Partial update: fields left out of the body keep their stored value.
pub async fn update_node(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCatalogNode>,
) -> AppResult<impl IntoResponse> {
    let node = state.store.update_catalog_node(&id, &input).await?;

    tracing::info!(
        node_id = %node.id,
        user_id = user.user_id,
        renamed = input.name.is_some(),
        "Catalog node updated via API",
    );

    Ok(Json(node))
}

/// GET /api/nodes/{id}/tables
pub async fn node_tables(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TablesParams>,
) -> AppResult<impl IntoResponse> {
    let schema = params.schema.as_deref().filter(|s| !s.is_empty());
    let tables = state.store.tables_for(&id, schema).await?;
    Ok(Json(tables))
}

/// GET /api/nodes/{id}/dags
pub async fn node_dags(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let dags = state.store.dags_for(&id).await?;
    Ok(Json(dags))
}
