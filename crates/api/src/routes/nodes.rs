use axum::routing::{get, put};
use axum::Router;

use crate::handlers::nodes;
use crate::state::AppState;

/// Catalog routes mounted at `/nodes`.
///
/// ```text
/// GET    /              -> list_nodes
/// POST   /              -> create_node
/// PUT    /{id}          -> update_node
/// GET    /{id}/tables   -> node_tables
/// GET    /{id}/dags     -> node_dags
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(nodes::list_nodes).post(nodes::create_node))
        .route("/{id}", put(nodes::update_node))
        .route("/{id}/tables", get(nodes::node_tables))
        .route("/{id}/dags", get(nodes::node_dags))
}
