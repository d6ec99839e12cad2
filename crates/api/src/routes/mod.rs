pub mod dashboards;
pub mod health;
pub mod nodes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /dashboards                          list, create
/// /dashboards/{id}                     get, update, delete
///
/// /nodes                               list (paginated), register
/// /nodes/{id}/tables                   tables of a postgres node (?schema=)
/// /nodes/{id}/dags                     DAGs of an airflow node
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dashboards", dashboards::router())
        .nest("/nodes", nodes::router())
}
