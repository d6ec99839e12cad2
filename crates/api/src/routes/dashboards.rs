use axum::routing::get;
use axum::Router;

use crate::handlers::dashboards;
use crate::state::AppState;

/// Dashboard routes mounted at `/dashboards`.
///
/// ```text
/// GET    /      -> list_dashboards
/// POST   /      -> create_dashboard
/// GET    /{id}  -> get_dashboard
/// PUT    /{id}  -> update_dashboard
/// DELETE /{id}  -> delete_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(dashboards::list_dashboards).post(dashboards::create_dashboard),
        )
        .route(
            "/{id}",
            get(dashboards::get_dashboard)
                .put(dashboards::update_dashboard)
                .delete(dashboards::delete_dashboard),
        )
}
