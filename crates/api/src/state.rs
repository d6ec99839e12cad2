use std::sync::Arc;

use dlv_core::store::MemoryStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Dashboards and the node catalog.
    pub store: Arc<MemoryStore>,
    /// Server configuration (read by the auth extractor).
    pub config: Arc<ServerConfig>,
}
