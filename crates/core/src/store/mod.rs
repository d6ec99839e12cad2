//! The seam between the canvas synchronizer and the dashboard store.
//!
//! [`DashboardStore`] is implemented by the HTTP client in `dlv-client` and
//! by [`MemoryStore`], which backs the reference server and serves as the
//! offline fallback.

mod memory;

pub use memory::{MemoryStore, LOCAL_USER_ID};

use async_trait::async_trait;

use crate::catalog::{CatalogNode, CatalogQuery, DagsResponse, TablesResponse};
use crate::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::error::CoreError;

/// Errors surfaced by a [`DashboardStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store rejected the request (not found, conflict, auth, validation).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store answered with a status this client does not map.
    #[error("Unexpected response ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Core(e) if e.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Core(CoreError::NotFound { .. }))
    }

    /// A 401 from the store means the session expired.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Core(CoreError::Unauthorized(_)))
    }
}

/// Remote (or local) persistence of dashboards and read access to the node
/// catalog.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, StoreError>;

    async fn get_dashboard(&self, id: &str) -> Result<Dashboard, StoreError>;

    async fn create_dashboard(&self, input: &CreateDashboard) -> Result<Dashboard, StoreError>;

    /// Replace the fields present in `input`.
    async fn update_dashboard(
        &self,
        id: &str,
        input: &UpdateDashboard,
    ) -> Result<Dashboard, StoreError>;

    async fn delete_dashboard(&self, id: &str) -> Result<(), StoreError>;

    async fn list_catalog_nodes(&self, query: &CatalogQuery)
        -> Result<Vec<CatalogNode>, StoreError>;

    /// Tables of a postgres catalog node.
    async fn node_tables(&self, node_id: &str) -> Result<TablesResponse, StoreError>;

    /// DAGs of an airflow catalog node.
    async fn node_dags(&self, node_id: &str) -> Result<DagsResponse, StoreError>;
}
