//! Tables and DAGs behind the currently selected canvas node.
//!
//! Every selection bumps a generation counter and cancels the fetches of
//! the previous selection. A fetch result is applied only while its
//! generation is current, so a slow response for an earlier node can never
//! overwrite the lists of the node selected now.

use std::sync::Arc;

use dlv_core::catalog::{DagRef, TableRef};
use dlv_core::node::{node_types, CanvasNode};
use dlv_core::store::DashboardStore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What the resource panel currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    /// Canvas id of the selected node.
    pub selected: Option<String>,
    pub tables: Vec<TableRef>,
    pub dags: Vec<DagRef>,
    pub loading_tables: bool,
    pub loading_dags: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Shared {
    generation: u64,
    state: PanelState,
}

#[derive(Debug, Clone, Copy)]
enum Resource {
    Tables,
    Dags,
}

/// Selection-driven loader for node resources.
pub struct ResourcePanel<S: ?Sized> {
    store: Arc<S>,
    shared: Arc<Mutex<Shared>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: DashboardStore + ?Sized + 'static> ResourcePanel<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            shared: Arc::new(Mutex::new(Shared::default())),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Change the selection.
    ///
    /// Clears both lists, then starts a tables fetch for a postgres node or
    /// a DAGs fetch for an airflow node. Other nodes, and `None`, fetch
    /// nothing.
    pub async fn select(&mut self, node: Option<&CanvasNode>) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();

        let resource = match node.map(CanvasNode::node_type) {
            Some(node_types::POSTGRES) => Some(Resource::Tables),
            Some(node_types::AIRFLOW) => Some(Resource::Dags),
            _ => None,
        };

        let generation = {
            let mut shared = self.shared.lock().await;
            shared.generation += 1;
            shared.state = PanelState {
                selected: node.map(|n| n.id.clone()),
                loading_tables: matches!(resource, Some(Resource::Tables)),
                loading_dags: matches!(resource, Some(Resource::Dags)),
                ..PanelState::default()
            };
            shared.generation
        };

        let (Some(node), Some(resource)) = (node, resource) else {
            return;
        };

        let catalog_id = node.catalog_ref().to_string();
        tracing::debug!(
            canvas_id = %node.id,
            catalog_id = %catalog_id,
            ?resource,
            generation,
            "Fetching node resources",
        );

        let handle = tokio::spawn(fetch(
            Arc::clone(&self.store),
            Arc::clone(&self.shared),
            self.cancel.clone(),
            generation,
            resource,
            catalog_id,
        ));
        self.tasks.retain(|h| !h.is_finished());
        self.tasks.push(handle);
    }

    /// Wait until every started fetch has finished or been cancelled.
    pub async fn settle(&mut self) {
        for handle in self.tasks.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Resource fetch task failed");
            }
        }
    }

    pub async fn snapshot(&self) -> PanelState {
        self.shared.lock().await.state.clone()
    }
}

impl<S: ?Sized> Drop for ResourcePanel<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn fetch<S: DashboardStore + ?Sized>(
    store: Arc<S>,
    shared: Arc<Mutex<Shared>>,
    cancel: CancellationToken,
    generation: u64,
    resource: Resource,
    catalog_id: String,
) {
    let outcome = tokio::select! {
        () = cancel.cancelled() => {
            tracing::debug!(catalog_id = %catalog_id, ?resource, generation, "Resource fetch cancelled");
            return;
        }
        outcome = load(store.as_ref(), resource, &catalog_id) => outcome,
    };

    let mut shared = shared.lock().await;
    if shared.generation != generation {
        tracing::debug!(
            catalog_id = %catalog_id,
            ?resource,
            generation,
            current = shared.generation,
            "Discarding stale resource listing",
        );
        return;
    }

    let state = &mut shared.state;
    match outcome {
        Ok(Listing::Tables(tables)) => {
            state.tables = tables;
            state.loading_tables = false;
        }
        Ok(Listing::Dags(dags)) => {
            state.dags = dags;
            state.loading_dags = false;
        }
        Err(message) => {
            tracing::warn!(catalog_id = %catalog_id, ?resource, error = %message, "Resource fetch failed");
            match resource {
                Resource::Tables => {
                    state.tables.clear();
                    state.loading_tables = false;
                }
                Resource::Dags => {
                    state.dags.clear();
                    state.loading_dags = false;
                }
            }
            state.error = Some(message);
        }
    }
}

enum Listing {
    Tables(Vec<TableRef>),
    Dags(Vec<DagRef>),
}

/// Fetch one listing, folding `success: false` into an error message.
async fn load<S: DashboardStore + ?Sized>(
    store: &S,
    resource: Resource,
    catalog_id: &str,
) -> Result<Listing, String> {
    match resource {
        Resource::Tables => {
            let response = store.node_tables(catalog_id).await.map_err(|e| e.to_string())?;
            if response.success {
                Ok(Listing::Tables(response.tables))
            } else {
                Err(response
                    .error
                    .unwrap_or_else(|| "Failed to load tables".to_string()))
            }
        }
        Resource::Dags => {
            let response = store.node_dags(catalog_id).await.map_err(|e| e.to_string())?;
            if response.success {
                Ok(Listing::Dags(response.dags))
            } else {
                Err(response
                    .error
                    .unwrap_or_else(|| "Failed to load DAGs".to_string()))
            }
        }
    }
}
