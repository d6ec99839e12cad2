//! In-process dashboard and catalog store.
//!
//! Enforces the same rules as the hosted service: dashboards are visible to
//! their owner and, when public, to everyone; only the owner may change or
//! delete them; catalog names are unique; tables are only listed for
//! postgres nodes and DAGs only for airflow nodes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DashboardStore, StoreError};
use crate::catalog::{
    catalog_types, CatalogNode, CatalogPage, CatalogQuery, CatalogSeedEntry, CatalogSort,
    CreateCatalogNode, DagRef, DagsResponse, SortOrder, TableRef, TablesResponse,
    UpdateCatalogNode, INITIAL_STATUS,
};
use crate::dashboard::{check_version, CreateDashboard, Dashboard, UpdateDashboard, INITIAL_VERSION};
use crate::error::CoreError;
use crate::layout::Layout;
use crate::types::DbId;

/// Owner used when the store is driven through [`DashboardStore`] without an
/// authenticated user (offline mode).
pub const LOCAL_USER_ID: DbId = 0;

struct CatalogRecord {
    node: CatalogNode,
    tables: Vec<TableRef>,
    dags: Vec<DagRef>,
}

/// Dashboards and catalog entries held in memory.
pub struct MemoryStore {
    dashboards: RwLock<HashMap<String, Dashboard>>,
    catalog: RwLock<Vec<CatalogRecord>>,
    local_user: DbId,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_local_user(LOCAL_USER_ID)
    }

    /// A store whose [`DashboardStore`] impl acts as `user_id`.
    pub fn with_local_user(user_id: DbId) -> Self {
        Self {
            dashboards: RwLock::new(HashMap::new()),
            catalog: RwLock::new(Vec::new()),
            local_user: user_id,
        }
    }

    /// Number of stored dashboards and registered catalog nodes.
    pub async fn counts(&self) -> (usize, usize) {
        let dashboards = self.dashboards.read().await.len();
        let catalog = self.catalog.read().await.len();
        (dashboards, catalog)
    }

    // -- Dashboards ---------------------------------------------------------

    /// Dashboards owned by `user_id` plus all public ones, oldest first.
    pub async fn list_dashboards_for(&self, user_id: DbId) -> Vec<Dashboard> {
        let dashboards = self.dashboards.read().await;
        let mut visible: Vec<Dashboard> = dashboards
            .values()
            .filter(|d| d.owner_id == user_id || d.is_public)
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        visible
    }

    pub async fn get_dashboard_for(&self, user_id: DbId, id: &str) -> Result<Dashboard, CoreError> {
        let dashboards = self.dashboards.read().await;
        let dashboard = dashboards.get(id).ok_or_else(|| dashboard_not_found(id))?;
        if dashboard.owner_id != user_id && !dashboard.is_public {
            return Err(CoreError::Forbidden("Access denied".into()));
        }
        Ok(dashboard.clone())
    }

    pub async fn create_dashboard_for(
        &self,
        user_id: DbId,
        input: &CreateDashboard,
    ) -> Result<Dashboard, CoreError> {
        input.validate()?;

        let now = Utc::now();
        let dashboard = Dashboard {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name.clone(),
            description: input.description.clone(),
            is_public: input.is_public,
            owner_id: user_id,
            layout: Some(input.layout.clone().unwrap_or_else(Layout::empty)),
            version: INITIAL_VERSION,
            created_at: now,
            updated_at: now,
        };

        self.dashboards
            .write()
            .await
            .insert(dashboard.id.clone(), dashboard.clone());

        tracing::info!(dashboard_id = %dashboard.id, user_id, "Dashboard created");
        Ok(dashboard)
    }

    pub async fn update_dashboard_for(
        &self,
        user_id: DbId,
        id: &str,
        input: &UpdateDashboard,
    ) -> Result<Dashboard, CoreError> {
        input.validate()?;

        let mut dashboards = self.dashboards.write().await;
        let dashboard = dashboards.get_mut(id).ok_or_else(|| dashboard_not_found(id))?;
        if dashboard.owner_id != user_id {
            return Err(CoreError::Forbidden("Access denied".into()));
        }
        check_version(id, dashboard.version, input.expected_version)?;

        if let Some(name) = &input.name {
            dashboard.name = name.clone();
        }
        if let Some(description) = &input.description {
            dashboard.description = Some(description.clone());
        }
        if let Some(layout) = &input.layout {
            dashboard.layout = Some(layout.clone());
        }
        if let Some(is_public) = input.is_public {
            dashboard.is_public = is_public;
        }
        dashboard.version += 1;
        dashboard.updated_at = Utc::now();

        tracing::info!(dashboard_id = %id, user_id, version = dashboard.version, "Dashboard updated");
        Ok(dashboard.clone())
    }

    pub async fn delete_dashboard_for(&self, user_id: DbId, id: &str) -> Result<(), CoreError> {
        let mut dashboards = self.dashboards.write().await;
        let dashboard = dashboards.get(id).ok_or_else(|| dashboard_not_found(id))?;
        if dashboard.owner_id != user_id {
            return Err(CoreError::Forbidden("Access denied".into()));
        }
        dashboards.remove(id);

        tracing::info!(dashboard_id = %id, user_id, "Dashboard deleted");
        Ok(())
    }

    // -- Catalog ------------------------------------------------------------

    /// Filter, sort and paginate the catalog.
    pub async fn list_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage, CoreError> {
        query.validate()?;

        let catalog = self.catalog.read().await;
        let needle = query.q.as_deref().map(str::to_lowercase);
        let mut matches: Vec<&CatalogNode> = catalog
            .iter()
            .map(|r| &r.node)
            .filter(|n| {
                needle
                    .as_deref()
                    .map_or(true, |q| n.name.to_lowercase().contains(q))
            })
            .filter(|n| query.node_type.as_deref().map_or(true, |t| n.node_type == t))
            .collect();

        match query.sort.unwrap_or_default() {
            CatalogSort::Name => matches.sort_by(|a, b| a.name.cmp(&b.name)),
            CatalogSort::CreatedAt => matches.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        if query.order.unwrap_or_default() == SortOrder::Desc {
            matches.reverse();
        }

        let total = matches.len();
        let page = query.page();
        let page_size = query.page_size();
        let offset = (page as usize - 1) * page_size as usize;
        let items = matches
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(CatalogPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Register a new catalog node with an empty resource inventory.
    pub async fn create_catalog_node(
        &self,
        input: &CreateCatalogNode,
    ) -> Result<CatalogNode, CoreError> {
        input.validate()?;

        let mut catalog = self.catalog.write().await;
        if catalog.iter().any(|r| r.node.name == input.name) {
            return Err(CoreError::Validation("Name already exists".into()));
        }

        let now = Utc::now();
        let node = CatalogNode {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name.clone(),
            node_type: input.node_type.clone(),
            status: Some(INITIAL_STATUS.to_string()),
            connection_string: Some(input.connection_string.clone()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        catalog.push(CatalogRecord {
            node: node.clone(),
            tables: Vec::new(),
            dags: Vec::new(),
        });

        tracing::info!(node_id = %node.id, node_type = %node.node_type, "Catalog node created");
        Ok(node)
    }

    /// Partially update a catalog node. Renaming to a name held by another
    /// node is rejected; keeping the node's own name is not.
    pub async fn update_catalog_node(
        &self,
        node_id: &str,
        input: &UpdateCatalogNode,
    ) -> Result<CatalogNode, CoreError> {
        input.validate()?;

        let mut catalog = self.catalog.write().await;
        if let Some(name) = &input.name {
            if catalog
                .iter()
                .any(|r| r.node.name == *name && r.node.id != node_id)
            {
                return Err(CoreError::Validation("Name already exists".into()));
            }
        }

        let record = catalog
            .iter_mut()
            .find(|r| r.node.id == node_id)
            .ok_or_else(|| node_not_found(node_id))?;
        input.apply_to(&mut record.node);
        record.node.updated_at = Some(Utc::now());

        tracing::info!(node_id = %node_id, node_type = %record.node.node_type, "Catalog node updated");
        Ok(record.node.clone())
    }

    /// Insert or replace catalog entries together with their inventories.
    pub async fn seed_catalog(&self, entries: Vec<CatalogSeedEntry>) {
        let mut catalog = self.catalog.write().await;
        let count = entries.len();
        for entry in entries {
            let record = CatalogRecord {
                node: entry.node,
                tables: entry.tables,
                dags: entry.dags,
            };
            match catalog.iter_mut().find(|r| r.node.id == record.node.id) {
                Some(existing) => *existing = record,
                None => catalog.push(record),
            }
        }
        tracing::info!(count, "Catalog seeded");
    }

    /// Tables of a postgres node, optionally restricted to one schema.
    pub async fn tables_for(
        &self,
        node_id: &str,
        schema: Option<&str>,
    ) -> Result<TablesResponse, CoreError> {
        let catalog = self.catalog.read().await;
        let record = find_record(&catalog, node_id)?;
        if record.node.node_type != catalog_types::POSTGRES {
            return Err(CoreError::Validation("Node type must be postgres".into()));
        }
        let tables = record
            .tables
            .iter()
            .filter(|t| schema.map_or(true, |s| t.schema == s))
            .cloned()
            .collect();
        Ok(TablesResponse {
            success: true,
            tables,
            error: None,
        })
    }

    /// DAGs of an airflow node.
    pub async fn dags_for(&self, node_id: &str) -> Result<DagsResponse, CoreError> {
        let catalog = self.catalog.read().await;
        let record = find_record(&catalog, node_id)?;
        if record.node.node_type != catalog_types::AIRFLOW {
            return Err(CoreError::Validation("Node type must be airflow".into()));
        }
        Ok(DagsResponse {
            success: true,
            dags: record.dags.clone(),
            error: None,
        })
    }
}

fn dashboard_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Dashboard",
        id: id.to_string(),
    }
}

fn node_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Node",
        id: id.to_string(),
    }
}

fn find_record<'a>(catalog: &'a [CatalogRecord], node_id: &str) -> Result<&'a CatalogRecord, CoreError> {
    catalog
        .iter()
        .find(|r| r.node.id == node_id)
        .ok_or_else(|| node_not_found(node_id))
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, StoreError> {
        Ok(self.list_dashboards_for(self.local_user).await)
    }

    async fn get_dashboard(&self, id: &str) -> Result<Dashboard, StoreError> {
        Ok(self.get_dashboard_for(self.local_user, id).await?)
    }

    async fn create_dashboard(&self, input: &CreateDashboard) -> Result<Dashboard, StoreError> {
        Ok(self.create_dashboard_for(self.local_user, input).await?)
    }

    async fn update_dashboard(
        &self,
        id: &str,
        input: &UpdateDashboard,
    ) -> Result<Dashboard, StoreError> {
        Ok(self.update_dashboard_for(self.local_user, id, input).await?)
    }

    async fn delete_dashboard(&self, id: &str) -> Result<(), StoreError> {
        Ok(self.delete_dashboard_for(self.local_user, id).await?)
    }

    async fn list_catalog_nodes(
        &self,
        query: &CatalogQuery,
    ) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(self.list_catalog(query).await?.items)
    }

    async fn node_tables(&self, node_id: &str) -> Result<TablesResponse, StoreError> {
        Ok(self.tables_for(node_id, None).await?)
    }

    async fn node_dags(&self, node_id: &str) -> Result<DagsResponse, StoreError> {
        Ok(self.dags_for(node_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn seed(id: &str, name: &str, node_type: &str, age_mins: i64) -> CatalogSeedEntry {
        CatalogSeedEntry {
            node: CatalogNode {
                id: id.to_string(),
                name: name.to_string(),
                node_type: node_type.to_string(),
                status: None,
                connection_string: None,
                created_at: Some(Utc::now() - Duration::minutes(age_mins)),
                updated_at: None,
            },
            tables: vec![
                TableRef::new("public", "orders"),
                TableRef::new("staging", "orders_raw"),
            ],
            dags: vec![DagRef::new("daily_orders")],
        }
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed_catalog(vec![
                seed("pg", "Warehouse", "postgres", 30),
                seed("af", "Scheduler", "airflow", 20),
                seed("api", "Billing API", "api", 10),
            ])
            .await;
        store
    }

    // -- Dashboards ---------------------------------------------------------

    #[tokio::test]
    async fn new_dashboard_gets_empty_layout_and_initial_version() {
        let store = MemoryStore::new();
        let dashboard = store
            .create_dashboard(&CreateDashboard::named("Lineage"))
            .await
            .unwrap();

        assert_eq!(dashboard.layout, Some(Layout::empty()));
        assert_eq!(dashboard.version, INITIAL_VERSION);
        assert_eq!(dashboard.owner_id, LOCAL_USER_ID);
    }

    #[tokio::test]
    async fn update_bumps_version_and_checks_expected_version() {
        let store = MemoryStore::new();
        let created = store
            .create_dashboard(&CreateDashboard::named("Lineage"))
            .await
            .unwrap();

        let updated = store
            .update_dashboard(&created.id, &UpdateDashboard::layout(Layout::empty(), Some(1)))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let stale = store
            .update_dashboard(&created.id, &UpdateDashboard::layout(Layout::empty(), Some(1)))
            .await
            .unwrap_err();
        assert!(stale.is_conflict());

        let unguarded = store
            .update_dashboard(&created.id, &UpdateDashboard::layout(Layout::empty(), None))
            .await
            .unwrap();
        assert_eq!(unguarded.version, 3);
    }

    #[tokio::test]
    async fn private_dashboards_hidden_from_other_users() {
        let store = MemoryStore::new();
        let private = store
            .create_dashboard_for(1, &CreateDashboard::named("mine"))
            .await
            .unwrap();
        let public = store
            .create_dashboard_for(
                1,
                &CreateDashboard {
                    is_public: true,
                    ..CreateDashboard::named("shared")
                },
            )
            .await
            .unwrap();

        let visible = store.list_dashboards_for(2).await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, public.id);

        assert_matches!(
            store.get_dashboard_for(2, &private.id).await,
            Err(CoreError::Forbidden(_))
        );
        assert!(store.get_dashboard_for(2, &public.id).await.is_ok());
        assert_matches!(
            store
                .update_dashboard_for(2, &public.id, &UpdateDashboard::default())
                .await,
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            store.delete_dashboard_for(2, &public.id).await,
            Err(CoreError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryStore::new();
        let created = store
            .create_dashboard(&CreateDashboard::named("temp"))
            .await
            .unwrap();

        store.delete_dashboard(&created.id).await.unwrap();
        let err = store.get_dashboard(&created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn invalid_name_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_dashboard(&CreateDashboard::named(""))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
    }

    // -- Catalog ------------------------------------------------------------

    #[tokio::test]
    async fn catalog_filters_and_sorts() {
        let store = seeded_store().await;

        let newest_first = store.list_catalog(&CatalogQuery::default()).await.unwrap();
        let ids: Vec<&str> = newest_first.items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["api", "af", "pg"]);
        assert_eq!(newest_first.total, 3);

        let by_name = store
            .list_catalog(&CatalogQuery {
                sort: Some(CatalogSort::Name),
                order: Some(SortOrder::Asc),
                ..CatalogQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.items[0].name, "Billing API");

        let search = store
            .list_catalog(&CatalogQuery {
                q: Some("WARE".into()),
                ..CatalogQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(search.total, 1);
        assert_eq!(search.items[0].id, "pg");

        let typed = store
            .list_catalog(&CatalogQuery {
                node_type: Some("airflow".into()),
                ..CatalogQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(typed.items.len(), 1);
    }

    #[tokio::test]
    async fn catalog_pagination() {
        let store = seeded_store().await;
        let page = store
            .list_catalog(&CatalogQuery {
                page: Some(2),
                page_size: Some(2),
                ..CatalogQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "pg");
    }

    #[tokio::test]
    async fn duplicate_catalog_name_rejected() {
        let store = MemoryStore::new();
        let input = CreateCatalogNode {
            name: "Warehouse".into(),
            node_type: "postgres".into(),
            connection_string: "postgresql://db/warehouse".into(),
        };
        let node = store.create_catalog_node(&input).await.unwrap();
        assert_eq!(node.status.as_deref(), Some(INITIAL_STATUS));

        assert_matches!(
            store.create_catalog_node(&input).await,
            Err(CoreError::Validation(msg)) if msg == "Name already exists"
        );
    }

    #[tokio::test]
    async fn catalog_node_partial_update() {
        let store = seeded_store().await;
        let before = store.list_catalog(&CatalogQuery::default()).await.unwrap();
        let pg = before.items.iter().find(|n| n.id == "pg").unwrap().clone();

        let keep_name = UpdateCatalogNode {
            name: Some(pg.name.clone()),
            connection_string: Some("postgresql://replica/warehouse".into()),
            ..UpdateCatalogNode::default()
        };
        let updated = store.update_catalog_node("pg", &keep_name).await.unwrap();

        assert_eq!(updated.name, pg.name);
        assert_eq!(updated.node_type, "postgres");
        assert_eq!(
            updated.connection_string.as_deref(),
            Some("postgresql://replica/warehouse")
        );
        assert!(updated.updated_at.is_some());
        // Inventories survive the update.
        assert_eq!(store.tables_for("pg", None).await.unwrap().tables.len(), 2);
    }

    #[tokio::test]
    async fn catalog_node_update_rejects_taken_name_and_unknown_id() {
        let store = seeded_store().await;
        let page = store.list_catalog(&CatalogQuery::default()).await.unwrap();
        let af_name = page.items.iter().find(|n| n.id == "af").unwrap().name.clone();

        let steal = UpdateCatalogNode {
            name: Some(af_name),
            ..UpdateCatalogNode::default()
        };
        assert_matches!(
            store.update_catalog_node("pg", &steal).await,
            Err(CoreError::Validation(msg)) if msg == "Name already exists"
        );
        assert_matches!(
            store
                .update_catalog_node("missing", &UpdateCatalogNode::default())
                .await,
            Err(CoreError::NotFound { entity: "Node", .. })
        );
    }

    #[tokio::test]
    async fn tables_only_for_postgres_nodes() {
        let store = seeded_store().await;

        let all = store.tables_for("pg", None).await.unwrap();
        assert!(all.success);
        assert_eq!(all.tables.len(), 2);

        let public = store.tables_for("pg", Some("public")).await.unwrap();
        assert_eq!(public.tables, vec![TableRef::new("public", "orders")]);

        assert_matches!(store.tables_for("af", None).await, Err(CoreError::Validation(_)));
        assert_matches!(
            store.tables_for("missing", None).await,
            Err(CoreError::NotFound { entity: "Node", .. })
        );
    }

    #[tokio::test]
    async fn dags_only_for_airflow_nodes() {
        let store = seeded_store().await;

        let dags = store.node_dags("af").await.unwrap();
        assert_eq!(dags.dags, vec![DagRef::new("daily_orders")]);

        assert_matches!(
            store.node_dags("pg").await,
            Err(StoreError::Core(CoreError::Validation(_)))
        );
    }
}
