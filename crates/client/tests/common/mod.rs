#![allow(dead_code)]

use std::sync::Arc;

use dlv_api::auth::jwt::{generate_access_token, JwtConfig};
use dlv_api::config::ServerConfig;
use dlv_api::router::build_app_router;
use dlv_api::state::AppState;
use dlv_client::api::DlvApi;
use dlv_client::config::ClientConfig;
use dlv_core::catalog::{CatalogNode, CatalogSeedEntry, DagRef, TableRef};
use dlv_core::store::MemoryStore;
use dlv_core::types::DbId;

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;

/// A dashboard service running on an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub jwt: JwtConfig,
}

impl TestServer {
    /// A client authenticated as `user_id`.
    pub fn client(&self, user_id: DbId) -> DlvApi {
        let token = generate_access_token(user_id, &self.jwt).expect("token generation should succeed");
        let config = ClientConfig::new(self.base_url.clone()).with_token(token);
        DlvApi::new(&config).expect("client should build")
    }

    pub fn anonymous_client(&self) -> DlvApi {
        DlvApi::new(&ClientConfig::new(self.base_url.clone())).expect("client should build")
    }
}

/// Serve the full application router with a seeded catalog.
pub async fn spawn_server() -> TestServer {
    let jwt = JwtConfig {
        secret: "client-e2e-secret-long-enough".to_string(),
        access_token_expiry_mins: 15,
    };
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: jwt.clone(),
        catalog_seed: None,
    };

    let store = Arc::new(MemoryStore::new());
    store.seed_catalog(seed_entries()).await;

    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        store,
        jwt,
    }
}

fn seed_entries() -> Vec<CatalogSeedEntry> {
    let node = |id: &str, name: &str, node_type: &str| CatalogNode {
        id: id.to_string(),
        name: name.to_string(),
        node_type: node_type.to_string(),
        status: Some("ok".to_string()),
        connection_string: None,
        created_at: Some(chrono::Utc::now()),
        updated_at: None,
    };

    vec![
        CatalogSeedEntry {
            node: node("pg", "warehouse", "postgres"),
            tables: vec![TableRef::new("public", "orders"), TableRef::new("public", "customers")],
            dags: Vec::new(),
        },
        CatalogSeedEntry {
            node: node("af", "scheduler", "airflow"),
            tables: Vec::new(),
            dags: vec![DagRef::new("nightly_load")],
        },
        CatalogSeedEntry {
            node: node("api", "billing api", "api"),
            tables: Vec::new(),
            dags: Vec::new(),
        },
    ]
}
