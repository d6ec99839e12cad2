#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use dlv_core::catalog::{CatalogNode, CatalogSeedEntry, DagRef, TableRef};
use dlv_core::store::MemoryStore;
use dlv_core::types::DbId;
use http_body_util::BodyExt;
use tower::ServiceExt;

use dlv_api::auth::jwt::{generate_access_token, JwtConfig};
use dlv_api::config::ServerConfig;
use dlv_api::router::build_app_router;
use dlv_api::state::AppState;

pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        catalog_seed: None,
    }
}

/// A router over a fresh in-memory store, plus a handle on that store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn token(&self, user_id: DbId) -> String {
        generate_access_token(user_id, &self.config.jwt).expect("token generation should succeed")
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config.clone()),
    };
    TestApp {
        router: build_app_router(state, &config),
        store,
        config,
    }
}

/// Like [`build_test_app`], with the standard three-node catalog seeded.
pub async fn build_seeded_app() -> TestApp {
    let app = build_test_app();
    app.store.seed_catalog(seed_entries()).await;
    app
}

/// `pg` (postgres, two schemas), `api` (api) and `af` (airflow).
pub fn seed_entries() -> Vec<CatalogSeedEntry> {
    let node = |id: &str, name: &str, node_type: &str, minute: u32| CatalogNode {
        id: id.to_string(),
        name: name.to_string(),
        node_type: node_type.to_string(),
        status: Some("ok".to_string()),
        connection_string: None,
        created_at: Some(
            chrono::DateTime::parse_from_rfc3339(&format!("2024-05-01T10:{minute:02}:00Z"))
                .unwrap()
                .with_timezone(&chrono::Utc),
        ),
        updated_at: None,
    };

    vec![
        CatalogSeedEntry {
            node: node("pg", "warehouse", "postgres", 0),
            tables: vec![
                TableRef::new("public", "orders"),
                TableRef::new("public", "customers"),
                TableRef::new("staging", "raw_orders"),
            ],
            dags: Vec::new(),
        },
        CatalogSeedEntry {
            node: node("api", "billing api", "api", 1),
            tables: Vec::new(),
            dags: Vec::new(),
        },
        CatalogSeedEntry {
            node: node("af", "scheduler", "airflow", 2),
            tables: Vec::new(),
            dags: vec![DagRef::new("nightly_load"), DagRef::new("hourly_sync")],
        },
    ]
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
