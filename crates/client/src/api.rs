//! REST API client for the dashboard service.
//!
//! Wraps the dashboard and node catalog endpoints using [`reqwest`] and
//! implements [`DashboardStore`] on top of them.

use async_trait::async_trait;
use dlv_core::catalog::{CatalogListing, CatalogNode, CatalogQuery, DagsResponse, TablesResponse};
use dlv_core::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use dlv_core::error::CoreError;
use dlv_core::store::{DashboardStore, StoreError};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;

/// HTTP client for one dashboard service.
pub struct DlvApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Dashboard API error ({status}): {message}")]
    Api {
        status: u16,
        /// The `error` or `detail` field of the body, else the raw body.
        message: String,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map to a [`StoreError`], naming the entity a 404 refers to.
    pub fn into_store_error(self, entity: &'static str, id: &str) -> StoreError {
        match self {
            ApiError::Request(e) if e.is_decode() => StoreError::Decode(e.to_string()),
            ApiError::Request(e) => StoreError::Transport(e.to_string()),
            ApiError::Decode(msg) => StoreError::Decode(msg),
            ApiError::Api { status, message } => match status {
                400 | 422 => CoreError::Validation(message).into(),
                401 => CoreError::Unauthorized(message).into(),
                403 => CoreError::Forbidden(message).into(),
                404 => CoreError::NotFound {
                    entity,
                    id: id.to_string(),
                }
                .into(),
                409 => CoreError::Conflict(message).into(),
                _ => StoreError::Upstream { status, message },
            },
        }
    }
}

impl DlvApi {
    /// Build a client with the configured timeout and token.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.token.clone(),
        ))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- dashboards ----

    pub async fn fetch_dashboards(&self) -> Result<Vec<Dashboard>, ApiError> {
        let response = self.request(Method::GET, "/api/dashboards").send().await?;
        Self::parse_response(response).await
    }

    pub async fn fetch_dashboard(&self, id: &str) -> Result<Dashboard, ApiError> {
        let response = self
            .request(Method::GET, &format!("/api/dashboards/{id}"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn post_dashboard(&self, input: &CreateDashboard) -> Result<Dashboard, ApiError> {
        let response = self
            .request(Method::POST, "/api/dashboards")
            .json(input)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `PUT /api/dashboards/{id}`: replaces every field present in `input`.
    pub async fn put_dashboard(
        &self,
        id: &str,
        input: &UpdateDashboard,
    ) -> Result<Dashboard, ApiError> {
        let response = self
            .request(Method::PUT, &format!("/api/dashboards/{id}"))
            .json(input)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn remove_dashboard(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("/api/dashboards/{id}"))
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- catalog ----

    /// `GET /api/nodes`. Accepts both the paginated envelope and a bare array.
    pub async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<Vec<CatalogNode>, ApiError> {
        let response = self
            .request(Method::GET, "/api/nodes")
            .query(query)
            .send()
            .await?;
        let listing: CatalogListing = Self::parse_response(response).await?;
        Ok(listing.into_items())
    }

    pub async fn fetch_tables(&self, node_id: &str) -> Result<TablesResponse, ApiError> {
        let response = self
            .request(Method::GET, &format!("/api/nodes/{node_id}/tables"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn fetch_dags(&self, node_id: &str) -> Result<DagsResponse, ApiError> {
        let response = self
            .request(Method::GET, &format!("/api/nodes/{node_id}/dags"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. On failure the error
    /// message is read from the body's `error` or `detail` field.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    /// Ensure success status and deserialize the JSON body.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Ensure success status, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    match json.get("error").or_else(|| json.get("detail")) {
        Some(serde_json::Value::String(msg)) => msg.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}

#[async_trait]
impl DashboardStore for DlvApi {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, StoreError> {
        self.fetch_dashboards()
            .await
            .map_err(|e| e.into_store_error("Dashboard", ""))
    }

    async fn get_dashboard(&self, id: &str) -> Result<Dashboard, StoreError> {
        self.fetch_dashboard(id)
            .await
            .map_err(|e| e.into_store_error("Dashboard", id))
    }

    async fn create_dashboard(&self, input: &CreateDashboard) -> Result<Dashboard, StoreError> {
        self.post_dashboard(input)
            .await
            .map_err(|e| e.into_store_error("Dashboard", ""))
    }

    async fn update_dashboard(
        &self,
        id: &str,
        input: &UpdateDashboard,
    ) -> Result<Dashboard, StoreError> {
        self.put_dashboard(id, input)
            .await
            .map_err(|e| e.into_store_error("Dashboard", id))
    }

    async fn delete_dashboard(&self, id: &str) -> Result<(), StoreError> {
        self.remove_dashboard(id)
            .await
            .map_err(|e| e.into_store_error("Dashboard", id))
    }

    async fn list_catalog_nodes(
        &self,
        query: &CatalogQuery,
    ) -> Result<Vec<CatalogNode>, StoreError> {
        self.fetch_catalog(query)
            .await
            .map_err(|e| e.into_store_error("Node", ""))
    }

    async fn node_tables(&self, node_id: &str) -> Result<TablesResponse, StoreError> {
        self.fetch_tables(node_id)
            .await
            .map_err(|e| e.into_store_error("Node", node_id))
    }

    async fn node_dags(&self, node_id: &str) -> Result<DagsResponse, StoreError> {
        self.fetch_dags(node_id)
            .await
            .map_err(|e| e.into_store_error("Node", node_id))
    }
}
