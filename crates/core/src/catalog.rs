//! Catalog node registry types (the draggable palette of data sources).
//!
//! Defines the catalog entry shape, listing queries with pagination, the
//! table/DAG inventories exposed per node, and creation-time validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Catalog node types accepted by the registry.
pub mod catalog_types {
    pub use crate::node::node_types::{AIRFLOW, API, POSTGRES};

    /// All recognised catalog types.
    pub const ALL: &[&str] = &[POSTGRES, API, AIRFLOW];
}

/// Status assigned to freshly registered nodes before any connection test.
pub const INITIAL_STATUS: &str = "unknown";

/// Maximum catalog node name length.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum connection string length.
pub const MAX_CONNECTION_STRING_LEN: usize = 2048;

/// Default page size of a catalog listing.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Check whether a catalog type string is recognised.
pub fn is_valid_catalog_type(node_type: &str) -> bool {
    catalog_types::ALL.contains(&node_type)
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// An entry of the external node registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// DTO for registering a catalog node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCatalogNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub connection_string: String,
}

impl CreateCatalogNode {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_length("name", &self.name, MAX_NAME_LEN)?;
        validate_length(
            "connection_string",
            &self.connection_string,
            MAX_CONNECTION_STRING_LEN,
        )?;
        if !is_valid_catalog_type(&self.node_type) {
            return Err(CoreError::Validation(format!(
                "Unsupported node type: {}",
                self.node_type
            )));
        }
        Ok(())
    }
}

/// DTO for a partial update of a catalog node. Absent fields keep their
/// stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCatalogNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl UpdateCatalogNode {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_length("name", name, MAX_NAME_LEN)?;
        }
        if let Some(connection_string) = &self.connection_string {
            validate_length(
                "connection_string",
                connection_string,
                MAX_CONNECTION_STRING_LEN,
            )?;
        }
        match &self.node_type {
            Some(node_type) if !is_valid_catalog_type(node_type) => Err(CoreError::Validation(
                format!("Unsupported node type: {node_type}"),
            )),
            _ => Ok(()),
        }
    }

    /// Apply the present fields to `node`.
    pub fn apply_to(&self, node: &mut CatalogNode) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(node_type) = &self.node_type {
            node.node_type = node_type.clone();
        }
        if let Some(connection_string) = &self.connection_string {
            node.connection_string = Some(connection_string.clone());
        }
    }
}

fn validate_length(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(CoreError::Validation(format!(
            "{field} must be between 1 and {max} characters"
        )));
    }
    Ok(())
}

/// A catalog node together with the resource inventories it exposes.
///
/// Used to seed the in-memory registry from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSeedEntry {
    #[serde(flatten)]
    pub node: CatalogNode,
    #[serde(default)]
    pub tables: Vec<TableRef>,
    #[serde(default)]
    pub dags: Vec<DagRef>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Sort column of a catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    Name,
    #[default]
    CreatedAt,
}

/// Sort direction of a catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters of `GET /api/nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive substring match on the node name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<CatalogSort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl CatalogQuery {
    /// Effective page number (1-based).
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Effective page size.
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.page() < 1 {
            return Err(CoreError::Validation("page must be at least 1".into()));
        }
        let size = self.page_size();
        if size < 1 || size > MAX_PAGE_SIZE {
            return Err(CoreError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

/// One page of catalog entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogNode>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

/// A catalog listing as served by either the paginated endpoint or an older
/// deployment returning a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogListing {
    Paged { items: Vec<CatalogNode> },
    Bare(Vec<CatalogNode>),
}

impl CatalogListing {
    pub fn into_items(self) -> Vec<CatalogNode> {
        match self {
            CatalogListing::Paged { items } | CatalogListing::Bare(items) => items,
        }
    }
}

// ---------------------------------------------------------------------------
// Resource inventories
// ---------------------------------------------------------------------------

/// A table exposed by a postgres node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// A DAG exposed by an airflow node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagRef {
    pub dag_id: String,
}

impl DagRef {
    pub fn new(dag_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
        }
    }
}

/// Response of `GET /api/nodes/{id}/tables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablesResponse {
    pub success: bool,
    #[serde(default)]
    pub tables: Vec<TableRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /api/nodes/{id}/dags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagsResponse {
    pub success: bool,
    #[serde(default)]
    pub dags: Vec<DagRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
