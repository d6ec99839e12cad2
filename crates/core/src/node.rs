//! Canvas nodes and node-type resolution.
//!
//! A canvas node carries a free-form `data` payload. Older editor versions
//! stored the domain type under `asset_type` or `process_type` instead of
//! `node_type`, and some never stored the catalog back-reference at all, so
//! every node read from the wire goes through [`CanvasNode::normalize`].

use serde::{Deserialize, Serialize};

use crate::lenient::{self, scalar_string};

// ---------------------------------------------------------------------------
// Type constants
// ---------------------------------------------------------------------------

/// Renderer-level node kinds (the `type` tag on a canvas node).
pub mod kinds {
    pub const ASSET: &str = "asset";
    pub const PROCESS: &str = "process";
}

/// Domain node types carried in `data.node_type`.
pub mod node_types {
    pub const POSTGRES: &str = "postgres";
    pub const API: &str = "api";
    pub const AIRFLOW: &str = "airflow";

    /// Used when no type can be recovered from the node payload.
    pub const FALLBACK: &str = "node";
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Canvas coordinates of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The `data` payload of a canvas node.
///
/// Known keys are typed; anything else is kept in `extra` and written back
/// unchanged. A known key holding a number or boolean is read as its string
/// form, and one holding an object or array stays in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct NodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Back-reference to the catalog entry this node was placed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_table_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_dag_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const NAME: &str = "name";
const NODE_TYPE: &str = "node_type";
const NODE_ID: &str = "node_id";
const ASSET_TYPE: &str = "asset_type";
const PROCESS_TYPE: &str = "process_type";
const SELECTED_TABLE_SCHEMA: &str = "selected_table_schema";
const SELECTED_TABLE_NAME: &str = "selected_table_name";
const SELECTED_DAG_ID: &str = "selected_dag_id";

impl From<serde_json::Value> for NodeData {
    /// Anything other than an object (including `null`) reads as empty data.
    fn from(value: serde_json::Value) -> Self {
        let mut extra = match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            name: take_known(&mut extra, NAME),
            node_type: take_known(&mut extra, NODE_TYPE),
            node_id: take_known(&mut extra, NODE_ID),
            asset_type: take_known(&mut extra, ASSET_TYPE),
            process_type: take_known(&mut extra, PROCESS_TYPE),
            selected_table_schema: take_known(&mut extra, SELECTED_TABLE_SCHEMA),
            selected_table_name: take_known(&mut extra, SELECTED_TABLE_NAME),
            selected_dag_id: take_known(&mut extra, SELECTED_DAG_ID),
            extra,
        }
    }
}

/// Remove `key` from `map` if it holds a scalar. Objects and arrays are left
/// in place.
fn take_known(map: &mut serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(serde_json::Value::Object(_) | serde_json::Value::Array(_)) | None => None,
        Some(_) => map.remove(key).and_then(scalar_string),
    }
}

impl NodeData {
    /// Resolve the domain type: `node_type`, then `asset_type`, then
    /// `process_type`, then [`node_types::FALLBACK`]. Empty strings are
    /// treated as absent.
    pub fn resolved_type(&self) -> &str {
        [&self.node_type, &self.asset_type, &self.process_type]
            .into_iter()
            .find_map(|v| non_empty(v.as_deref()))
            .unwrap_or(node_types::FALLBACK)
    }

    /// Drop `extra` entries shadowed by a typed field that is set, so a key
    /// is never written twice.
    pub fn drop_shadowed_extra(&mut self) {
        let typed = [
            (NAME, self.name.is_some()),
            (NODE_TYPE, self.node_type.is_some()),
            (NODE_ID, self.node_id.is_some()),
            (ASSET_TYPE, self.asset_type.is_some()),
            (PROCESS_TYPE, self.process_type.is_some()),
            (SELECTED_TABLE_SCHEMA, self.selected_table_schema.is_some()),
            (SELECTED_TABLE_NAME, self.selected_table_name.is_some()),
            (SELECTED_DAG_ID, self.selected_dag_id.is_some()),
        ];
        for (key, set) in typed {
            if set {
                self.extra.remove(key);
            }
        }
    }
}

/// A node on the dashboard canvas.
///
/// Only `{id, type, position, data}` survive a load/save cycle; transient
/// renderer fields such as `selected` or `dragging` are dropped on parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl CanvasNode {
    /// Backfill `data.node_type` and `data.node_id` so downstream code never
    /// has to look at the legacy field names.
    pub fn normalize(mut self) -> Self {
        let node_type = self.data.resolved_type().to_string();
        self.data.node_type = Some(node_type);
        if non_empty(self.data.node_id.as_deref()).is_none() {
            self.data.node_id = Some(self.id.clone());
        }
        self.data.drop_shadowed_extra();
        self
    }

    /// Domain type of this node (see [`NodeData::resolved_type`]).
    pub fn node_type(&self) -> &str {
        self.data.resolved_type()
    }

    /// Catalog id used for resource lookups; falls back to the canvas id.
    pub fn catalog_ref(&self) -> &str {
        non_empty(self.data.node_id.as_deref()).unwrap_or(&self.id)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
