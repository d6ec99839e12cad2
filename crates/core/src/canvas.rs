//! In-memory dashboard canvas and its editing operations.
//!
//! The canvas is the working copy of a [`Layout`]. All user gestures
//! (placing catalog entries, connecting handles, dragging, deleting,
//! choosing a table or DAG) are expressed as methods here so the
//! synchronizer can persist the result without knowing about the renderer.

use std::collections::HashSet;

use crate::catalog::CatalogNode;
use crate::edge::{
    synthesize_edge_id, CanvasEdge, Connection, EdgeStyle, DEFAULT_SOURCE_HANDLE,
    DEFAULT_TARGET_HANDLE,
};
use crate::layout::{Layout, Viewport};
use crate::node::{kinds, node_types, CanvasNode, NodeData, Position};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Canvas {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    viewport: Viewport,
}

impl Canvas {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_layout(layout: Layout) -> Self {
        Self {
            nodes: layout.nodes,
            edges: layout.edges,
            viewport: layout.viewport,
        }
    }

    /// Snapshot the canvas as a layout document for persistence.
    pub fn to_layout(&self) -> Layout {
        Layout {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            viewport: self.viewport,
        }
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&CanvasEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // -- Placement ----------------------------------------------------------

    /// Drop a catalog entry onto the canvas at `position`.
    ///
    /// The first placement of an entry reuses the catalog id as the canvas
    /// id; later placements of the same entry get a fresh UUID. Either way
    /// `data.node_id` points back at the catalog entry.
    pub fn place_catalog_node(&mut self, catalog: &CatalogNode, position: Position) -> &CanvasNode {
        let id = if self.node(&catalog.id).is_some() {
            uuid::Uuid::new_v4().to_string()
        } else {
            catalog.id.clone()
        };

        let node_type = if catalog.node_type.is_empty() {
            node_types::FALLBACK.to_string()
        } else {
            catalog.node_type.clone()
        };

        let mut data = NodeData {
            name: Some(catalog.name.clone()),
            node_type: Some(node_type.clone()),
            node_id: Some(catalog.id.clone()),
            asset_type: Some(node_type),
            ..NodeData::default()
        };
        data.extra
            .insert("id".to_string(), serde_json::Value::String(catalog.id.clone()));

        tracing::debug!(canvas_id = %id, catalog_id = %catalog.id, "Catalog node placed");

        self.nodes.push(CanvasNode {
            id,
            kind: Some(kinds::ASSET.to_string()),
            position,
            data,
        });
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a node and every edge attached to it. Returns the number of
    /// nodes removed.
    pub fn remove_node(&mut self, id: &str) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.edges.retain(|e| e.source != id && e.target != id);
        }
        removed
    }

    // -- Connection ---------------------------------------------------------

    /// Append an edge for a connection gesture.
    ///
    /// Self-loops and repeated connections are accepted. Connections missing
    /// either endpoint are ignored.
    pub fn connect(&mut self, connection: Connection) -> Option<&CanvasEdge> {
        let source = connection.source.filter(|s| !s.is_empty())?;
        let target = connection.target.filter(|s| !s.is_empty())?;

        if source == target {
            tracing::debug!(node = %source, "Self-loop edge created");
        }

        let id = self.next_edge_id(&source, &target);
        self.edges.push(CanvasEdge {
            id,
            source,
            target,
            source_handle: connection
                .source_handle
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_HANDLE.to_string()),
            target_handle: connection
                .target_handle
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TARGET_HANDLE.to_string()),
            edge_type: None,
            animated: true,
            style: EdgeStyle::default(),
            label: None,
            marker_end: None,
            marker_start: None,
        });
        self.edges.last()
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// First `"{source}-{target}-{n}"` id not already taken, starting at the
    /// index the edge will occupy.
    fn next_edge_id(&self, source: &str, target: &str) -> String {
        let taken: HashSet<&str> = self.edges.iter().map(|e| e.id.as_str()).collect();
        (self.edges.len()..)
            .map(|index| synthesize_edge_id(source, target, index))
            .find(|id| !taken.contains(id.as_str()))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    // -- Resource selection -------------------------------------------------

    /// Record the table chosen for a postgres node.
    pub fn select_table(&mut self, node_id: &str, schema: &str, name: &str) -> bool {
        self.update_data(node_id, |data| {
            data.selected_table_schema = Some(schema.to_string());
            data.selected_table_name = Some(name.to_string());
        })
    }

    /// Record the DAG chosen for an airflow node.
    pub fn select_dag(&mut self, node_id: &str, dag_id: &str) -> bool {
        self.update_data(node_id, |data| {
            data.selected_dag_id = Some(dag_id.to_string());
        })
    }

    fn update_data(&mut self, node_id: &str, mut apply: impl FnMut(&mut NodeData)) -> bool {
        let mut touched = false;
        for node in self.nodes.iter_mut().filter(|n| n.id == node_id) {
            apply(&mut node.data);
            node.data.drop_shadowed_extra();
            touched = true;
        }
        touched
    }

    // -- Integrity ----------------------------------------------------------

    /// Edges referencing nodes that are not on the canvas.
    pub fn orphan_edges(&self) -> Vec<&CanvasEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
            .collect()
    }
}
