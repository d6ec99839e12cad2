//! The persisted layout document of a dashboard.
//!
//! Deserializing a [`Layout`] always normalizes it (see [`RawLayout`]), so a
//! layout obtained from the wire is canonical and re-serializing it is
//! stable: `parse(serialize(parse(x))) == parse(x)`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::edge::{CanvasEdge, RawEdge};
use crate::lenient;
use crate::node::CanvasNode;

/// Default canvas viewport zoom level.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Default canvas viewport X position.
pub const DEFAULT_VIEWPORT_X: f64 = 0.0;

/// Default canvas viewport Y position.
pub const DEFAULT_VIEWPORT_Y: f64 = 0.0;

/// Pan/zoom state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: DEFAULT_VIEWPORT_X,
            y: DEFAULT_VIEWPORT_Y,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Wire form of a layout. `null`, missing or malformed collections read as
/// empty, and a malformed viewport reads as the default one.
///
/// Entries are kept as raw JSON here and parsed one by one, so a single bad
/// node or edge is skipped instead of failing the whole layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLayout {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nodes: Option<Vec<serde_json::Value>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub edges: Option<Vec<serde_json::Value>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub viewport: Option<Viewport>,
}

/// A normalized layout: `{ nodes, edges, viewport }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawLayout")]
pub struct Layout {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
    pub viewport: Viewport,
}

impl From<RawLayout> for Layout {
    fn from(raw: RawLayout) -> Self {
        let nodes = raw
            .nodes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| match CanvasNode::deserialize(value) {
                Ok(node) => Some(node.normalize()),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable layout node");
                    None
                }
            })
            .collect();
        // Edge ids are synthesized from the position in the stored array, so
        // the index is taken before unreadable entries are dropped.
        let edges = raw
            .edges
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match RawEdge::deserialize(value) {
                Ok(edge) => Some(edge.normalize(index)),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable layout edge");
                    None
                }
            })
            .collect();

        Self {
            nodes,
            edges,
            viewport: raw.viewport.unwrap_or_default(),
        }
    }
}

impl Layout {
    /// The layout every new dashboard starts with.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Edges whose source or target is not a node of this layout.
    pub fn orphan_edges(&self) -> Vec<&CanvasEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
            .collect()
    }

    /// Node ids that occur more than once.
    pub fn duplicate_node_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) && !dupes.contains(&node.id.as_str()) {
                dupes.push(node.id.as_str());
            }
        }
        dupes
    }
}
