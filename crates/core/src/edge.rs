//! Canvas edges and their canonical wire shape.
//!
//! Edges arrive in whatever shape the renderer or an older client produced.
//! [`RawEdge::normalize`] turns them into a [`CanvasEdge`] with a stable id,
//! explicit handles, and only those optional keys that were actually set.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// Handle id used when an edge does not name its source handle.
pub const DEFAULT_SOURCE_HANDLE: &str = "source";

/// Handle id used when an edge does not name its target handle.
pub const DEFAULT_TARGET_HANDLE: &str = "target";

/// Default edge stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Default edge stroke colour (the renderer resolves the CSS variable).
pub const DEFAULT_STROKE: &str = "var(--color-accent)";

/// Synthesize an edge id from its endpoints and array position.
pub fn synthesize_edge_id(source: &str, target: &str, index: usize) -> String {
    format!("{source}-{target}-{index}")
}

/// Stroke attributes of an edge. Unknown style keys are preserved.
///
/// `strokeWidth` is kept as raw JSON because the renderer accepts both
/// numbers and CSS lengths such as `"2px"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    #[serde(rename = "strokeWidth", default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke_width: Some(serde_json::Value::from(DEFAULT_STROKE_WIDTH)),
            stroke: Some(DEFAULT_STROKE.to_string()),
            extra: serde_json::Map::new(),
        }
    }
}

/// An edge as found on the wire: every field may be missing or malformed.
/// Numeric ids are read as strings and unusable values as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdge {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub target: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub source_handle: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub target_handle: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string")]
    pub edge_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub animated: Option<bool>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub style: Option<EdgeStyle>,
    pub label: Option<serde_json::Value>,
    pub marker_end: Option<serde_json::Value>,
    pub marker_start: Option<serde_json::Value>,
}

impl RawEdge {
    /// Produce the canonical edge for position `index` in its layout.
    pub fn normalize(self, index: usize) -> CanvasEdge {
        let id = match self.id.filter(|s| !s.is_empty()) {
            Some(id) => id,
            None => synthesize_edge_id(&self.source, &self.target, index),
        };

        CanvasEdge {
            id,
            source_handle: self
                .source_handle
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_HANDLE.to_string()),
            target_handle: self
                .target_handle
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TARGET_HANDLE.to_string()),
            source: self.source,
            target: self.target,
            edge_type: self.edge_type.filter(|s| !s.is_empty()),
            animated: self.animated.unwrap_or(true),
            style: self.style.unwrap_or_default(),
            label: self.label,
            marker_end: self.marker_end,
            marker_start: self.marker_start,
        }
    }
}

/// A normalized canvas edge.
///
/// Optional renderer attributes (`type`, `label`, `markerEnd`,
/// `markerStart`) are omitted from the serialized form when unset so the
/// renderer's own defaults apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    pub animated: bool,
    pub style: EdgeStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<serde_json::Value>,
}

impl CanvasEdge {
    /// The `(source, target, sourceHandle, targetHandle)` tuple identifying
    /// what this edge connects.
    pub fn endpoints(&self) -> (&str, &str, &str, &str) {
        (
            &self.source,
            &self.target,
            &self.source_handle,
            &self.target_handle,
        )
    }
}

/// A connection gesture reported by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn with_handles(mut self, source_handle: &str, target_handle: &str) -> Self {
        self.source_handle = Some(source_handle.to_string());
        self.target_handle = Some(target_handle.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawEdge {
        serde_json::from_value(value).expect("edge should parse")
    }

    #[test]
    fn bare_edge_gets_canonical_defaults() {
        let edge = raw(json!({ "source": "a", "target": "b" })).normalize(0);

        assert_eq!(
            edge,
            CanvasEdge {
                id: "a-b-0".to_string(),
                source: "a".to_string(),
                target: "b".to_string(),
                source_handle: "source".to_string(),
                target_handle: "target".to_string(),
                edge_type: None,
                animated: true,
                style: EdgeStyle {
                    stroke_width: Some(json!(2.0)),
                    stroke: Some("var(--color-accent)".to_string()),
                    extra: serde_json::Map::new(),
                },
                label: None,
                marker_end: None,
                marker_start: None,
            }
        );
    }

    #[test]
    fn synthesized_id_uses_array_index() {
        let edge = raw(json!({ "source": "x", "target": "y" })).normalize(7);
        assert_eq!(edge.id, "x-y-7");
    }

    #[test]
    fn existing_fields_are_kept() {
        let edge = raw(json!({
            "id": "e1",
            "source": "a",
            "target": "b",
            "sourceHandle": "out",
            "targetHandle": "in",
            "type": "smoothstep",
            "animated": false,
            "style": { "stroke": "red" },
            "label": "feeds",
            "markerEnd": { "type": "arrowclosed" }
        }))
        .normalize(3);

        assert_eq!(edge.id, "e1");
        assert_eq!(edge.endpoints(), ("a", "b", "out", "in"));
        assert_eq!(edge.edge_type.as_deref(), Some("smoothstep"));
        assert!(!edge.animated);
        assert_eq!(edge.style.stroke.as_deref(), Some("red"));
        assert_eq!(edge.style.stroke_width, None);
        assert_eq!(edge.label, Some(json!("feeds")));
        assert_eq!(edge.marker_end, Some(json!({ "type": "arrowclosed" })));
        assert_eq!(edge.marker_start, None);
    }

    #[test]
    fn empty_strings_fall_back_like_missing_values() {
        let edge = raw(json!({
            "id": "",
            "source": "a",
            "target": "b",
            "sourceHandle": "",
            "type": ""
        }))
        .normalize(1);

        assert_eq!(edge.id, "a-b-1");
        assert_eq!(edge.source_handle, DEFAULT_SOURCE_HANDLE);
        assert_eq!(edge.edge_type, None);
    }

    #[test]
    fn unset_optional_keys_are_omitted_when_serialized() {
        let edge = raw(json!({ "source": "a", "target": "b" })).normalize(0);
        let out = serde_json::to_value(&edge).unwrap();
        let obj = out.as_object().unwrap();

        assert!(!obj.contains_key("label"));
        assert!(!obj.contains_key("type"));
        assert!(!obj.contains_key("markerEnd"));
        assert!(!obj.contains_key("markerStart"));
        assert_eq!(obj["sourceHandle"], "source");
        assert_eq!(obj["targetHandle"], "target");
        assert_eq!(obj["animated"], true);
    }

    #[test]
    fn null_label_is_treated_as_absent() {
        let edge = raw(json!({ "source": "a", "target": "b", "label": null })).normalize(0);
        let out = serde_json::to_value(&edge).unwrap();
        assert!(out.get("label").is_none());
    }

    #[test]
    fn css_stroke_width_passes_through() {
        let edge = raw(json!({
            "source": "a",
            "target": "b",
            "style": { "strokeWidth": "2px", "opacity": 0.5 }
        }))
        .normalize(0);

        assert_eq!(edge.style.stroke_width, Some(json!("2px")));
        assert_eq!(edge.style.extra["opacity"], json!(0.5));
        let out = serde_json::to_value(&edge).unwrap();
        assert_eq!(out["style"]["strokeWidth"], "2px");
    }

    #[test]
    fn malformed_fields_read_as_absent() {
        let edge = raw(json!({
            "id": 12,
            "source": "a",
            "target": null,
            "sourceHandle": {},
            "animated": "yes",
            "style": "thick"
        }))
        .normalize(0);

        assert_eq!(edge.id, "12");
        assert_eq!(edge.target, "");
        assert_eq!(edge.source_handle, DEFAULT_SOURCE_HANDLE);
        assert!(edge.animated);
        assert_eq!(edge.style, EdgeStyle::default());
    }
}
