//! Persisted snapshot format.
//!
//! ```text
//! Diagram := { root: Node, viewBox: { x, y, width, height } }
//! Node    := { id, text, children: Node[], x?, y?, width?, height?, subtreeHeight? }
//! ```
//!
//! Layout fields are accepted on input and ignored: every load is followed
//! by a fresh layout pass. Plain snapshots omit them; `with_layout` fills
//! them in for consumers that want coordinates without running the engine.

use crate::error::{Error, Result};
use crate::id::NodeId;
use crate::layout::Layout;
use crate::model::{Branch, Diagram, MindMap, MindNode, ViewBox};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One node of a snapshot tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtree_height: Option<f32>,
}

impl SnapshotNode {
    fn from_branch(branch: &Branch) -> Self {
        Self {
            id: branch.node.id.as_str().to_string(),
            text: branch.node.text.clone(),
            children: branch.children.iter().map(Self::from_branch).collect(),
            x: None,
            y: None,
            width: None,
            height: None,
            subtree_height: None,
        }
    }

    fn into_branch(self) -> Branch {
        Branch {
            node: MindNode::new(NodeId::intern(&self.id), self.text),
            children: self
                .children
                .into_iter()
                .map(SnapshotNode::into_branch)
                .collect(),
        }
    }

    fn fill_layout(&mut self, layout: &Layout) {
        if let Some(n) = layout.get(NodeId::intern(&self.id)) {
            self.x = Some(n.x);
            self.y = Some(n.y);
            self.width = Some(n.width);
            self.height = Some(n.height);
            self.subtree_height = Some(n.subtree_height);
        }
        for child in &mut self.children {
            child.fill_layout(layout);
        }
    }
}

/// A whole saved diagram.
///
/// `root` is optional at the serde level so a missing root surfaces as
/// `Error::MalformedSnapshot` rather than a generic JSON error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub root: Option<SnapshotNode>,
    #[serde(default)]
    pub view_box: ViewBox,
}

impl Snapshot {
    /// Snapshot of the authored data only.
    pub fn of(diagram: &Diagram) -> Self {
        Self {
            root: Some(SnapshotNode::from_branch(&diagram.map.root_branch())),
            view_box: diagram.view,
        }
    }

    /// Snapshot including the coordinates from `layout`.
    pub fn with_layout(diagram: &Diagram, layout: &Layout) -> Self {
        let mut snapshot = Self::of(diagram);
        if let Some(root) = &mut snapshot.root {
            root.fill_layout(layout);
        }
        snapshot
    }

    /// Validate and convert into a live diagram.
    ///
    /// # Errors
    /// `Error::MalformedSnapshot` for a missing root, repeated ids, or a
    /// view box with non-finite numbers.
    pub fn into_diagram(self) -> Result<Diagram> {
        let root = self
            .root
            .ok_or_else(|| Error::MalformedSnapshot("missing `root`".to_string()))?;
        let view = self.view_box;
        if ![view.x, view.y, view.width, view.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(Error::MalformedSnapshot(
                "`viewBox` contains a non-finite number".to_string(),
            ));
        }
        let map = MindMap::from_branch(root.into_branch())?;
        Ok(Diagram::new(map, view))
    }
}

/// Serialize a diagram to snapshot JSON (no layout fields).
pub fn to_json(diagram: &Diagram) -> Result<String> {
    Ok(serde_json::to_string(&Snapshot::of(diagram))?)
}

/// Serialize a diagram to indented snapshot JSON.
pub fn to_json_pretty(diagram: &Diagram) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Snapshot::of(diagram))?)
}

/// Parse and validate snapshot JSON.
pub fn from_json(json: &str) -> Result<Diagram> {
    let snapshot: Snapshot = deserialize_deep(json)?;
    snapshot.into_diagram()
}

/// `serde_json::from_str` without the nesting limit. Every tree level is
/// two JSON levels, so the default limit of 128 caps trees at ~63 deep.
/// The stack grows on the heap as the tree gets deeper.
pub(crate) fn deserialize_deep<T: DeserializeOwned>(json: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(json);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Compact binary (MessagePack) encoding of the same snapshot.
pub fn to_msgpack(diagram: &Diagram) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(&Snapshot::of(diagram))?)
}

/// Decode a MessagePack snapshot.
pub fn from_msgpack(bytes: &[u8]) -> Result<Diagram> {
    let snapshot: Snapshot = rmp_serde::from_slice(bytes)?;
    snapshot.into_diagram()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, resolve_layout};

    #[test]
    fn default_diagram_json_shape() {
        let json = to_json(&Diagram::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["root"]["id"], "root");
        assert_eq!(value["root"]["text"], "Central Topic");
        assert_eq!(value["root"]["children"], serde_json::json!([]));
        assert_eq!(value["viewBox"]["x"], -300.0);
        assert!(value["root"].get("x").is_none());
    }

    #[test]
    fn layout_fields_are_ignored_on_input() {
        let json = r#"{
            "root": {"id": "snap_r", "text": "R", "x": 999, "y": 999, "width": 1,
                     "height": 1, "subtreeHeight": 7, "children": []},
            "viewBox": {"x": 0, "y": 0, "width": 10, "height": 10}
        }"#;
        let diagram = from_json(json).unwrap();
        let layout = resolve_layout(&diagram.map, LayoutConfig::default());
        let root = layout.get(NodeId::intern("snap_r")).unwrap();
        assert_eq!((root.x, root.y), (0.0, 0.0));
    }

    #[test]
    fn missing_root_is_malformed() {
        let err = from_json(r#"{"viewBox": {"x":0,"y":0,"width":1,"height":1}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedSnapshot(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn missing_view_box_uses_default() {
        let diagram = from_json(r#"{"root": {"id": "vb_r", "text": "R", "children": []}}"#).unwrap();
        assert_eq!(diagram.view, ViewBox::default());
    }

    #[test]
    fn with_layout_fills_coordinates() {
        let mut diagram = Diagram::default();
        let root = diagram.map.root;
        diagram
            .map
            .add_child(root, MindNode::new(NodeId::intern("wl_a"), "A"));
        let layout = resolve_layout(&diagram.map, LayoutConfig::default());
        let snapshot = Snapshot::with_layout(&diagram, &layout);
        let child = &snapshot.root.as_ref().unwrap().children[0];
        assert_eq!(child.x, Some(240.0));
        assert_eq!(child.y, Some(0.0));
        assert_eq!(child.subtree_height, Some(50.0));
    }

    #[test]
    fn msgpack_roundtrip() {
        let mut diagram = Diagram::default();
        let root = diagram.map.root;
        diagram
            .map
            .add_child(root, MindNode::new(NodeId::intern("mp_a"), "Polity"));
        diagram.view.zoom(0.8);
        let bytes = to_msgpack(&diagram).unwrap();
        assert_eq!(from_msgpack(&bytes).unwrap(), diagram);
    }
}
