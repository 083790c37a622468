//! Tree layout solver.
//!
//! Two passes over the whole tree, always run together:
//!
//! 1. `measure_subtrees` (post-order) computes the vertical footprint of
//!    every subtree.
//! 2. `assign_coordinates` (pre-order) places each node's center, stacking
//!    children to the right of their parent and centering the group on it.
//!
//! The result is a separate `Layout` map; the tree itself is never touched.

use crate::connector::{Connector, connector_between};
use crate::id::NodeId;
use crate::model::MindMap;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Box size and spacing used by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    /// Gap between a parent's box and its children's column.
    pub horizontal_spacing: f32,
    /// Gap between adjacent sibling subtrees.
    pub vertical_spacing: f32,
    /// Margin added around the diagram when fitting a view or exporting.
    pub padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 50.0,
            horizontal_spacing: 80.0,
            vertical_spacing: 30.0,
            padding: 20.0,
        }
    }
}

/// Final placement of one node. `x, y` is the box center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaidOutNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub subtree_height: f32,
}

impl LaidOutNode {
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Check if a point is inside this node's box.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.left() && px <= self.right() && py >= self.top() && py <= self.bottom()
    }
}

/// Axis-aligned box covering a set of laid-out nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Extent {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub config: LayoutConfig,
    nodes: HashMap<NodeId, LaidOutNode>,
    /// Node ids in pre-order (parents before children).
    order: Vec<NodeId>,
    connectors: Vec<Connector>,
}

impl Layout {
    pub fn get(&self, id: NodeId) -> Option<&LaidOutNode> {
        self.nodes.get(&id)
    }

    /// Laid-out nodes in pre-order, which is also back-to-front paint order.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &LaidOutNode> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// One connector per parent → child edge, in pre-order of the parent.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bounding box of every node box, or `None` for an empty layout.
    pub fn extent(&self) -> Option<Extent> {
        self.nodes().fold(None, |acc, n| {
            Some(match acc {
                None => Extent {
                    min_x: n.left(),
                    min_y: n.top(),
                    max_x: n.right(),
                    max_y: n.bottom(),
                },
                Some(e) => Extent {
                    min_x: e.min_x.min(n.left()),
                    min_y: e.min_y.min(n.top()),
                    max_x: e.max_x.max(n.right()),
                    max_y: e.max_y.max(n.bottom()),
                },
            })
        })
    }
}

/// Lay out the whole tree with the root centered at `(0, 0)`.
pub fn resolve_layout(map: &MindMap, config: LayoutConfig) -> Layout {
    resolve_layout_at(map, config, 0.0, 0.0)
}

/// Lay out the whole tree with the root centered at `(root_x, root_y)`.
pub fn resolve_layout_at(map: &MindMap, config: LayoutConfig, root_x: f32, root_y: f32) -> Layout {
    let mut heights = HashMap::with_capacity(map.node_count());
    measure_subtrees(map, map.root, &config, &mut heights);

    let mut layout = Layout {
        config,
        nodes: HashMap::with_capacity(map.node_count()),
        order: Vec::with_capacity(map.node_count()),
        connectors: Vec::with_capacity(map.node_count().saturating_sub(1)),
    };
    assign_coordinates(map, map.root, root_x, root_y, &heights, &mut layout);

    for &parent_id in &layout.order {
        let Some(parent_idx) = map.index_of(parent_id) else {
            continue;
        };
        let parent = layout.nodes[&parent_id];
        for &child_idx in map.children(parent_idx) {
            let child = layout.nodes[&map.graph[child_idx].id];
            layout
                .connectors
                .push(connector_between(&parent, &child, config.horizontal_spacing));
        }
    }

    log::trace!("layout: {} nodes placed", layout.order.len());
    layout
}

/// Post-order pass: record every subtree's vertical footprint in `heights`
/// and return the footprint of the subtree at `idx`.
///
/// A leaf needs exactly one box height. An internal node needs its
/// children's footprints stacked with `vertical_spacing` between siblings
/// only, so a single child passes its footprint straight through.
pub fn measure_subtrees(
    map: &MindMap,
    idx: NodeIndex,
    config: &LayoutConfig,
    heights: &mut HashMap<NodeIndex, f32>,
) -> f32 {
    let children = map.children(idx);
    let height = if children.is_empty() {
        config.node_height
    } else {
        let stacked: f32 = children
            .iter()
            .map(|&child| measure_subtrees(map, child, config, heights))
            .sum();
        stacked + (children.len() - 1) as f32 * config.vertical_spacing
    };
    heights.insert(idx, height);
    height
}

/// Pre-order pass: place the node at `idx` at `(x, y)` and its descendants
/// relative to it. `heights` must come from `measure_subtrees` on the same
/// tree shape.
pub fn assign_coordinates(
    map: &MindMap,
    idx: NodeIndex,
    x: f32,
    y: f32,
    heights: &HashMap<NodeIndex, f32>,
    layout: &mut Layout,
) {
    let config = layout.config;
    let id = map.graph[idx].id;
    let subtree_height = heights.get(&idx).copied().unwrap_or(config.node_height);

    layout.nodes.insert(
        id,
        LaidOutNode {
            id,
            x,
            y,
            width: config.node_width,
            height: config.node_height,
            subtree_height,
        },
    );
    layout.order.push(id);

    let children = map.children(idx);
    if children.is_empty() {
        return;
    }

    let child_x = x + config.node_width + config.horizontal_spacing;
    let mut cursor = y - subtree_height / 2.0;
    for &child in children {
        let child_height = heights.get(&child).copied().unwrap_or(config.node_height);
        let child_y = cursor + child_height / 2.0;
        assign_coordinates(map, child, child_x, child_y, heights, layout);
        cursor += child_height + config.vertical_spacing;
    }
}
