//! Mind-map tree model.
//!
//! The tree is stored as an arena: a `StableDiGraph` whose edges go from
//! parent → child, plus an id → index map and an explicit ordered child list
//! per parent. Mutations touch only the affected node and its parent's child
//! list; no part of the tree is ever deep-copied to apply an edit.
//!
//! Only authored data lives here (`id`, `text`, structure). Coordinates and
//! subtree sizes are produced by the layout pass into a separate `Layout`.

use crate::error::{Error, Result};
use crate::id::NodeId;
use crate::layout::Extent;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Label given to the root of a fresh diagram.
pub const DEFAULT_ROOT_TEXT: &str = "Central Topic";

/// Label given to nodes created by "add child".
pub const DEFAULT_NODE_TEXT: &str = "New Idea";

// ─── Nodes ───────────────────────────────────────────────────────────────

/// One labeled idea in the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindNode {
    pub id: NodeId,
    pub text: String,
}

impl MindNode {
    pub fn new(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// An owned subtree, detached from any arena.
///
/// Used to carry removed subtrees for undo and as the intermediate form
/// between the arena and the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub node: MindNode,
    pub children: Vec<Branch>,
}

impl Branch {
    pub fn leaf(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            node: MindNode::new(id, text),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Branch::len).sum::<usize>()
    }

    /// A branch always contains at least its own node.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.node.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

/// A subtree removed from the tree, with enough context to put it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedBranch {
    pub parent: NodeId,
    /// Position the branch occupied in the parent's child list.
    pub position: usize,
    pub branch: Branch,
}

// ─── Tree ────────────────────────────────────────────────────────────────

/// The mind-map tree: exactly one root, unique ids, ordered children.
#[derive(Debug, Clone)]
pub struct MindMap {
    /// The underlying arena. Edges go parent → child.
    pub graph: StableDiGraph<MindNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    id_index: HashMap<NodeId, NodeIndex>,

    /// Authoritative child order. Petgraph's adjacency order is not
    /// insertion order, and stable indices are recycled after removal,
    /// so neither can stand in for it.
    child_order: HashMap<NodeIndex, SmallVec<[NodeIndex; 4]>>,

    /// Ids that belonged to deleted nodes. Fresh ids never collide with these.
    retired: HashSet<NodeId>,
}

impl Default for MindMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MindMap {
    /// Create a tree holding only the default root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(MindNode::new(NodeId::root(), DEFAULT_ROOT_TEXT))
    }

    /// Create a tree holding only `root`.
    #[must_use]
    pub fn with_root(root_node: MindNode) -> Self {
        let mut graph = StableDiGraph::new();
        let id = root_node.id;
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
            retired: HashSet::new(),
        }
    }

    /// Build a tree from an owned branch.
    ///
    /// # Errors
    /// `Error::MalformedSnapshot` if an id occurs more than once. In a
    /// nested snapshot a repeated id is also how a cycle shows up.
    pub fn from_branch(branch: Branch) -> Result<Self> {
        let mut ids = Vec::with_capacity(branch.len());
        branch.collect_ids(&mut ids);
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(*id) {
                return Err(Error::MalformedSnapshot(format!(
                    "duplicate node id `{id}`"
                )));
            }
        }

        let Branch { node, children } = branch;
        let mut map = Self::with_root(node);
        let root = map.root;
        for child in children {
            map.attach_branch(root, None, child);
        }
        Ok(map)
    }

    /// Export the subtree rooted at `idx` as an owned branch.
    pub fn branch(&self, idx: NodeIndex) -> Branch {
        Branch {
            node: self.graph[idx].clone(),
            children: self
                .children(idx)
                .iter()
                .map(|&child| self.branch(child))
                .collect(),
        }
    }

    /// Export the whole tree.
    pub fn root_branch(&self) -> Branch {
        self.branch(self.root)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// The root node.
    pub fn root_node(&self) -> &MindNode {
        &self.graph[self.root]
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Look up a node by id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&MindNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by id.
    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut MindNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    /// Get the index for a NodeId.
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Get the parent index of a node. `None` for the root.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Parent id of the node with `id`, if it exists and is not the root.
    pub fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        self.index_of(id)
            .and_then(|idx| self.parent(idx))
            .map(|pidx| self.graph[pidx].id)
    }

    /// Children of a node in their authoritative order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order
            .get(&idx)
            .map(|order| order.as_slice())
            .unwrap_or(&[])
    }

    /// All node indices below (and including) `idx`, parents before children.
    pub fn preorder(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Check if `ancestor_id` is a proper ancestor of `descendant_id`.
    pub fn is_ancestor_of(&self, ancestor_id: NodeId, descendant_id: NodeId) -> bool {
        let (Some(ancestor), Some(mut current)) =
            (self.index_of(ancestor_id), self.index_of(descendant_id))
        else {
            return false;
        };
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Depth of a node below the root (root = 0).
    pub fn depth(&self, idx: NodeIndex) -> usize {
        let mut depth = 0;
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Generate an id that is neither live nor retired.
    pub fn fresh_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.id_index.contains_key(&id) && !self.retired.contains(&id) {
                return id;
            }
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Append `node` as the last child of `parent`.
    ///
    /// Returns `None` without changing the tree if `parent` is not a live
    /// index or `node.id` is already in use.
    pub fn add_child(&mut self, parent: NodeIndex, node: MindNode) -> Option<NodeIndex> {
        let position = self.children(parent).len();
        self.insert_child(parent, position, node)
    }

    /// Insert `node` as a child of `parent` at `position` (clamped to the
    /// end of the child list).
    pub fn insert_child(
        &mut self,
        parent: NodeIndex,
        position: usize,
        node: MindNode,
    ) -> Option<NodeIndex> {
        if !self.graph.contains_node(parent) || self.id_index.contains_key(&node.id) {
            return None;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        self.retired.remove(&id);

        let order = self.child_order.entry(parent).or_default();
        let position = position.min(order.len());
        order.insert(position, idx);
        Some(idx)
    }

    /// Remove the node at `idx` and its entire subtree.
    ///
    /// The root cannot be removed; that returns `None` and leaves the tree
    /// untouched.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> Option<RemovedBranch> {
        if idx == self.root || !self.graph.contains_node(idx) {
            return None;
        }
        let parent = self.parent(idx)?;
        let branch = self.branch(idx);

        let position = self
            .child_order
            .get(&parent)
            .and_then(|order| order.iter().position(|&c| c == idx))
            .unwrap_or(0);
        if let Some(order) = self.child_order.get_mut(&parent) {
            order.retain(|c| *c != idx);
        }

        for doomed in self.preorder(idx) {
            self.child_order.remove(&doomed);
            if let Some(removed) = self.graph.remove_node(doomed) {
                self.id_index.remove(&removed.id);
                self.retired.insert(removed.id);
            }
        }

        Some(RemovedBranch {
            parent: self.graph[parent].id,
            position,
            branch,
        })
    }

    /// Put a previously removed branch back where it was.
    ///
    /// Returns the index of the restored branch root, or `None` if the
    /// parent no longer exists or any id in the branch is live again.
    pub fn restore_branch(&mut self, removed: RemovedBranch) -> Option<NodeIndex> {
        let parent = self.index_of(removed.parent)?;
        let mut ids = Vec::new();
        removed.branch.collect_ids(&mut ids);
        if ids.iter().any(|id| self.id_index.contains_key(id)) {
            return None;
        }
        Some(self.attach_branch(parent, Some(removed.position), removed.branch))
    }

    /// Overwrite a node's label. Returns `false` if the id is unknown.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        match self.get_by_id_mut(id) {
            Some(node) => {
                node.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Attach an owned branch whose ids are known to be free.
    fn attach_branch(
        &mut self,
        parent: NodeIndex,
        position: Option<usize>,
        branch: Branch,
    ) -> NodeIndex {
        let Branch { node, children } = branch;
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        self.retired.remove(&id);

        let order = self.child_order.entry(parent).or_default();
        let at = position.map_or(order.len(), |p| p.min(order.len()));
        order.insert(at, idx);

        for child in children {
            self.attach_branch(idx, None, child);
        }
        idx
    }
}

impl PartialEq for MindMap {
    /// Structural equality: same ids, labels, and child order.
    fn eq(&self, other: &Self) -> bool {
        self.root_branch() == other.root_branch()
    }
}

// ─── View window ─────────────────────────────────────────────────────────

/// The visible rectangle of diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            x: -300.0,
            y: -300.0,
            width: 600.0,
            height: 600.0,
        }
    }
}

impl ViewBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translate the window by a pointer movement measured in screen pixels.
    ///
    /// The delta is scaled by the window-to-screen ratio, so a drag moves
    /// the content under the pointer at the same speed at any zoom level.
    /// A zero-sized screen is ignored.
    pub fn pan(&mut self, dx_px: f32, dy_px: f32, screen_width: f32, screen_height: f32) {
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return;
        }
        self.x -= dx_px * (self.width / screen_width);
        self.y -= dy_px * (self.height / screen_height);
    }

    /// Scale the window by `factor` about its own center.
    ///
    /// `factor > 1` shows more of the diagram, `factor < 1` less.
    pub fn zoom(&mut self, factor: f32) {
        self.x += self.width * (1.0 - factor) / 2.0;
        self.y += self.height * (1.0 - factor) / 2.0;
        self.width *= factor;
        self.height *= factor;
    }

    /// The window that shows `extent` with `padding` on every side.
    pub fn around(extent: &Extent, padding: f32) -> Self {
        Self {
            x: extent.min_x - padding,
            y: extent.min_y - padding,
            width: extent.width() + padding * 2.0,
            height: extent.height() + padding * 2.0,
        }
    }

    /// Grow the shorter side about the center so that `width / height`
    /// equals `aspect`. Non-positive or non-finite aspects are ignored.
    #[must_use]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        if !aspect.is_finite() || aspect <= 0.0 || self.height <= 0.0 {
            return self;
        }
        let (cx, cy) = self.center();
        if self.width / self.height < aspect {
            self.width = self.height * aspect;
        } else {
            self.height = self.width / aspect;
        }
        self.x = cx - self.width / 2.0;
        self.y = cy - self.height / 2.0;
        self
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Map a screen-pixel position to diagram coordinates.
    pub fn screen_to_diagram(
        &self,
        sx: f32,
        sy: f32,
        screen_width: f32,
        screen_height: f32,
    ) -> (f32, f32) {
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return (self.x, self.y);
        }
        (
            self.x + sx * self.width / screen_width,
            self.y + sy * self.height / screen_height,
        )
    }

    /// Map diagram coordinates to a screen-pixel position.
    pub fn diagram_to_screen(
        &self,
        dx: f32,
        dy: f32,
        screen_width: f32,
        screen_height: f32,
    ) -> (f32, f32) {
        if self.width == 0.0 || self.height == 0.0 {
            return (0.0, 0.0);
        }
        (
            (dx - self.x) * screen_width / self.width,
            (dy - self.y) * screen_height / self.height,
        )
    }
}

// ─── Diagram ─────────────────────────────────────────────────────────────

/// A tree plus the window it is viewed through. This is what gets saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub map: MindMap,
    pub view: ViewBox,
}

impl Diagram {
    pub fn new(map: MindMap, view: ViewBox) -> Self {
        Self { map, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(map: &mut MindMap, parent: NodeIndex, id: &str) -> NodeIndex {
        map.add_child(parent, MindNode::new(NodeId::intern(id), id))
            .expect("add_child")
    }

    #[test]
    fn new_map_has_default_root() {
        let map = MindMap::new();
        assert_eq!(map.node_count(), 1);
        assert_eq!(map.root_node().id, NodeId::root());
        assert_eq!(map.root_node().text, DEFAULT_ROOT_TEXT);
        assert!(map.parent(map.root).is_none());
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut map = MindMap::new();
        let root = map.root;
        let a = add(&mut map, root, "m_a");
        let b = add(&mut map, root, "m_b");
        let c = add(&mut map, root, "m_c");
        assert_eq!(map.children(root), &[a, b, c]);
    }

    #[test]
    fn child_order_survives_index_reuse() {
        // StableGraph recycles vacant slots, so a new node can get a lower
        // index than its older siblings.
        let mut map = MindMap::new();
        let root = map.root;
        let a = add(&mut map, root, "r_a");
        let b = add(&mut map, root, "r_b");
        map.remove_subtree(a);
        let c = add(&mut map, root, "r_c");
        assert_eq!(map.children(root), &[b, c]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut map = MindMap::new();
        let root = map.root;
        add(&mut map, root, "dup");
        assert!(
            map.add_child(root, MindNode::new(NodeId::intern("dup"), "again"))
                .is_none()
        );
        assert_eq!(map.node_count(), 2);
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let mut map = MindMap::new();
        let root = map.root;
        let a = add(&mut map, root, "s_a");
        add(&mut map, a, "s_a1");
        add(&mut map, a, "s_a2");
        add(&mut map, root, "s_b");

        let removed = map.remove_subtree(a).expect("removed");
        assert_eq!(removed.parent, NodeId::root());
        assert_eq!(removed.position, 0);
        assert_eq!(removed.branch.len(), 3);
        assert_eq!(map.node_count(), 2);
        assert!(!map.contains(NodeId::intern("s_a1")));
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut map = MindMap::new();
        let root = map.root;
        add(&mut map, root, "keep");
        assert!(map.remove_subtree(root).is_none());
        assert_eq!(map.node_count(), 2);
    }

    #[test]
    fn restore_puts_branch_back_in_place() {
        let mut map = MindMap::new();
        let root = map.root;
        add(&mut map, root, "t_a");
        let b = add(&mut map, root, "t_b");
        add(&mut map, b, "t_b1");
        add(&mut map, root, "t_c");
        let before = map.root_branch();

        let removed = map.remove_subtree(b).expect("removed");
        map.restore_branch(removed).expect("restored");
        assert_eq!(map.root_branch(), before);
    }

    #[test]
    fn fresh_ids_skip_retired_ids() {
        let mut map = MindMap::new();
        let root = map.root;
        let id = map.fresh_id("fresh");
        let idx = map.add_child(root, MindNode::new(id, "x")).expect("add");
        map.remove_subtree(idx);
        for _ in 0..32 {
            assert_ne!(map.fresh_id("fresh"), id);
        }
    }

    #[test]
    fn from_branch_rejects_repeated_ids() {
        let mut root = Branch::leaf(NodeId::intern("cyc_root"), "root");
        let mut child = Branch::leaf(NodeId::intern("cyc_child"), "child");
        child
            .children
            .push(Branch::leaf(NodeId::intern("cyc_root"), "again"));
        root.children.push(child);
        assert!(matches!(
            MindMap::from_branch(root),
            Err(Error::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn ancestry_queries() {
        let mut map = MindMap::new();
        let root = map.root;
        let a = add(&mut map, root, "anc_a");
        let a1 = add(&mut map, a, "anc_a1");
        add(&mut map, root, "anc_b");

        assert!(map.is_ancestor_of(NodeId::root(), NodeId::intern("anc_a1")));
        assert!(map.is_ancestor_of(NodeId::intern("anc_a"), NodeId::intern("anc_a1")));
        assert!(!map.is_ancestor_of(NodeId::intern("anc_b"), NodeId::intern("anc_a1")));
        assert!(!map.is_ancestor_of(NodeId::intern("anc_a"), NodeId::intern("anc_a")));
        assert_eq!(map.depth(a1), 2);
        assert_eq!(map.parent_id(NodeId::intern("anc_a1")), Some(NodeId::intern("anc_a")));
    }

    #[test]
    fn zoom_keeps_center() {
        let mut view = ViewBox::default();
        view.zoom(1.25);
        assert_eq!(view.center(), (0.0, 0.0));
        assert_eq!(view.width, 750.0);
        assert_eq!(view.height, 750.0);
    }

    #[test]
    fn pan_scales_with_zoom() {
        let mut view = ViewBox::new(0.0, 0.0, 600.0, 600.0);
        view.pan(10.0, -20.0, 1200.0, 1200.0);
        assert_eq!((view.x, view.y), (-5.0, 10.0));

        let mut zoomed = ViewBox::new(0.0, 0.0, 1200.0, 1200.0);
        zoomed.pan(10.0, -20.0, 1200.0, 1200.0);
        assert_eq!((zoomed.x, zoomed.y), (-10.0, 20.0));
    }

    #[test]
    fn fit_pads_and_matches_aspect() {
        let extent = Extent {
            min_x: -80.0,
            min_y: -65.0,
            max_x: 320.0,
            max_y: 65.0,
        };
        let view = ViewBox::around(&extent, 20.0);
        assert_eq!(view, ViewBox::new(-100.0, -85.0, 440.0, 170.0));

        let wide = view.with_aspect(2.0);
        assert_eq!(wide.width, 440.0);
        assert_eq!(wide.height, 220.0);
        assert_eq!(wide.center(), view.center());
        assert_eq!(view.with_aspect(0.0), view);
    }

    #[test]
    fn screen_mapping_roundtrips() {
        let view = ViewBox::new(-300.0, -300.0, 600.0, 600.0);
        let (dx, dy) = view.screen_to_diagram(150.0, 450.0, 600.0, 600.0);
        assert_eq!((dx, dy), (-150.0, 150.0));
        assert_eq!(view.diagram_to_screen(dx, dy, 600.0, 600.0), (150.0, 450.0));
    }
}
