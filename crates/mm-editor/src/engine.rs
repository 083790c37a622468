//! Mutation engine: the authoritative diagram plus its current layout.
//!
//! Every structural change goes through `apply_mutation`, which edits the
//! tree in place and then re-runs the full two-pass layout. There is no
//! incremental relayout: the layout is never stale with respect to the tree.
//!
//! Selection and edit mode are engine state too. They always name live
//! nodes; a mutation that removes the selected or edited node repairs them.

use mm_core::id::NodeId;
use mm_core::layout::{Layout, LayoutConfig, resolve_layout};
use mm_core::model::{Diagram, MindNode, RemovedBranch, ViewBox};
use mm_core::snapshot;

/// A reversible change to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Append a node as the last child of `parent`.
    AddChild {
        parent: NodeId,
        id: NodeId,
        text: String,
    },
    /// Remove a node and its whole subtree.
    RemoveNode { id: NodeId },
    /// Put a removed subtree back at its original position.
    RestoreBranch { removed: RemovedBranch },
    /// Overwrite a node's label.
    SetText { id: NodeId, text: String },
}

/// Holds the diagram, its layout, and the interaction state.
pub struct MindMapEngine {
    /// The current diagram (single source of truth).
    pub diagram: Diagram,

    /// Layout of `diagram.map`, recomputed after every mutation.
    layout: Layout,

    /// Box size and spacing.
    config: LayoutConfig,

    selected: Option<NodeId>,
    editing: Option<NodeId>,

    /// Size of the drawing surface in screen pixels.
    screen_width: f32,
    screen_height: f32,
}

impl Default for MindMapEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl MindMapEngine {
    /// A fresh diagram with only the default root, which starts selected.
    pub fn new(config: LayoutConfig) -> Self {
        Self::from_diagram(Diagram::default(), config)
    }

    pub fn from_diagram(diagram: Diagram, config: LayoutConfig) -> Self {
        let layout = resolve_layout(&diagram.map, config);
        let selected = Some(diagram.map.root_node().id);
        Self {
            diagram,
            layout,
            config,
            selected,
            editing: None,
            screen_width: ViewBox::default().width,
            screen_height: ViewBox::default().height,
        }
    }

    /// Replace the whole diagram. Selection returns to the root.
    pub fn load(&mut self, diagram: Diagram) {
        self.diagram = diagram;
        self.selected = Some(self.diagram.map.root_node().id);
        self.editing = None;
        self.resolve();
    }

    /// Replace the diagram from snapshot JSON.
    ///
    /// # Errors
    /// Malformed snapshots are rejected and the current diagram is kept.
    pub fn load_json(&mut self, json: &str) -> mm_core::Result<()> {
        let diagram = snapshot::from_json(json)?;
        self.load(diagram);
        Ok(())
    }

    /// Snapshot JSON of the current diagram.
    pub fn to_json(&self) -> mm_core::Result<String> {
        snapshot::to_json(&self.diagram)
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    /// Recompute the layout from the tree.
    pub fn resolve(&mut self) {
        self.layout = resolve_layout(&self.diagram.map, self.config);
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    /// Change box size or spacing and relayout.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.resolve();
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a mutation, relayout, and return the mutation that undoes it.
    ///
    /// Returns `None` and leaves everything untouched when the target does
    /// not exist, the root is asked to be removed, or the new id is taken.
    pub fn apply_mutation(&mut self, mutation: Mutation) -> Option<Mutation> {
        let inverse = match mutation {
            Mutation::AddChild { parent, id, text } => {
                let parent_idx = self.diagram.map.index_of(parent)?;
                self.diagram
                    .map
                    .add_child(parent_idx, MindNode::new(id, text))?;
                Mutation::RemoveNode { id }
            }
            Mutation::RemoveNode { id } => {
                let idx = self.diagram.map.index_of(id)?;
                let removed = self.diagram.map.remove_subtree(idx)?;
                self.repair_state(removed.parent);
                Mutation::RestoreBranch { removed }
            }
            Mutation::RestoreBranch { removed } => {
                let id = removed.branch.node.id;
                self.diagram.map.restore_branch(removed)?;
                Mutation::RemoveNode { id }
            }
            Mutation::SetText { id, text } => {
                let old = self.diagram.map.get_by_id(id)?.text.clone();
                self.diagram.map.set_text(id, text);
                Mutation::SetText { id, text: old }
            }
        };
        self.resolve();
        Some(inverse)
    }

    /// After a removal, point a dangling selection at `fallback` and drop
    /// a dangling edit.
    fn repair_state(&mut self, fallback: NodeId) {
        if let Some(sel) = self.selected
            && !self.diagram.map.contains(sel)
        {
            self.selected = Some(fallback);
        }
        if let Some(edit) = self.editing
            && !self.diagram.map.contains(edit)
        {
            self.editing = None;
        }
    }

    // ─── Selection and edit mode ─────────────────────────────────────────

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.editing
    }

    /// Select a node. Unknown ids are ignored.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.diagram.map.contains(id) {
            log::debug!("select: unknown node {id:?}");
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Put a node in edit mode. Selection is left as it is.
    pub fn start_edit(&mut self, id: NodeId) -> bool {
        if !self.diagram.map.contains(id) {
            log::debug!("start_edit: unknown node {id:?}");
            return false;
        }
        self.editing = Some(id);
        true
    }

    /// Leave edit mode, returning the node that was being edited.
    pub fn finish_edit(&mut self) -> Option<NodeId> {
        self.editing.take()
    }

    // ─── View window ─────────────────────────────────────────────────────

    pub fn view(&self) -> ViewBox {
        self.diagram.view
    }

    pub fn screen_size(&self) -> (f32, f32) {
        (self.screen_width, self.screen_height)
    }

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
    }

    /// Pan by a pointer movement in screen pixels.
    pub fn pan(&mut self, dx_px: f32, dy_px: f32) {
        self.diagram
            .view
            .pan(dx_px, dy_px, self.screen_width, self.screen_height);
    }

    /// Zoom about the view center. `factor > 1` zooms out.
    pub fn zoom(&mut self, factor: f32) {
        self.diagram.view.zoom(factor);
    }

    /// Fit the view to the whole diagram plus padding, matching the
    /// screen's aspect ratio.
    pub fn zoom_to_fit(&mut self) {
        let Some(extent) = self.layout.extent() else {
            return;
        };
        let aspect = if self.screen_height > 0.0 {
            self.screen_width / self.screen_height
        } else {
            0.0
        };
        self.diagram.view = ViewBox::around(&extent, self.config.padding).with_aspect(aspect);
    }

    /// Map a screen position to diagram coordinates.
    pub fn screen_to_diagram(&self, sx: f32, sy: f32) -> (f32, f32) {
        self.diagram
            .view
            .screen_to_diagram(sx, sy, self.screen_width, self.screen_height)
    }

    /// Topmost node under a screen position.
    pub fn node_at_screen(&self, sx: f32, sy: f32) -> Option<NodeId> {
        mm_render::hit_test_screen(
            &self.layout,
            &self.diagram.view,
            sx,
            sy,
            self.screen_width,
            self.screen_height,
        )
    }
}
