//! The editor: engine, undo history, and pointer tool behind one API.
//!
//! Hosts (the wasm bridge, tests, a native shell) feed it input events or
//! call the operations directly; it decides what to mutate and records
//! every structural change for undo.

use crate::commands::{CommandStack, DEFAULT_UNDO_DEPTH};
use crate::engine::{MindMapEngine, Mutation};
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use crate::tool::{PointerTool, Tool, ToolAction};
use mm_core::id::NodeId;
use mm_core::layout::LayoutConfig;
use mm_core::model::{DEFAULT_NODE_TEXT, Diagram};
use mm_core::store::{self, KeyValueStore, UserData};

/// What handling an event did, for the host to react to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventOutcome {
    /// Tree, selection, edit mode, or view changed; redraw.
    pub changed: bool,
    /// The user asked to save; the host owns storage and timestamps.
    pub save_requested: bool,
}

impl EventOutcome {
    fn redraw(changed: bool) -> Self {
        Self {
            changed,
            save_requested: false,
        }
    }
}

pub struct Editor {
    pub engine: MindMapEngine,
    history: CommandStack,
    tool: PointerTool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl Editor {
    pub fn new(config: LayoutConfig) -> Self {
        Self::from_diagram(Diagram::default(), config)
    }

    pub fn from_diagram(diagram: Diagram, config: LayoutConfig) -> Self {
        Self {
            engine: MindMapEngine::from_diagram(diagram, config),
            history: CommandStack::new(DEFAULT_UNDO_DEPTH),
            tool: PointerTool::new(),
        }
    }

    /// Replace the diagram and forget the undo history.
    pub fn load(&mut self, diagram: Diagram) {
        self.engine.load(diagram);
        self.history.clear();
    }

    // ─── Structural operations ───────────────────────────────────────────

    /// Add a `"New Idea"` child under the selected node, select it, and
    /// start editing it. Returns the new id, or `None` without a (live)
    /// selection.
    pub fn add_child(&mut self) -> Option<NodeId> {
        let Some(parent) = self.engine.selected() else {
            log::debug!("add_child: nothing selected");
            return None;
        };
        let id = self.engine.diagram.map.fresh_id("node");
        let mutation = Mutation::AddChild {
            parent,
            id,
            text: DEFAULT_NODE_TEXT.to_string(),
        };
        if !self.history.execute(&mut self.engine, mutation, "Add child") {
            return None;
        }
        self.engine.select(id);
        self.engine.start_edit(id);
        Some(id)
    }

    /// Delete the selected node and its subtree.
    pub fn delete_selected(&mut self) -> bool {
        match self.engine.selected() {
            Some(id) => self.delete_node(id),
            None => false,
        }
    }

    /// Delete a node and its subtree; selection moves to its parent.
    /// The root and unknown ids are no-ops.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.engine.diagram.map.parent_id(id) else {
            log::debug!("delete_node: {id:?} is the root or unknown");
            return false;
        };
        if !self
            .history
            .execute(&mut self.engine, Mutation::RemoveNode { id }, "Delete node")
        {
            return false;
        }
        self.engine.select(parent);
        true
    }

    /// Overwrite a node's label. Layout positions do not change.
    pub fn rename(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.engine.diagram.map.get_by_id(id).map(|n| n.text.as_str()) == Some(text.as_str()) {
            return false;
        }
        self.history
            .execute(&mut self.engine, Mutation::SetText { id, text }, "Rename")
    }

    /// Rename the node being edited and leave edit mode.
    pub fn commit_edit(&mut self, text: impl Into<String>) -> bool {
        let Some(id) = self.engine.finish_edit() else {
            return false;
        };
        self.rename(id, text);
        true
    }

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.engine)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.engine)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route an input event through the pointer tool or the shortcut map.
    pub fn handle_event(&mut self, event: &InputEvent) -> EventOutcome {
        if let InputEvent::Key {
            key,
            ctrl,
            shift,
            alt,
            meta,
        } = event
        {
            return self.handle_key(key, *ctrl, *shift, *alt, *meta);
        }

        let hit = event
            .position()
            .and_then(|(x, y)| self.engine.node_at_screen(x, y));
        let actions = self.tool.handle(event, hit);
        let mut changed = false;
        for action in actions {
            changed |= self.apply_tool_action(action);
        }
        EventOutcome::redraw(changed)
    }

    fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> EventOutcome {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return EventOutcome::default();
        };
        // While a label is being typed, only the keys that end editing
        // are ours; everything else belongs to the text field.
        if self.engine.editing().is_some()
            && !matches!(action, ShortcutAction::Escape | ShortcutAction::StartEdit)
        {
            return EventOutcome::default();
        }
        self.handle_shortcut(action)
    }

    /// Carry out a shortcut action.
    pub fn handle_shortcut(&mut self, action: ShortcutAction) -> EventOutcome {
        let changed = match action {
            ShortcutAction::AddChild => self.add_child().is_some(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::StartEdit => {
                if self.engine.editing().is_some() {
                    self.engine.finish_edit().is_some()
                } else {
                    self.engine
                        .selected()
                        .is_some_and(|id| self.engine.start_edit(id))
                }
            }
            ShortcutAction::Escape => {
                if self.engine.finish_edit().is_some() {
                    true
                } else {
                    let had = self.engine.selected().is_some();
                    self.engine.clear_selection();
                    had
                }
            }
            ShortcutAction::Undo => self.undo().is_some(),
            ShortcutAction::Redo => self.redo().is_some(),
            ShortcutAction::Save => {
                return EventOutcome {
                    changed: false,
                    save_requested: true,
                };
            }
            ShortcutAction::ZoomIn => {
                self.engine.zoom(ZOOM_IN_FACTOR);
                true
            }
            ShortcutAction::ZoomOut => {
                self.engine.zoom(ZOOM_OUT_FACTOR);
                true
            }
            ShortcutAction::ZoomToFit => {
                self.engine.zoom_to_fit();
                true
            }
        };
        EventOutcome::redraw(changed)
    }

    fn apply_tool_action(&mut self, action: ToolAction) -> bool {
        match action {
            ToolAction::Select(id) => self.engine.select(id),
            ToolAction::StartEdit(id) => self.engine.start_edit(id),
            ToolAction::Pan { dx, dy } => {
                self.engine.pan(dx, dy);
                true
            }
            ToolAction::Zoom(factor) => {
                self.engine.zoom(factor);
                true
            }
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Save the diagram under `key`.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S, key: &str) -> mm_core::Result<()> {
        store::save_diagram(store, key, &self.engine.diagram)
    }

    /// Record the diagram in a user's mind-map history and persist it.
    /// Returns the id of the history entry.
    pub fn save_to_history<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        username: &str,
        timestamp_ms: u64,
    ) -> mm_core::Result<String> {
        let mut data = UserData::load(store, username)?;
        let id = data.save_mind_map(&self.engine.diagram, timestamp_ms);
        data.save(store, username)?;
        Ok(id)
    }
}
