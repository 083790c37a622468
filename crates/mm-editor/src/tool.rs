//! Tool system for canvas interactions.
//!
//! A tool turns input events, plus the node under the pointer, into
//! `ToolAction`s that the editor carries out. Tools never touch the tree
//! themselves.

use crate::input::InputEvent;
use mm_core::id::NodeId;

/// Wheel zoom factor for scrolling down (shows more of the diagram).
pub const WHEEL_ZOOM_OUT: f32 = 1.1;

/// Wheel zoom factor for scrolling up.
pub const WHEEL_ZOOM_IN: f32 = 0.9;

/// What a tool asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolAction {
    Select(NodeId),
    StartEdit(NodeId),
    /// Pan by a pointer movement in screen pixels.
    Pan { dx: f32, dy: f32 },
    Zoom(f32),
}

/// Trait for tools that handle input and produce actions.
pub trait Tool {
    /// Handle an input event. `hit_node` is the node under the pointer,
    /// if the event has a position and one was hit.
    fn handle(&mut self, event: &InputEvent, hit_node: Option<NodeId>) -> Vec<ToolAction>;
}

// ─── Pointer Tool ────────────────────────────────────────────────────────

/// Click to select, drag the background to pan, double-click to edit,
/// wheel to zoom.
#[derive(Debug, Default)]
pub struct PointerTool {
    /// Last pointer position while a pan gesture is active.
    pan_from: Option<(f32, f32)>,
}

impl PointerTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        self.pan_from.is_some()
    }
}

impl Tool for PointerTool {
    fn handle(&mut self, event: &InputEvent, hit_node: Option<NodeId>) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown { x, y } => match hit_node {
                Some(id) => {
                    self.pan_from = None;
                    vec![ToolAction::Select(id)]
                }
                None => {
                    // Click on empty space: start panning
                    self.pan_from = Some((*x, *y));
                    vec![]
                }
            },
            InputEvent::PointerMove { x, y } => {
                let Some((last_x, last_y)) = self.pan_from else {
                    return vec![];
                };
                self.pan_from = Some((*x, *y));
                vec![ToolAction::Pan {
                    dx: x - last_x,
                    dy: y - last_y,
                }]
            }
            InputEvent::PointerUp { .. } => {
                self.pan_from = None;
                vec![]
            }
            InputEvent::DoubleClick { .. } => match hit_node {
                Some(id) => vec![ToolAction::StartEdit(id)],
                None => vec![],
            },
            InputEvent::Wheel { delta_y } => {
                if *delta_y == 0.0 {
                    return vec![];
                }
                let factor = if *delta_y > 0.0 {
                    WHEEL_ZOOM_OUT
                } else {
                    WHEEL_ZOOM_IN
                };
                vec![ToolAction::Zoom(factor)]
            }
            InputEvent::Key { .. } => vec![],
        }
    }
}
