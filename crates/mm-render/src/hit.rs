//! Hit testing: point → node lookup.
//!
//! Reverse-walks the laid-out nodes (front-to-back) to find which node's
//! box contains a given diagram-space position.

use mm_core::id::NodeId;
use mm_core::layout::Layout;
use mm_core::model::ViewBox;

/// Find the topmost node at diagram position (px, py).
/// Returns `None` if no node is hit (background).
pub fn hit_test(layout: &Layout, px: f32, py: f32) -> Option<NodeId> {
    // Last painted = topmost
    layout
        .nodes()
        .rev()
        .find(|n| n.contains(px, py))
        .map(|n| n.id)
}

/// Hit test a screen-pixel position, mapped through the view window.
pub fn hit_test_screen(
    layout: &Layout,
    view: &ViewBox,
    sx: f32,
    sy: f32,
    screen_width: f32,
    screen_height: f32,
) -> Option<NodeId> {
    let (px, py) = view.screen_to_diagram(sx, sy, screen_width, screen_height);
    hit_test(layout, px, py)
}
