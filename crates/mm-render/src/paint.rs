//! Layout → Vello drawing commands.
//!
//! Emits connectors first, then node boxes in pre-order, so boxes always
//! cover the ends of the curves that attach to them.

use crate::theme::{Rgba, Theme};
use kurbo::{Affine, CubicBez, Point, Rect, RoundedRect, Stroke as KurboStroke};
use mm_core::connector::Connector;
use mm_core::id::NodeId;
use mm_core::layout::{LaidOutNode, Layout};
use mm_core::model::{MindMap, ViewBox};
use peniko::{Color, Fill};
use vello::Scene;

/// Corner radius of node boxes.
pub const NODE_RADIUS: f64 = 8.0;

/// Stroke width of node borders and connectors.
pub const STROKE_WIDTH: f64 = 2.0;

/// Paint the laid-out diagram to a Vello scene.
///
/// Call once per frame with a freshly-cleared `Scene`. `transform` maps
/// diagram space to the target surface; see `view_transform`.
pub fn paint_scene(
    scene: &mut Scene,
    map: &MindMap,
    layout: &Layout,
    selected: Option<NodeId>,
    theme: &Theme,
    transform: Affine,
) {
    let stroke = KurboStroke::new(STROKE_WIDTH);

    for connector in layout.connectors() {
        scene.stroke(
            &stroke,
            transform,
            to_color(theme.connector),
            None,
            &connector_curve(connector),
        );
    }

    for node in layout.nodes() {
        let shape = node_shape(node);
        scene.fill(
            Fill::NonZero,
            transform,
            to_color(theme.node_fill),
            None,
            &shape,
        );
        let border = if selected == Some(node.id) {
            theme.selected_border
        } else {
            theme.node_border
        };
        scene.stroke(&stroke, transform, to_color(border), None, &shape);

        if let Some(mind_node) = map.get_by_id(node.id) {
            log::trace!(
                "TEXT @{} {:?} at ({}, {})",
                node.id.as_str(),
                mind_node.text,
                node.x,
                node.y
            );
            // Full text shaping requires a font context; hosts draw labels.
        }
    }
}

/// Affine that maps the view window onto a `screen_width × screen_height`
/// surface.
pub fn view_transform(view: &ViewBox, screen_width: f64, screen_height: f64) -> Affine {
    if view.width <= 0.0 || view.height <= 0.0 {
        return Affine::IDENTITY;
    }
    let sx = screen_width / view.width as f64;
    let sy = screen_height / view.height as f64;
    Affine::scale_non_uniform(sx, sy) * Affine::translate((-view.x as f64, -view.y as f64))
}

/// The rounded box drawn for a node.
pub fn node_shape(node: &LaidOutNode) -> RoundedRect {
    Rect::new(
        node.left() as f64,
        node.top() as f64,
        node.right() as f64,
        node.bottom() as f64,
    )
    .to_rounded_rect(NODE_RADIUS)
}

/// The connector as a kurbo cubic.
pub fn connector_curve(c: &Connector) -> CubicBez {
    let p = |pt: mm_core::connector::Point| Point::new(pt.x as f64, pt.y as f64);
    CubicBez::new(p(c.start), p(c.c1), p(c.c2), p(c.end))
}

fn to_color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::layout::{LayoutConfig, resolve_layout};
    use mm_core::model::MindNode;

    fn sample() -> (MindMap, Layout) {
        let mut map = MindMap::new();
        let root = map.root;
        map.add_child(root, MindNode::new(NodeId::intern("paint_a"), "A"));
        let layout = resolve_layout(&map, LayoutConfig::default());
        (map, layout)
    }

    #[test]
    fn node_shape_is_centered_box() {
        let (_, layout) = sample();
        let root = layout.get(NodeId::root()).unwrap();
        let shape = node_shape(root);
        assert_eq!(shape.rect(), Rect::new(-80.0, -25.0, 80.0, 25.0));
    }

    #[test]
    fn curve_matches_connector() {
        let (_, layout) = sample();
        let curve = connector_curve(&layout.connectors()[0]);
        assert_eq!(curve.p0, Point::new(160.0, 0.0));
        assert_eq!(curve.p1, Point::new(200.0, 0.0));
        assert_eq!(curve.p3, Point::new(240.0, 0.0));
    }

    #[test]
    fn view_transform_maps_window_to_screen() {
        let view = ViewBox::default();
        let t = view_transform(&view, 1200.0, 600.0);
        assert_eq!(t * Point::new(-300.0, -300.0), Point::new(0.0, 0.0));
        assert_eq!(t * Point::new(0.0, 0.0), Point::new(600.0, 300.0));
    }

    #[test]
    fn paint_scene_smoke() {
        let (map, layout) = sample();
        let mut scene = Scene::new();
        paint_scene(
            &mut scene,
            &map,
            &layout,
            Some(NodeId::root()),
            &Theme::dark(),
            Affine::IDENTITY,
        );
    }
}
