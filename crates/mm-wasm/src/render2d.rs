//! Canvas2D renderer.
//!
//! Draws the laid-out diagram to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. The view window is applied as a canvas
//! transform, so everything below is drawn in diagram coordinates.

use mm_core::connector::Connector;
use mm_core::id::NodeId;
use mm_core::layout::{LaidOutNode, Layout};
use mm_core::model::{MindMap, ViewBox};
use mm_render::Theme;
use mm_render::paint::{NODE_RADIUS, STROKE_WIDTH};
use web_sys::CanvasRenderingContext2d;

const LABEL_FONT: &str = "500 14px Inter, system-ui, sans-serif";

/// Horizontal room left on each side of a label inside its box.
const LABEL_INSET: f64 = 10.0;

/// What to highlight on top of the plain diagram.
#[derive(Debug, Clone, Copy, Default)]
pub struct Highlight {
    pub selected: Option<NodeId>,
    /// The node whose label is covered by the host's text input.
    pub editing: Option<NodeId>,
}

/// Render the whole diagram to a Canvas2D context.
#[allow(clippy::too_many_arguments)]
pub fn render_diagram(
    ctx: &CanvasRenderingContext2d,
    map: &MindMap,
    layout: &Layout,
    view: &ViewBox,
    canvas_width: f64,
    canvas_height: f64,
    highlight: Highlight,
    theme: &Theme,
) {
    // Clear canvas
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(&theme.background.to_string());
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);

    if view.width <= 0.0 || view.height <= 0.0 {
        return;
    }

    ctx.save();
    let (a, d, e, f) = view_matrix(view, canvas_width, canvas_height);
    let _ = ctx.set_transform(a, 0.0, 0.0, d, e, f);

    let connector_color = theme.connector.to_string();
    for connector in layout.connectors() {
        draw_connector(ctx, connector, &connector_color);
    }

    for node in layout.nodes() {
        let text = map.get_by_id(node.id).map_or("", |n| n.text.as_str());
        draw_node(ctx, node, text, highlight, theme);
    }

    ctx.restore();
}

/// Scale and translation mapping `view` onto a canvas of the given size:
/// `(scale_x, scale_y, translate_x, translate_y)`.
pub fn view_matrix(view: &ViewBox, canvas_width: f64, canvas_height: f64) -> (f64, f64, f64, f64) {
    let sx = canvas_width / view.width as f64;
    let sy = canvas_height / view.height as f64;
    (sx, sy, -(view.x as f64) * sx, -(view.y as f64) * sy)
}

fn draw_connector(ctx: &CanvasRenderingContext2d, c: &Connector, color: &str) {
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(STROKE_WIDTH);
    ctx.begin_path();
    ctx.move_to(c.start.x as f64, c.start.y as f64);
    ctx.bezier_curve_to(
        c.c1.x as f64,
        c.c1.y as f64,
        c.c2.x as f64,
        c.c2.y as f64,
        c.end.x as f64,
        c.end.y as f64,
    );
    ctx.stroke();
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &LaidOutNode,
    text: &str,
    highlight: Highlight,
    theme: &Theme,
) {
    let x = node.left() as f64;
    let y = node.top() as f64;
    let w = node.width as f64;
    let h = node.height as f64;

    rounded_rect_path(ctx, x, y, w, h, NODE_RADIUS);
    ctx.set_fill_style_str(&theme.node_fill.to_string());
    ctx.fill();

    let border = if highlight.selected == Some(node.id) {
        theme.selected_border
    } else {
        theme.node_border
    };
    ctx.set_stroke_style_str(&border.to_string());
    ctx.set_line_width(STROKE_WIDTH);
    ctx.stroke();

    if highlight.editing == Some(node.id) || text.is_empty() {
        return;
    }

    ctx.set_font(LABEL_FONT);
    ctx.set_fill_style_str(&theme.text.to_string());
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let max_width = (w - LABEL_INSET * 2.0).max(0.0);
    let label = fit_label(text, max_width, |s| measure(ctx, s));
    let _ = ctx.fill_text(&label, node.x as f64, node.y as f64);
}

fn measure(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    ctx.measure_text(text).map_or(0.0, |m| m.width())
}

/// Shorten `text` with a trailing ellipsis until `width_of` says it fits
/// in `max_width`.
pub fn fit_label(text: &str, max_width: f64, width_of: impl Fn(&str) -> f64) -> String {
    if width_of(text) <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut keep = chars.len();
    while keep > 0 {
        keep -= 1;
        let candidate: String = chars[..keep].iter().collect::<String>() + "…";
        if width_of(&candidate) <= max_width {
            return candidate;
        }
    }
    "…".to_string()
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars_wide(s: &str) -> f64 {
        s.chars().count() as f64 * 10.0
    }

    #[test]
    fn short_label_is_untouched() {
        assert_eq!(fit_label("Judiciary", 140.0, chars_wide), "Judiciary");
    }

    #[test]
    fn long_label_gets_ellipsis() {
        let label = fit_label("Directive Principles of State Policy", 140.0, chars_wide);
        assert_eq!(label, "Directive Pri…");
        assert!(chars_wide(&label) <= 140.0);
    }

    #[test]
    fn no_room_leaves_only_ellipsis() {
        assert_eq!(fit_label("Preamble", 0.0, chars_wide), "…");
    }

    #[test]
    fn default_view_matrix_centers_origin() {
        let (sx, sy, tx, ty) = view_matrix(&ViewBox::default(), 1200.0, 600.0);
        assert_eq!((sx, sy), (2.0, 1.0));
        assert_eq!((tx, ty), (600.0, 300.0));
    }
}
