//! Standalone SVG export of a laid-out diagram.

use crate::paint::{NODE_RADIUS, STROKE_WIDTH};
use crate::theme::Theme;
use mm_core::id::NodeId;
use mm_core::layout::Layout;
use mm_core::model::{MindMap, ViewBox};
use std::fmt::Write;

/// What to export and how.
#[derive(Debug, Clone, Default)]
pub struct SvgOptions {
    /// Window to export. `None` fits the whole diagram plus the layout
    /// padding.
    pub view: Option<ViewBox>,
    /// Node drawn with the selection border.
    pub selected: Option<NodeId>,
    pub theme: Theme,
    /// Output size in pixels. Defaults to the window size.
    pub size: Option<(f32, f32)>,
}

/// Render the diagram as an SVG document.
#[must_use]
pub fn render_svg(map: &MindMap, layout: &Layout, options: &SvgOptions) -> String {
    let view = options.view.unwrap_or_else(|| {
        layout
            .extent()
            .map(|e| ViewBox::around(&e, layout.config.padding))
            .unwrap_or_default()
    });
    let (width, height) = options.size.unwrap_or((view.width, view.height));
    let theme = &options.theme;

    let mut svg = String::with_capacity(256 + layout.len() * 256);
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{} {} {} {}\">",
        view.x, view.y, view.width, view.height
    );
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; font-size: 15px; }\n");
    svg.push_str("</style>\n");
    let _ = writeln!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        view.x, view.y, view.width, view.height, theme.background
    );

    svg.push_str("<g class=\"connectors\">\n");
    for connector in layout.connectors() {
        let _ = writeln!(
            svg,
            "  <path d=\"{}\" stroke=\"{}\" stroke-width=\"{STROKE_WIDTH}\" fill=\"none\"/>",
            connector.to_svg_path(),
            theme.connector
        );
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"nodes\">\n");
    for node in layout.nodes() {
        let border = if options.selected == Some(node.id) {
            theme.selected_border
        } else {
            theme.node_border
        };
        let text = map
            .get_by_id(node.id)
            .map(|n| escape_xml(&n.text))
            .unwrap_or_default();
        let _ = writeln!(svg, "  <g data-id=\"{}\">", escape_xml(node.id.as_str()));
        let _ = writeln!(
            svg,
            "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{NODE_RADIUS}\" fill=\"{}\" stroke=\"{border}\" stroke-width=\"{STROKE_WIDTH}\"/>",
            node.left(),
            node.top(),
            node.width,
            node.height,
            theme.node_fill
        );
        let _ = writeln!(
            svg,
            "    <text x=\"{}\" y=\"{}\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{text}</text>",
            node.x, node.y, theme.text
        );
        svg.push_str("  </g>\n");
    }
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
