//! Connector geometry: the cubic curve drawn from a parent to each child.

use crate::id::NodeId;
use crate::layout::LaidOutNode;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A cubic Bézier from `start` to `end` with control points `c1`, `c2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub from: NodeId,
    pub to: NodeId,
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

/// Curve from the parent's anchor `(parent.x + parent.width, parent.y)` to
/// the child's anchor `(child.x, child.y)`.
///
/// Both control points sit half the horizontal spacing away from their
/// endpoint, at the endpoint's height, which gives a symmetric S-curve when
/// the two nodes are vertically offset and a straight line when they are not.
pub fn connector_between(
    parent: &LaidOutNode,
    child: &LaidOutNode,
    horizontal_spacing: f32,
) -> Connector {
    let start = Point::new(parent.x + parent.width, parent.y);
    let end = Point::new(child.x, child.y);
    let bend = horizontal_spacing / 2.0;
    Connector {
        from: parent.id,
        to: child.id,
        start,
        c1: Point::new(start.x + bend, start.y),
        c2: Point::new(end.x - bend, end.y),
        end,
    }
}

impl Connector {
    /// SVG path data: `M sx sy C c1x c1y, c2x c2y, ex ey`.
    pub fn to_svg_path(&self) -> String {
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.end.x,
            self.end.y
        );
        d
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    pub fn eval(&self, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.c1.x + c * self.c2.x + d * self.end.x,
            a * self.start.y + b * self.c1.y + c * self.c2.y + d * self.end.y,
        )
    }
}
