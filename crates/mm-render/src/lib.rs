pub mod hit;
pub mod paint;
pub mod svg;
pub mod theme;

pub use hit::{hit_test, hit_test_screen};
pub use paint::paint_scene;
pub use svg::{SvgOptions, render_svg};
pub use theme::{Rgba, Theme};
