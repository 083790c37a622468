//! Renderer color themes.

use std::fmt;

/// An 8-bit sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    /// CSS form: `#RRGGBB` when opaque, `rgba(...)` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            let alpha = self.a as f32 / 255.0;
            write!(f, "rgba({}, {}, {}, {alpha:.2})", self.r, self.g, self.b)
        }
    }
}

/// Theme-dependent colors shared by every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Rgba,
    pub node_fill: Rgba,
    pub node_border: Rgba,
    pub selected_border: Rgba,
    pub connector: Rgba,
    pub text: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// Light theme, warm white canvas.
    pub fn light() -> Self {
        Self {
            background: Rgba::rgb(0xF5, 0xF5, 0xF7),
            node_fill: Rgba::rgb(0xFF, 0xFF, 0xFF),
            node_border: Rgba::rgb(0xD2, 0xD2, 0xD7),
            selected_border: Rgba::rgb(0x4F, 0x46, 0xE5),
            connector: Rgba::rgb(0x86, 0x86, 0x8B),
            text: Rgba::rgb(0x1D, 0x1D, 0x1F),
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            background: Rgba::rgb(0x1C, 0x1C, 0x1E),
            node_fill: Rgba::rgb(0x2C, 0x2C, 0x2E),
            node_border: Rgba::rgb(0x48, 0x48, 0x4A),
            selected_border: Rgba::rgb(0x81, 0x8C, 0xF8),
            connector: Rgba::rgb(0x98, 0x98, 0x9D),
            text: Rgba::rgb(0xF5, 0xF5, 0xF7),
        }
    }

    /// Look up a theme by name (`light` or `dark`, case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }
}
