//! Input abstraction layer.
//!
//! Normalizes mouse, touch, wheel, and keyboard events into a unified
//! `InputEvent` enum consumed by tools. Positions are screen pixels
//! relative to the drawing surface.

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f32, y: f32 },

    /// Pointer moved.
    PointerMove { x: f32, y: f32 },

    /// Pointer released or left the surface.
    PointerUp { x: f32, y: f32 },

    /// Second click of a double-click.
    DoubleClick { x: f32, y: f32 },

    /// Wheel or pinch. Positive `delta_y` scrolls down.
    Wheel { delta_y: f32 },

    /// Keyboard key with modifiers.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },
}

impl InputEvent {
    /// A key press without modifiers.
    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::DoubleClick { x, y } => Some((*x, *y)),
            _ => None,
        }
    }
}
