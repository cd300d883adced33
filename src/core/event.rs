//! Normalized pointer event shape shared by the interaction layer.
//!
//! The terminal integration translates raw crossterm mouse events into these
//! types before anything in the kernel sees them; the kernel never touches
//! the terminal directly.

/// Pointer button in a normalized event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };
}

/// A pointer event in viewer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Viewport-relative x in cells/pixels.
    pub x: f32,
    /// Viewport-relative y in cells/pixels.
    pub y: f32,
    pub button: Option<PointerButton>,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            button: None,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// A coordinate relative to the scope a handler was invoked for: viewport
/// coordinates for global handlers, page-local coordinates for page handlers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in the same coordinate space as [`Position`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners in either drag direction.
    pub fn from_corners(a: Position, b: Position) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= f32::EPSILON || self.height <= f32::EPSILON
    }
}

/// Geometric scope a handler set or mode applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The whole viewer.
    Global,
    /// One specific page.
    Page { page_index: usize },
}

impl Scope {
    pub fn page(page_index: usize) -> Self {
        Scope::Page { page_index }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    pub fn page_index(&self) -> Option<usize> {
        match self {
            Scope::Global => None,
            Scope::Page { page_index } => Some(*page_index),
        }
    }
}
