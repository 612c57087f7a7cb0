//! Appearance components mirrored into the retained scene

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const RED: Color = Color::rgba(230, 41, 55, 255);
    pub const GREEN: Color = Color::rgba(0, 228, 48, 255);
    pub const BLUE: Color = Color::rgba(0, 121, 241, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Create a color from its four channels
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Which kind of retained object an entity is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    Sprite,
    Shape,
    Text,
}

/// Textured quad referencing an image by name
///
/// Texture lookup belongs to the renderer; this only carries the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub name: String,
    pub tint: Color,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Sprite {
    /// Create an untinted sprite
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tint: Color::WHITE,
            flip_x: false,
            flip_y: false,
        }
    }

    /// Set the tint color
    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }
}

/// Geometry of a [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
    /// Segment from the entity's position to `end`, in local space
    Line { end: Vec2 },
}

/// Filled primitive shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub color: Color,
}

impl Shape {
    pub fn rectangle(width: f32, height: f32, color: Color) -> Self {
        Self {
            kind: ShapeKind::Rectangle { width, height },
            color,
        }
    }

    pub fn circle(radius: f32, color: Color) -> Self {
        Self {
            kind: ShapeKind::Circle { radius },
            color,
        }
    }

    pub fn line(end: Vec2, color: Color) -> Self {
        Self {
            kind: ShapeKind::Line { end },
            color,
        }
    }
}

/// Text label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    pub size: f32,
    pub color: Color,
}

impl Text {
    pub fn new(content: impl Into<String>, size: f32, color: Color) -> Self {
        Self {
            content: content.into(),
            size,
            color,
        }
    }
}

/// Draw order; higher values draw on top. Absent means 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZIndex(pub i16);

/// Visibility flag. Absent means visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}
