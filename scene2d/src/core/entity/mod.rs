//! Entity-Component System (ECS) functionality
//!
//! This module provides the entity store wrapper, transform and visual
//! components, and hierarchy management.

pub mod components;
pub mod hierarchy;
pub mod visuals;
pub mod world;

// Re-export commonly used types
pub use components::{Children, Parent, ParentOptions, Transform};
pub use hierarchy::{HierarchyError, HierarchyListener, MAX_HIERARCHY_DEPTH};
pub use visuals::{Color, Shape, ShapeKind, Sprite, Text, Visible, VisualKind, ZIndex};
pub use world::World;

// Re-export hecs types that users will need
pub use hecs::Entity;
