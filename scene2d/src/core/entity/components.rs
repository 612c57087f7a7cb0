//! Core components for the entity system

use glam::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Transform component representing position, rotation, and scale in local space
///
/// For a root entity the local transform is also its world transform. For an
/// entity with a [`Parent`], the values are interpreted relative to the parent
/// according to the parent link's inherit flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position in local space
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise
    pub rotation: f32,
    /// Scale in local space
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with the given position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform from x/y coordinates
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_position(Vec2::new(x, y))
    }

    /// Set the rotation of the transform
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }
}

/// How a child combines its local transform with its parent's world transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentOptions {
    /// Rotate the child's offset and rotation by the parent's world rotation
    pub inherit_rotation: bool,
    /// Scale the child's offset and scale by the parent's world scale
    pub inherit_scale: bool,
}

impl ParentOptions {
    /// Inherit rotation only
    pub fn rotation() -> Self {
        Self {
            inherit_rotation: true,
            inherit_scale: false,
        }
    }

    /// Inherit both rotation and scale
    pub fn all() -> Self {
        Self {
            inherit_rotation: true,
            inherit_scale: true,
        }
    }
}

/// Back-reference from a child to its parent
///
/// Presence of this component means the entity is attached to a hierarchy.
/// Only the hierarchy functions in [`super::hierarchy`] should insert or
/// remove it, since they keep the parent's [`Children`] list in step.
///
/// Note: hecs::Entity doesn't implement Serialize/Deserialize, so this
/// component is not serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent {
    /// The parent entity
    pub entity: Entity,
    /// Whether the parent's world rotation applies to this entity
    pub inherit_rotation: bool,
    /// Whether the parent's world scale applies to this entity
    pub inherit_scale: bool,
}

impl Parent {
    /// Create a parent link with the given options
    pub fn new(entity: Entity, options: ParentOptions) -> Self {
        Self {
            entity,
            inherit_rotation: options.inherit_rotation,
            inherit_scale: options.inherit_scale,
        }
    }

    /// The inherit flags of this link
    pub fn options(&self) -> ParentOptions {
        ParentOptions {
            inherit_rotation: self.inherit_rotation,
            inherit_scale: self.inherit_scale,
        }
    }
}

/// Ordered list of an entity's direct children
///
/// Never empty: removing the last child removes the component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

impl Children {
    /// Number of direct children
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `entity` is a direct child
    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }

    /// Iterate over the children in insertion order
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }
}
