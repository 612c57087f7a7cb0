//! Contract between the sync layer and a retained-mode renderer
//!
//! The renderer owns a graph of objects that persists across frames. The sync
//! layer creates one object per tracked entity and pushes position and
//! appearance updates into it; nothing else crosses this boundary.

use crate::core::entity::components::Transform;
use crate::core::entity::visuals::{Shape, Sprite, Text, VisualKind};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque handle to an object in the retained scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RetainedHandle(pub u64);

/// World-space placement pushed to a retained object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub position: Vec2,
    /// Radians
    pub rotation: f32,
    pub scale: Vec2,
}

impl From<Transform> for PositionData {
    fn from(transform: Transform) -> Self {
        Self {
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
        }
    }
}

/// Appearance payload for one retained object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Visual {
    Sprite(Sprite),
    Shape(Shape),
    Text(Text),
}

/// Appearance pushed to a retained object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualData {
    pub visual: Visual,
    pub z_index: i16,
    pub visible: bool,
}

/// Errors reported by a retained scene backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetainedError {
    #[error("retained scene is full ({capacity} objects)")]
    OutOfCapacity { capacity: usize },

    #[error("retained scene backend error: {0}")]
    Backend(String),
}

/// A retained-mode scene the sync layer can drive
///
/// Updates and destroys on unknown handles must be tolerated; the sync layer
/// never issues them for handles it did not create, but backends may be
/// reset independently.
pub trait RetainedScene {
    /// Allocate an object of the given kind
    fn create_object(&mut self, kind: VisualKind) -> Result<RetainedHandle, RetainedError>;

    /// Move an object
    fn update_position(&mut self, handle: RetainedHandle, data: &PositionData);

    /// Change an object's appearance
    fn update_visual(&mut self, handle: RetainedHandle, data: &VisualData);

    /// Release an object and its rendering resources
    fn destroy_object(&mut self, handle: RetainedHandle);
}

impl<S: RetainedScene + ?Sized> RetainedScene for Box<S> {
    fn create_object(&mut self, kind: VisualKind) -> Result<RetainedHandle, RetainedError> {
        (**self).create_object(kind)
    }

    fn update_position(&mut self, handle: RetainedHandle, data: &PositionData) {
        (**self).update_position(handle, data);
    }

    fn update_visual(&mut self, handle: RetainedHandle, data: &VisualData) {
        (**self).update_visual(handle, data);
    }

    fn destroy_object(&mut self, handle: RetainedHandle) {
        (**self).destroy_object(handle);
    }
}
