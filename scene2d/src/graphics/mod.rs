//! Renderer-facing retained scene contract and an in-memory backend

pub mod memory_scene;
pub mod retained;

pub use memory_scene::{MemoryScene, RetainedCall, RetainedObject};
pub use retained::{
    PositionData, RetainedError, RetainedHandle, RetainedScene, Visual, VisualData,
};
