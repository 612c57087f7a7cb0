//! In-memory retained scene
//!
//! Keeps the latest state of every object plus a log of the calls it
//! received. Used as a headless backend and to observe what the sync layer
//! sends to a renderer.

use super::retained::{
    PositionData, RetainedError, RetainedHandle, RetainedScene, VisualData,
};
use crate::core::entity::visuals::VisualKind;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Latest state of one retained object
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedObject {
    pub kind: VisualKind,
    pub position: Option<PositionData>,
    pub visual: Option<VisualData>,
}

/// One call received by a [`MemoryScene`]
#[derive(Debug, Clone, PartialEq)]
pub enum RetainedCall {
    Create {
        handle: RetainedHandle,
        kind: VisualKind,
    },
    UpdatePosition {
        handle: RetainedHandle,
        data: PositionData,
    },
    UpdateVisual {
        handle: RetainedHandle,
        data: VisualData,
    },
    Destroy {
        handle: RetainedHandle,
    },
}

impl RetainedCall {
    /// The handle the call targeted
    pub fn handle(&self) -> RetainedHandle {
        match self {
            RetainedCall::Create { handle, .. }
            | RetainedCall::UpdatePosition { handle, .. }
            | RetainedCall::UpdateVisual { handle, .. }
            | RetainedCall::Destroy { handle } => *handle,
        }
    }
}

/// Retained scene held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: HashMap<RetainedHandle, RetainedObject>,
    next_handle: u64,
    capacity: Option<usize>,
    calls: Vec<RetainedCall>,
}

impl MemoryScene {
    /// Create an unbounded scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene that refuses to hold more than `capacity` objects
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Look up a live object
    pub fn object(&self, handle: RetainedHandle) -> Option<&RetainedObject> {
        self.objects.get(&handle)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether there are no live objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> &[RetainedCall] {
        &self.calls
    }

    /// Return and forget the call log
    pub fn take_calls(&mut self) -> Vec<RetainedCall> {
        std::mem::take(&mut self.calls)
    }

    /// Position updates received for `handle`, oldest first
    pub fn position_updates(&self, handle: RetainedHandle) -> Vec<PositionData> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RetainedCall::UpdatePosition { handle: h, data } if *h == handle => Some(*data),
                _ => None,
            })
            .collect()
    }

    /// Visual updates received for `handle`, oldest first
    pub fn visual_updates(&self, handle: RetainedHandle) -> Vec<VisualData> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RetainedCall::UpdateVisual { handle: h, data } if *h == handle => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of destroy calls received for `handle`
    pub fn destroy_count(&self, handle: RetainedHandle) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, RetainedCall::Destroy { handle: h } if *h == handle))
            .count()
    }
}

impl RetainedScene for MemoryScene {
    fn create_object(&mut self, kind: VisualKind) -> Result<RetainedHandle, RetainedError> {
        if let Some(capacity) = self.capacity {
            if self.objects.len() >= capacity {
                return Err(RetainedError::OutOfCapacity { capacity });
            }
        }

        let handle = RetainedHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(
            handle,
            RetainedObject {
                kind,
                position: None,
                visual: None,
            },
        );
        self.calls.push(RetainedCall::Create { handle, kind });
        trace!(handle = ?handle, kind = ?kind, "Created retained object");
        Ok(handle)
    }

    fn update_position(&mut self, handle: RetainedHandle, data: &PositionData) {
        self.calls.push(RetainedCall::UpdatePosition {
            handle,
            data: *data,
        });
        match self.objects.get_mut(&handle) {
            Some(object) => object.position = Some(*data),
            None => warn!(handle = ?handle, "Position update for unknown retained object"),
        }
    }

    fn update_visual(&mut self, handle: RetainedHandle, data: &VisualData) {
        self.calls.push(RetainedCall::UpdateVisual {
            handle,
            data: data.clone(),
        });
        match self.objects.get_mut(&handle) {
            Some(object) => object.visual = Some(data.clone()),
            None => warn!(handle = ?handle, "Visual update for unknown retained object"),
        }
    }

    fn destroy_object(&mut self, handle: RetainedHandle) {
        self.calls.push(RetainedCall::Destroy { handle });
        if self.objects.remove(&handle).is_none() {
            warn!(handle = ?handle, "Destroy for unknown retained object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_create_update_destroy() {
        let mut scene = MemoryScene::new();
        let handle = scene.create_object(VisualKind::Shape).unwrap();
        assert_eq!(scene.len(), 1);

        let data = PositionData {
            position: Vec2::new(1.0, 2.0),
            rotation: 0.0,
            scale: Vec2::ONE,
        };
        scene.update_position(handle, &data);
        assert_eq!(scene.object(handle).unwrap().position, Some(data));
        assert_eq!(scene.position_updates(handle), vec![data]);

        scene.destroy_object(handle);
        assert!(scene.is_empty());
        assert_eq!(scene.destroy_count(handle), 1);
    }

    #[test]
    fn test_capacity_limit() {
        let mut scene = MemoryScene::with_capacity_limit(1);
        assert!(scene.create_object(VisualKind::Sprite).is_ok());
        assert_eq!(
            scene.create_object(VisualKind::Text),
            Err(RetainedError::OutOfCapacity { capacity: 1 })
        );
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_handles_are_not_reused() {
        let mut scene = MemoryScene::new();
        let first = scene.create_object(VisualKind::Sprite).unwrap();
        scene.destroy_object(first);
        let second = scene.create_object(VisualKind::Sprite).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_unknown_handle_is_tolerated() {
        let mut scene = MemoryScene::new();
        scene.destroy_object(RetainedHandle(42));
        assert!(scene.is_empty());
        assert_eq!(scene.take_calls().len(), 1);
        assert!(scene.calls().is_empty());
    }
}
