//! Keeps a retained scene in step with the entity world.
//!
//! Tracked entities own exactly one retained object. Mutations only mark
//! entities dirty; [`SyncBridge::sync`] drains the dirty sets once per frame,
//! reads the current component values and pushes them to the retained scene.
//! Values are read at drain time, so several mutations within a frame collapse
//! into one update carrying the final state.

use super::dirty::DirtySet;
use crate::core::entity::components::Parent;
use crate::core::entity::hierarchy::{self, HierarchyListener};
use crate::core::entity::visuals::{Shape, Sprite, Text, Visible, VisualKind, ZIndex};
use crate::core::entity::world::World;
use crate::graphics::retained::{
    PositionData, RetainedError, RetainedHandle, RetainedScene, Visual, VisualData,
};
use hecs::Entity;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Errors returned when an entity cannot be tracked
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("failed to allocate retained object: {0}")]
    Allocation(#[from] RetainedError),

    #[error("entity {0:?} does not exist")]
    EntityNotFound(Entity),
}

/// What one sync pass sent to the retained scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub position_updates: usize,
    pub visual_updates: usize,
    /// Dirty entries dropped because the entity or its data was gone
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
struct TrackedEntity {
    handle: RetainedHandle,
    kind: VisualKind,
    in_hierarchy: bool,
}

/// Bridge between the entity world and a retained scene
pub struct SyncBridge<R: RetainedScene> {
    scene: R,
    tracked: HashMap<Entity, TrackedEntity>,
    dirty: DirtySet,
}

impl<R: RetainedScene> SyncBridge<R> {
    pub fn new(scene: R) -> Self {
        Self::with_capacity(scene, 0)
    }

    pub fn with_capacity(scene: R, capacity: usize) -> Self {
        Self {
            scene,
            tracked: HashMap::with_capacity(capacity),
            dirty: DirtySet::with_capacity(capacity),
        }
    }

    /// Start mirroring `entity` as a retained object of `kind`.
    ///
    /// Tracking an entity again with the same kind returns its existing
    /// handle. A different kind creates a new object and then destroys the
    /// old one. On allocation failure nothing changes: an untracked entity
    /// stays untracked and a tracked one keeps its current object.
    pub fn track_entity(
        &mut self,
        world: &World,
        entity: Entity,
        kind: VisualKind,
    ) -> Result<RetainedHandle, SyncError> {
        if !world.contains(entity) {
            return Err(SyncError::EntityNotFound(entity));
        }

        let previous = self.tracked.get(&entity).copied();
        if let Some(existing) = previous {
            if existing.kind == kind {
                return Ok(existing.handle);
            }
        }

        // The old object is only released once its replacement exists
        let handle = self.scene.create_object(kind).map_err(|error| {
            warn!(entity = ?entity, kind = ?kind, %error, "Failed to create retained object");
            SyncError::from(error)
        })?;

        self.tracked.insert(
            entity,
            TrackedEntity {
                handle,
                kind,
                in_hierarchy: world.parent(entity).is_some(),
            },
        );
        if let Some(existing) = previous {
            self.scene.destroy_object(existing.handle);
            debug!(entity = ?entity, from = ?existing.kind, to = ?kind, "Replaced retained object kind");
        }
        self.dirty.mark_position(entity);
        self.dirty.mark_visual(entity);

        debug!(entity = ?entity, handle = ?handle, kind = ?kind, "Tracking entity");
        Ok(handle)
    }

    /// Stop mirroring `entity` and destroy its retained object.
    ///
    /// Returns `false` if it was not tracked; calling twice destroys once.
    pub fn untrack_entity(&mut self, entity: Entity) -> bool {
        let Some(tracked) = self.tracked.remove(&entity) else {
            return false;
        };
        self.dirty.remove(entity);
        self.scene.destroy_object(tracked.handle);
        debug!(entity = ?entity, handle = ?tracked.handle, "Untracked entity");
        true
    }

    /// Queue a position update. Ignored for untracked entities.
    pub fn mark_position_dirty(&mut self, entity: Entity) {
        if self.tracked.contains_key(&entity) && self.dirty.mark_position(entity) {
            trace!(entity = ?entity, "Marked position dirty");
        }
    }

    /// Queue a visual update. Ignored for untracked entities.
    pub fn mark_visual_dirty(&mut self, entity: Entity) {
        if self.tracked.contains_key(&entity) && self.dirty.mark_visual(entity) {
            trace!(entity = ?entity, "Marked visual dirty");
        }
    }

    /// Queue position updates for `entity` and every tracked descendant.
    ///
    /// `entity` itself need not be tracked.
    pub fn mark_subtree_position_dirty(&mut self, world: &World, entity: Entity) {
        self.mark_position_dirty(entity);
        if self.tracked.is_empty() || !hierarchy::has_children(world, entity) {
            return;
        }
        for descendant in hierarchy::descendants(world, entity) {
            self.mark_position_dirty(descendant);
        }
    }

    /// Record whether a tracked entity now sits under a parent and queue a
    /// position update for it.
    pub fn update_hierarchy_flag(&mut self, entity: Entity, in_hierarchy: bool) {
        if let Some(tracked) = self.tracked.get_mut(&entity) {
            tracked.in_hierarchy = in_hierarchy;
        }
        self.mark_position_dirty(entity);
    }

    /// Push every pending change to the retained scene.
    ///
    /// Dirty entities that no longer exist are counted as skipped and
    /// untracked, releasing their retained objects.
    pub fn sync(&mut self, world: &World) -> SyncStats {
        let mut stats = SyncStats::default();
        let mut missed = Vec::new();

        for entity in self.dirty.drain_position() {
            let Some(tracked) = self.tracked.get(&entity) else {
                continue;
            };
            match read_position(world, entity, tracked.in_hierarchy) {
                Some(data) => {
                    self.scene.update_position(tracked.handle, &data);
                    stats.position_updates += 1;
                }
                None => {
                    debug!(entity = ?entity, "Skipping position sync for missing entity");
                    stats.skipped += 1;
                    missed.push(entity);
                }
            }
        }

        for entity in self.dirty.drain_visual() {
            let Some(tracked) = self.tracked.get(&entity) else {
                continue;
            };
            match read_visual(world, entity, tracked.kind) {
                Some(data) => {
                    self.scene.update_visual(tracked.handle, &data);
                    stats.visual_updates += 1;
                }
                None => {
                    debug!(entity = ?entity, kind = ?tracked.kind, "Skipping visual sync for missing entity or component");
                    stats.skipped += 1;
                    missed.push(entity);
                }
            }
        }

        for entity in missed {
            if !world.contains(entity) {
                self.untrack_entity(entity);
            }
        }

        trace!(
            position_updates = stats.position_updates,
            visual_updates = stats.visual_updates,
            skipped = stats.skipped,
            "Sync pass complete"
        );
        stats
    }

    /// Untrack every tracked entity that no longer exists in `world`.
    ///
    /// Returns the number released.
    pub fn untrack_despawned(&mut self, world: &World) -> usize {
        let dead: Vec<Entity> = self
            .tracked
            .keys()
            .copied()
            .filter(|&entity| !world.contains(entity))
            .collect();
        for &entity in &dead {
            self.untrack_entity(entity);
        }
        dead.len()
    }

    /// Destroy every retained object and forget all tracking state
    pub fn clear(&mut self) {
        let count = self.tracked.len();
        for (_, tracked) in self.tracked.drain() {
            self.scene.destroy_object(tracked.handle);
        }
        self.dirty.clear();
        debug!(count, "Cleared sync bridge");
    }

    pub fn is_tracked(&self, entity: Entity) -> bool {
        self.tracked.contains_key(&entity)
    }

    pub fn handle(&self, entity: Entity) -> Option<RetainedHandle> {
        self.tracked.get(&entity).map(|t| t.handle)
    }

    pub fn tracked_kind(&self, entity: Entity) -> Option<VisualKind> {
        self.tracked.get(&entity).map(|t| t.kind)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Number of tracked entities waiting for the next sync
    pub fn pending_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn scene(&self) -> &R {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut R {
        &mut self.scene
    }
}

impl<R: RetainedScene> HierarchyListener for SyncBridge<R> {
    fn hierarchy_changed(&mut self, world: &World, entity: Entity, attached: bool) {
        self.update_hierarchy_flag(entity, attached);
        self.mark_subtree_position_dirty(world, entity);
    }

    fn entity_despawned(&mut self, entity: Entity) {
        self.untrack_entity(entity);
    }
}

fn read_position(world: &World, entity: Entity, in_hierarchy: bool) -> Option<PositionData> {
    let transform = if in_hierarchy || world.get::<Parent>(entity).is_ok() {
        hierarchy::world_transform(world, entity)?
    } else if world.contains(entity) {
        world.transform(entity).unwrap_or_default()
    } else {
        return None;
    };
    Some(transform.into())
}

fn read_visual(world: &World, entity: Entity, kind: VisualKind) -> Option<VisualData> {
    let visual = match kind {
        VisualKind::Sprite => Visual::Sprite((*world.get::<Sprite>(entity).ok()?).clone()),
        VisualKind::Shape => Visual::Shape(*world.get::<Shape>(entity).ok()?),
        VisualKind::Text => Visual::Text((*world.get::<Text>(entity).ok()?).clone()),
    };
    let z_index = world.get::<ZIndex>(entity).map(|z| z.0).unwrap_or_default();
    let visible = world.get::<Visible>(entity).map(|v| v.0).unwrap_or(true);

    Some(VisualData {
        visual,
        z_index,
        visible,
    })
}
