//! World wrapper providing helper methods for entity management

use super::components::{Parent, Transform};
use hecs::Entity;

/// Wrapper around hecs::World providing additional helper methods
///
/// This is the entity store the hierarchy and sync layers operate on. Handles
/// are generational, so a handle to a despawned entity is simply reported as
/// missing rather than aliasing a newer entity.
pub struct World {
    inner: hecs::World,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn a new entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Get a reference to a component on an entity
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component on an entity
    pub fn get_mut<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Query a single entity for a mutable component reference
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.inner.query_one_mut::<Q>(entity)
    }

    /// Insert a component into an entity, replacing any existing one
    pub fn insert_one(
        &mut self,
        entity: Entity,
        component: impl hecs::Component,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(entity, component)
    }

    /// Remove a component from an entity, returning it
    pub fn remove_one<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<T, hecs::ComponentError> {
        self.inner.remove_one::<T>(entity)
    }

    /// Query entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query()
    }

    /// Despawn an entity and all its components
    ///
    /// This does not touch hierarchy links; use the hierarchy or scene
    /// functions to destroy entities that may be parented.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Number of live entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Whether the world has no entities
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Despawn every entity
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Copy of an entity's local transform
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get::<Transform>(entity).ok().map(|t| *t)
    }

    /// Copy of an entity's parent link
    pub fn parent(&self, entity: Entity) -> Option<Parent> {
        self.get::<Parent>(entity).ok().map(|p| *p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::components::ParentOptions;
    use glam::Vec2;

    #[test]
    fn test_world_spawn() {
        let mut world = World::new();
        let entity = world.spawn((Transform::default(),));
        assert!(world.contains(entity));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_stale_handle_reads_as_missing() {
        let mut world = World::new();
        let entity = world.spawn((Transform::default(),));
        world.despawn(entity).unwrap();

        // Slot reuse must not resurrect the old handle
        let reused = world.spawn((Transform::from_xy(9.0, 9.0),));
        assert_ne!(entity, reused);
        assert!(!world.contains(entity));
        assert!(world.transform(entity).is_none());
        assert!(world.parent(entity).is_none());
    }

    #[test]
    fn test_parent_copy() {
        let mut world = World::new();
        let parent = world.spawn(());
        let child = world.spawn((Parent::new(parent, ParentOptions::all()),));
        let link = world.parent(child).unwrap();
        assert_eq!(link.entity, parent);
        assert!(link.inherit_scale);
    }
}
