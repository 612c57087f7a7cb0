//! Scene facade owning the world, the sync bridge and the configuration.
//!
//! Every mutator here marks the affected entities dirty as a side effect, so
//! game code never has to remember to. Mutating through [`Scene::world_mut`]
//! bypasses that; call [`Scene::mark_position_dirty`] or
//! [`Scene::mark_visual_dirty`] afterwards.
//!
//! # Usage
//!
//! ```ignore
//! let mut scene = Scene::new(MemoryScene::new());
//! let ship = scene.spawn_at(100.0, 50.0);
//! scene.add_sprite(ship, Sprite::new("ship"))?;
//! scene.move_position(ship, Vec2::new(4.0, 0.0));
//! let stats = scene.sync();
//! ```

use crate::config::SceneConfig;
use crate::core::entity::components::{ParentOptions, Transform};
use crate::core::entity::hierarchy::{self, HierarchyError, HierarchyIssue};
use crate::core::entity::visuals::{Color, Shape, Sprite, Text, Visible, VisualKind, ZIndex};
use crate::core::entity::world::World;
use crate::graphics::memory_scene::MemoryScene;
use crate::graphics::retained::{RetainedHandle, RetainedScene};
use crate::sync::bridge::{SyncBridge, SyncError, SyncStats};
use glam::Vec2;
use hecs::Entity;
use tracing::{debug, info, warn};

/// A 2D scene synchronized to a retained renderer
pub struct Scene<R: RetainedScene = MemoryScene> {
    world: World,
    bridge: SyncBridge<R>,
    config: SceneConfig,
    frame: u64,
}

impl Default for Scene<MemoryScene> {
    fn default() -> Self {
        Self::new(MemoryScene::new())
    }
}

impl<R: RetainedScene> Scene<R> {
    pub fn new(retained: R) -> Self {
        Self::with_config(retained, SceneConfig::default())
    }

    pub fn with_config(retained: R, config: SceneConfig) -> Self {
        debug!(config = ?config, "Creating scene");
        Self {
            world: World::new(),
            bridge: SyncBridge::with_capacity(retained, config.initial_capacity),
            config,
            frame: 0,
        }
    }

    // ---- Entity lifecycle ----

    /// Spawn a root entity with the given local transform
    pub fn spawn(&mut self, transform: Transform) -> Entity {
        self.world.spawn((transform,))
    }

    pub fn spawn_at(&mut self, x: f32, y: f32) -> Entity {
        self.spawn(Transform::from_xy(x, y))
    }

    /// Destroy a single entity.
    ///
    /// Its retained object is released and it is detached from its parent.
    /// Children become roots; with `preserve_child_transforms_on_destroy` they
    /// keep their world transform. Returns `false` for a dead entity.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.world.contains(entity) {
            return false;
        }

        self.bridge.untrack_entity(entity);
        hierarchy::remove_parent(&mut self.world, &mut self.bridge, entity);

        let preserve = self.config.preserve_child_transforms_on_destroy;
        for child in hierarchy::get_children(&self.world, entity) {
            let kept = preserve
                && hierarchy::remove_parent_keep_transform(&mut self.world, &mut self.bridge, child);
            if !kept {
                hierarchy::remove_parent(&mut self.world, &mut self.bridge, child);
            }
        }

        let despawned = self.world.despawn(entity).is_ok();
        debug!(entity = ?entity, "Destroyed entity");
        despawned
    }

    /// Destroy an entity together with its whole subtree.
    ///
    /// Returns the number of entities destroyed.
    pub fn destroy_recursive(&mut self, entity: Entity) -> usize {
        hierarchy::despawn_recursive(&mut self.world, &mut self.bridge, entity)
    }

    /// Release every retained object and despawn every entity
    pub fn unload(&mut self) {
        let entities = self.world.len();
        self.bridge.clear();
        self.world.clear();
        info!(entities, "Unloaded scene");
    }

    // ---- Transforms ----

    pub fn set_position(&mut self, entity: Entity, position: Vec2) -> bool {
        self.modify_transform(entity, |t| t.position = position)
    }

    pub fn set_position_xy(&mut self, entity: Entity, x: f32, y: f32) -> bool {
        self.set_position(entity, Vec2::new(x, y))
    }

    /// Offset the local position by `delta`
    pub fn move_position(&mut self, entity: Entity, delta: Vec2) -> bool {
        self.modify_transform(entity, |t| t.position += delta)
    }

    /// Set local rotation in radians
    pub fn set_rotation(&mut self, entity: Entity, rotation: f32) -> bool {
        self.modify_transform(entity, |t| t.rotation = rotation)
    }

    /// Add `delta` radians to the local rotation
    pub fn rotate(&mut self, entity: Entity, delta: f32) -> bool {
        self.modify_transform(entity, |t| t.rotation += delta)
    }

    pub fn set_scale(&mut self, entity: Entity, scale: Vec2) -> bool {
        self.modify_transform(entity, |t| t.scale = scale)
    }

    /// Local position
    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.world.transform(entity).map(|t| t.position)
    }

    /// Local transform
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.transform(entity)
    }

    pub fn world_transform(&self, entity: Entity) -> Option<Transform> {
        hierarchy::world_transform(&self.world, entity)
    }

    pub fn world_position(&self, entity: Entity) -> Option<Vec2> {
        self.world_transform(entity).map(|t| t.position)
    }

    // ---- Visuals ----

    /// Attach a sprite and start mirroring the entity as a sprite object
    pub fn add_sprite(&mut self, entity: Entity, sprite: Sprite) -> Result<RetainedHandle, SyncError> {
        self.add_visual(entity, sprite, VisualKind::Sprite)
    }

    pub fn add_shape(&mut self, entity: Entity, shape: Shape) -> Result<RetainedHandle, SyncError> {
        self.add_visual(entity, shape, VisualKind::Shape)
    }

    pub fn add_text(&mut self, entity: Entity, text: Text) -> Result<RetainedHandle, SyncError> {
        self.add_visual(entity, text, VisualKind::Text)
    }

    /// Remove the entity's visual and release its retained object.
    ///
    /// Returns `false` if it had none.
    pub fn remove_visual(&mut self, entity: Entity) -> bool {
        let untracked = self.bridge.untrack_entity(entity);
        let removed = self.remove_visual_components(entity, None);
        untracked || removed
    }

    pub fn set_z_index(&mut self, entity: Entity, z_index: i16) -> bool {
        self.set_visual_component(entity, ZIndex(z_index))
    }

    pub fn set_visible(&mut self, entity: Entity, visible: bool) -> bool {
        self.set_visual_component(entity, Visible(visible))
    }

    pub fn set_sprite_tint(&mut self, entity: Entity, tint: Color) -> bool {
        let Ok(sprite) = self.world.query_one_mut::<&mut Sprite>(entity) else {
            return false;
        };
        sprite.tint = tint;
        self.bridge.mark_visual_dirty(entity);
        true
    }

    pub fn set_text(&mut self, entity: Entity, content: impl Into<String>) -> bool {
        let Ok(text) = self.world.query_one_mut::<&mut Text>(entity) else {
            return false;
        };
        text.content = content.into();
        self.bridge.mark_visual_dirty(entity);
        true
    }

    pub fn set_shape_color(&mut self, entity: Entity, color: Color) -> bool {
        let Ok(shape) = self.world.query_one_mut::<&mut Shape>(entity) else {
            return false;
        };
        shape.color = color;
        self.bridge.mark_visual_dirty(entity);
        true
    }

    // ---- Hierarchy ----

    pub fn set_parent(
        &mut self,
        child: Entity,
        parent: Entity,
        options: ParentOptions,
    ) -> Result<(), HierarchyError> {
        hierarchy::set_parent(&mut self.world, &mut self.bridge, child, parent, options)
    }

    pub fn set_parent_keep_transform(
        &mut self,
        child: Entity,
        parent: Entity,
        options: ParentOptions,
    ) -> Result<(), HierarchyError> {
        hierarchy::set_parent_keep_transform(&mut self.world, &mut self.bridge, child, parent, options)
    }

    pub fn remove_parent(&mut self, child: Entity) -> bool {
        hierarchy::remove_parent(&mut self.world, &mut self.bridge, child)
    }

    pub fn remove_parent_keep_transform(&mut self, child: Entity) -> bool {
        hierarchy::remove_parent_keep_transform(&mut self.world, &mut self.bridge, child)
    }

    pub fn get_parent(&self, entity: Entity) -> Option<Entity> {
        hierarchy::get_parent(&self.world, entity)
    }

    pub fn get_children(&self, entity: Entity) -> Vec<Entity> {
        hierarchy::get_children(&self.world, entity)
    }

    pub fn has_children(&self, entity: Entity) -> bool {
        hierarchy::has_children(&self.world, entity)
    }

    pub fn is_root(&self, entity: Entity) -> bool {
        hierarchy::is_root(&self.world, entity)
    }

    pub fn depth(&self, entity: Entity) -> usize {
        hierarchy::depth(&self.world, entity)
    }

    pub fn validate_hierarchy(&self) -> Vec<HierarchyIssue> {
        hierarchy::validate_hierarchy(&self.world)
    }

    // ---- Sync ----

    /// Queue a position update for `entity` and its tracked descendants
    pub fn mark_position_dirty(&mut self, entity: Entity) {
        self.bridge.mark_subtree_position_dirty(&self.world, entity);
    }

    pub fn mark_visual_dirty(&mut self, entity: Entity) {
        self.bridge.mark_visual_dirty(entity);
    }

    /// Push this frame's changes to the retained scene
    pub fn sync(&mut self) -> SyncStats {
        if self.config.validate_on_sync {
            let issues = hierarchy::validate_hierarchy(&self.world);
            if !issues.is_empty() {
                warn!(frame = self.frame, count = issues.len(), "Hierarchy issues before sync");
            }
        }

        let stats = self.bridge.sync(&self.world);
        self.bridge.untrack_despawned(&self.world);
        self.frame += 1;
        stats
    }

    /// Number of completed sync passes
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_tracked(&self, entity: Entity) -> bool {
        self.bridge.is_tracked(entity)
    }

    pub fn handle(&self, entity: Entity) -> Option<RetainedHandle> {
        self.bridge.handle(entity)
    }

    // ---- Accessors ----

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access. Changes made here are not marked dirty; tracked
    /// entities despawned here are released at the next [`Scene::sync`].
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn bridge(&self) -> &SyncBridge<R> {
        &self.bridge
    }

    pub fn retained(&self) -> &R {
        self.bridge.scene()
    }

    pub fn retained_mut(&mut self) -> &mut R {
        self.bridge.scene_mut()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // ---- Helpers ----

    fn modify_transform(&mut self, entity: Entity, f: impl FnOnce(&mut Transform)) -> bool {
        match self.world.query_one_mut::<&mut Transform>(entity) {
            Ok(transform) => f(transform),
            Err(_) => {
                if !self.world.contains(entity) {
                    return false;
                }
                let mut transform = Transform::default();
                f(&mut transform);
                let _ = self.world.insert_one(entity, transform);
            }
        }
        self.bridge.mark_subtree_position_dirty(&self.world, entity);
        true
    }

    fn set_visual_component(&mut self, entity: Entity, component: impl hecs::Component) -> bool {
        if self.world.insert_one(entity, component).is_err() {
            return false;
        }
        self.bridge.mark_visual_dirty(entity);
        true
    }

    fn add_visual<C: hecs::Component>(
        &mut self,
        entity: Entity,
        component: C,
        kind: VisualKind,
    ) -> Result<RetainedHandle, SyncError> {
        if !self.world.contains(entity) {
            return Err(SyncError::EntityNotFound(entity));
        }

        // Allocate first; a failure must leave the previous visual untouched
        let handle = self.bridge.track_entity(&self.world, entity, kind)?;

        self.remove_visual_components(entity, Some(kind));
        self.world
            .insert_one(entity, component)
            .map_err(|_| SyncError::EntityNotFound(entity))?;
        self.bridge.mark_visual_dirty(entity);
        Ok(handle)
    }

    /// Strip visual components other than `keep`. Returns whether any were
    /// present.
    fn remove_visual_components(&mut self, entity: Entity, keep: Option<VisualKind>) -> bool {
        let mut removed = false;
        if keep != Some(VisualKind::Sprite) {
            removed |= self.world.remove_one::<Sprite>(entity).is_ok();
        }
        if keep != Some(VisualKind::Shape) {
            removed |= self.world.remove_one::<Shape>(entity).is_ok();
        }
        if keep != Some(VisualKind::Text) {
            removed |= self.world.remove_one::<Text>(entity).is_ok();
        }
        removed
    }
}
