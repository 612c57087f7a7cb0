use hecs::Entity;
use std::collections::HashSet;

/// Entities whose renderer-visible state changed since the last sync.
///
/// Position and visual changes are tracked separately so a sync pass only
/// re-reads what actually changed. Marking twice is a no-op.
#[derive(Debug, Default)]
pub struct DirtySet {
    position: HashSet<Entity>,
    visual: HashSet<Entity>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            position: HashSet::with_capacity(capacity),
            visual: HashSet::with_capacity(capacity),
        }
    }

    /// Returns `true` if the entity was not already position-dirty
    pub fn mark_position(&mut self, entity: Entity) -> bool {
        self.position.insert(entity)
    }

    /// Returns `true` if the entity was not already visual-dirty
    pub fn mark_visual(&mut self, entity: Entity) -> bool {
        self.visual.insert(entity)
    }

    pub fn is_position_dirty(&self, entity: Entity) -> bool {
        self.position.contains(&entity)
    }

    pub fn is_visual_dirty(&self, entity: Entity) -> bool {
        self.visual.contains(&entity)
    }

    /// Forget any pending change for `entity`
    pub fn remove(&mut self, entity: Entity) {
        self.position.remove(&entity);
        self.visual.remove(&entity);
    }

    /// Number of distinct entities with a pending change
    pub fn len(&self) -> usize {
        self.position.len() + self.visual.difference(&self.position).count()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty() && self.visual.is_empty()
    }

    /// Empty the position set, keeping its allocation
    pub fn drain_position(&mut self) -> Vec<Entity> {
        self.position.drain().collect()
    }

    /// Empty the visual set, keeping its allocation
    pub fn drain_visual(&mut self) -> Vec<Entity> {
        self.visual.drain().collect()
    }

    pub fn clear(&mut self) {
        self.position.clear();
        self.visual.clear();
    }
}
