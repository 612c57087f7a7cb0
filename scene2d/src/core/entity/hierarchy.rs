//! Parent-child hierarchy operations.
//!
//! Every function here keeps the [`Parent`] component of a child and the
//! [`Children`] list of its parent in step: `c` is in `Children(p)` exactly
//! when `Parent(c).entity == p`. Reparenting is validated before anything is
//! written, so a rejected call leaves the hierarchy untouched.
//!
//! Changes are reported to a [`HierarchyListener`] passed in by the caller
//! (normally the sync bridge), which is how attach/detach ends up marking
//! entities dirty for the renderer.
//!
//! Entities with physics bodies should not be parented: physics integrates in
//! world space and knows nothing about parent-relative offsets. This is not
//! checked.
//!
//! # Usage
//!
//! ```ignore
//! set_parent(&mut world, &mut bridge, child, parent, ParentOptions::rotation())?;
//! set_parent_keep_transform(&mut world, &mut bridge, child, other, ParentOptions::default())?;
//! remove_parent_keep_transform(&mut world, &mut bridge, child);
//! ```

use super::components::{Children, Parent, ParentOptions, Transform};
use super::world::World;
use crate::core::math;
use hecs::Entity;
use std::collections::{HashSet, TryReserveError};
use tracing::{debug, error, trace, warn};

/// Maximum number of nodes on an ancestor chain a new parent may have
pub const MAX_HIERARCHY_DEPTH: usize = 32;

/// Errors returned when a reparent is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("cannot parent entity {0:?} to itself")]
    SelfParenting(Entity),

    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    CircularHierarchy { child: Entity, parent: Entity },

    #[error("ancestor chain exceeds {max} levels")]
    HierarchyTooDeep { max: usize },

    #[error("entity {0:?} does not exist")]
    EntityNotFound(Entity),

    #[error("failed to grow children list: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Receives hierarchy change notifications
pub trait HierarchyListener {
    /// `entity` was attached to a parent (`attached == true`) or detached.
    /// Called after the hierarchy components have been updated.
    fn hierarchy_changed(&mut self, world: &World, entity: Entity, attached: bool);

    /// `entity` is about to be despawned by [`despawn_recursive`]
    fn entity_despawned(&mut self, _entity: Entity) {}
}

/// Listener that ignores every notification
impl HierarchyListener for () {
    fn hierarchy_changed(&mut self, _world: &World, _entity: Entity, _attached: bool) {}
}

/// Sets `child` as a child of `new_parent`.
///
/// Validation happens first: self-parenting, dead entities, cycles and chains
/// deeper than [`MAX_HIERARCHY_DEPTH`] are rejected without side effects. The
/// child's local [`Transform`] is not modified, so its world position jumps
/// unless the caller uses [`set_parent_keep_transform`].
///
/// Parenting to the current parent only updates the inherit flags.
pub fn set_parent(
    world: &mut World,
    listener: &mut impl HierarchyListener,
    child: Entity,
    new_parent: Entity,
    options: ParentOptions,
) -> Result<(), HierarchyError> {
    if let Err(error) = validate_new_parent(world, child, new_parent) {
        warn!(child = ?child, parent = ?new_parent, %error, "Rejected reparent");
        return Err(error);
    }

    let old_parent = world.parent(child).map(|p| p.entity);
    if old_parent != Some(new_parent) {
        // Fallible step first; nothing has been written if it fails
        add_to_children_list(world, new_parent, child)?;
        if let Some(old_parent) = old_parent {
            remove_from_children_list(world, old_parent, child);
        }
    }

    let link = Parent::new(new_parent, options);
    match world.query_one_mut::<&mut Parent>(child) {
        Ok(parent) => *parent = link,
        Err(_) => world
            .insert_one(child, link)
            .map_err(|_| HierarchyError::EntityNotFound(child))?,
    }

    debug!(child = ?child, parent = ?new_parent, old_parent = ?old_parent, "Set parent");
    listener.hierarchy_changed(world, child, true);
    Ok(())
}

/// Like [`set_parent`], but rewrites the child's local transform so that its
/// world transform is the same after the call as before it.
///
/// Fails with [`HierarchyError::HierarchyTooDeep`] if either world transform
/// cannot be computed; nothing is modified in that case.
pub fn set_parent_keep_transform(
    world: &mut World,
    listener: &mut impl HierarchyListener,
    child: Entity,
    new_parent: Entity,
    options: ParentOptions,
) -> Result<(), HierarchyError> {
    // World transform has to be read while the old Parent link is in place
    validate_new_parent(world, child, new_parent)?;
    let too_deep = HierarchyError::HierarchyTooDeep {
        max: MAX_HIERARCHY_DEPTH,
    };
    let world_before = world_transform(world, child).ok_or(too_deep.clone())?;
    let parent_world = world_transform(world, new_parent).ok_or(too_deep)?;

    set_parent(world, listener, child, new_parent, options)?;

    let local = math::to_local(&parent_world, &world_before, options);
    write_transform(world, child, local);

    trace!(child = ?child, local = ?local, "Preserved world transform across reparent");
    Ok(())
}

/// Removes the parent relationship from `child`.
///
/// Returns `false` without notifying anyone if `child` had no parent.
pub fn remove_parent(world: &mut World, listener: &mut impl HierarchyListener, child: Entity) -> bool {
    let Ok(parent) = world.remove_one::<Parent>(child) else {
        return false;
    };

    remove_from_children_list(world, parent.entity, child);
    debug!(child = ?child, parent = ?parent.entity, "Removed parent");
    listener.hierarchy_changed(world, child, false);
    true
}

/// Like [`remove_parent`], but the child keeps its world transform.
///
/// A root's local transform is its world transform, so the captured world
/// transform is assigned directly. If the world transform cannot be computed
/// the child is left attached and `false` is returned.
pub fn remove_parent_keep_transform(
    world: &mut World,
    listener: &mut impl HierarchyListener,
    child: Entity,
) -> bool {
    if world.parent(child).is_none() {
        return false;
    }

    let Some(world_before) = world_transform(world, child) else {
        warn!(child = ?child, "Cannot detach keeping transform: world transform unavailable");
        return false;
    };
    if !remove_parent(world, listener, child) {
        return false;
    }
    write_transform(world, child, world_before);
    true
}

/// Despawns an entity and all its descendants.
///
/// The entity is first detached from its parent; the listener is told about
/// each entity before it is despawned. Returns the number of despawned
/// entities.
pub fn despawn_recursive(
    world: &mut World,
    listener: &mut impl HierarchyListener,
    entity: Entity,
) -> usize {
    if !world.contains(entity) {
        return 0;
    }

    if let Some(parent) = world.parent(entity) {
        remove_from_children_list(world, parent.entity, entity);
    }

    let mut subtree = vec![entity];
    subtree.extend(descendants(world, entity));

    let mut count = 0;
    for e in subtree {
        listener.entity_despawned(e);
        if world.despawn(e).is_ok() {
            count += 1;
        }
    }

    debug!(entity = ?entity, count, "Despawned subtree");
    count
}

/// The entity's parent, if any
pub fn get_parent(world: &World, entity: Entity) -> Option<Entity> {
    world.parent(entity).map(|p| p.entity)
}

/// The entity's direct children in insertion order; empty if it has none
pub fn get_children(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<Children>(entity)
        .map(|children| children.0.clone())
        .unwrap_or_default()
}

/// Whether the entity has at least one child
pub fn has_children(world: &World, entity: Entity) -> bool {
    world
        .get::<Children>(entity)
        .map(|children| !children.is_empty())
        .unwrap_or(false)
}

/// Whether the entity has no parent. Dead entities count as roots.
pub fn is_root(world: &World, entity: Entity) -> bool {
    world.get::<Parent>(entity).is_err()
}

/// Ancestors from the direct parent up to the root.
///
/// Stops after [`MAX_HIERARCHY_DEPTH`] + 1 entries so a corrupted (cyclic)
/// chain cannot loop forever.
pub fn ancestors(world: &World, entity: Entity) -> Vec<Entity> {
    let mut chain = Vec::new();
    let mut current = entity;
    while let Some(parent) = world.parent(current) {
        chain.push(parent.entity);
        if chain.len() > MAX_HIERARCHY_DEPTH {
            warn!(entity = ?entity, "Ancestor chain exceeds depth limit");
            break;
        }
        current = parent.entity;
    }
    chain
}

/// Number of ancestors; 0 for a root
pub fn depth(world: &World, entity: Entity) -> usize {
    ancestors(world, entity).len()
}

/// All descendants, depth-first pre-order, excluding `entity` itself
pub fn descendants(world: &World, entity: Entity) -> Vec<Entity> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(entity);

    let mut stack: Vec<Entity> = get_children(world, entity).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            error!(entity = ?current, "Cycle detected while walking descendants");
            continue;
        }
        result.push(current);
        stack.extend(get_children(world, current).into_iter().rev());
    }
    result
}

/// World-space transform of `entity`, composed up through all ancestors.
///
/// Entities without a [`Transform`] contribute the identity. Returns `None`
/// for dead entities or when the chain is longer than the depth limit
/// (which only happens if the components were edited around this module).
pub fn world_transform(world: &World, entity: Entity) -> Option<Transform> {
    if !world.contains(entity) {
        return None;
    }

    let mut chain: Vec<(Transform, ParentOptions)> = Vec::new();
    let mut current = entity;
    let root = loop {
        let local = world.transform(current).unwrap_or_default();
        match world.parent(current) {
            Some(parent) => {
                chain.push((local, parent.options()));
                if chain.len() > MAX_HIERARCHY_DEPTH {
                    warn!(entity = ?entity, "Cannot compute world transform: chain too deep");
                    return None;
                }
                current = parent.entity;
            }
            None => break local,
        }
    };

    Some(
        chain
            .iter()
            .rev()
            .fold(root, |parent_world, (local, options)| {
                math::to_world(&parent_world, local, *options)
            }),
    )
}

/// A violation of the parent/children invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyIssue {
    /// `child` points at a parent that no longer exists
    OrphanedParentPointer { child: Entity, parent: Entity },
    /// `child` points at `parent`, but is missing from its children list
    MissingChildEntry { child: Entity, parent: Entity },
    /// `child` appears more than once in `parent`'s children list
    DuplicateChildEntry { child: Entity, parent: Entity },
    /// `parent` lists `child`, which is dead or points elsewhere
    DanglingChild { child: Entity, parent: Entity },
    /// `parent` carries an empty children list
    EmptyChildren { parent: Entity },
}

/// Check the bidirectional parent/children invariant across the world.
///
/// Every issue is logged at error level and returned.
pub fn validate_hierarchy(world: &World) -> Vec<HierarchyIssue> {
    let mut issues = Vec::new();

    for (child, parent) in world.query::<&Parent>().iter() {
        let parent = parent.entity;
        if !world.contains(parent) {
            issues.push(HierarchyIssue::OrphanedParentPointer { child, parent });
            continue;
        }
        let occurrences = world
            .get::<Children>(parent)
            .map(|children| children.iter().filter(|&c| c == child).count())
            .unwrap_or(0);
        match occurrences {
            0 => issues.push(HierarchyIssue::MissingChildEntry { child, parent }),
            1 => {}
            _ => issues.push(HierarchyIssue::DuplicateChildEntry { child, parent }),
        }
    }

    for (parent, children) in world.query::<&Children>().iter() {
        if children.is_empty() {
            issues.push(HierarchyIssue::EmptyChildren { parent });
        }
        for child in children.iter() {
            if get_parent(world, child) != Some(parent) {
                issues.push(HierarchyIssue::DanglingChild { child, parent });
            }
        }
    }

    for issue in &issues {
        error!(issue = ?issue, "Hierarchy invariant violated");
    }
    if issues.is_empty() {
        trace!("Hierarchy validation passed");
    }
    issues
}

/// Reject self-parenting, dead entities, cycles and over-deep chains.
///
/// The bound covers the whole subtree being moved: after the attach, no
/// descendant of `child` may sit more than [`MAX_HIERARCHY_DEPTH`] levels
/// below a root.
fn validate_new_parent(world: &World, child: Entity, new_parent: Entity) -> Result<(), HierarchyError> {
    if child == new_parent {
        return Err(HierarchyError::SelfParenting(child));
    }
    for entity in [child, new_parent] {
        if !world.contains(entity) {
            return Err(HierarchyError::EntityNotFound(entity));
        }
    }

    let too_deep = HierarchyError::HierarchyTooDeep {
        max: MAX_HIERARCHY_DEPTH,
    };

    let mut current = new_parent;
    let mut visited = 0;
    loop {
        if current == child {
            return Err(HierarchyError::CircularHierarchy {
                child,
                parent: new_parent,
            });
        }
        visited += 1;
        if visited > MAX_HIERARCHY_DEPTH {
            return Err(too_deep);
        }
        match world.parent(current) {
            Some(parent) => current = parent.entity,
            None => break,
        }
    }

    // `visited` is the depth `child` lands at; its deepest descendant lands
    // `subtree_height - 1` levels further down.
    if visited + subtree_height(world, child) - 1 > MAX_HIERARCHY_DEPTH {
        return Err(too_deep);
    }
    Ok(())
}

/// Number of levels in the subtree rooted at `root`; 1 for a leaf.
fn subtree_height(world: &World, root: Entity) -> usize {
    let mut height = 0;
    let mut visited = HashSet::new();
    let mut stack = vec![(root, 1)];
    while let Some((entity, level)) = stack.pop() {
        if !visited.insert(entity) {
            continue;
        }
        height = height.max(level);
        stack.extend(get_children(world, entity).into_iter().map(|c| (c, level + 1)));
    }
    height
}

/// Append `child` to `parent`'s children list.
///
/// Either the list ends up containing `child` or it is left exactly as it
/// was and the allocation error is returned.
fn add_to_children_list(world: &mut World, parent: Entity, child: Entity) -> Result<(), HierarchyError> {
    if let Ok(mut children) = world.get_mut::<Children>(parent) {
        if !children.contains(child) {
            children.0.try_reserve(1)?;
            children.0.push(child);
        }
        return Ok(());
    }

    let mut list = Vec::new();
    list.try_reserve_exact(1)?;
    list.push(child);
    world
        .insert_one(parent, Children(list))
        .map_err(|_| HierarchyError::EntityNotFound(parent))
}

/// Remove `child` from `parent`'s children list, dropping the component when
/// it becomes empty.
fn remove_from_children_list(world: &mut World, parent: Entity, child: Entity) {
    let now_empty = match world.get_mut::<Children>(parent) {
        Ok(mut children) => {
            if let Some(index) = children.0.iter().position(|&e| e == child) {
                children.0.remove(index);
            }
            children.is_empty()
        }
        Err(_) => return,
    };

    if now_empty {
        let _ = world.remove_one::<Children>(parent);
    }
}

fn write_transform(world: &mut World, entity: Entity, transform: Transform) {
    match world.query_one_mut::<&mut Transform>(entity) {
        Ok(current) => *current = transform,
        Err(_) => {
            let _ = world.insert_one(entity, transform);
        }
    }
}
