//! Integration tests for the scene facade driving a retained scene

use scene2d::graphics::{MemoryScene, RetainedCall, RetainedError};
use scene2d::prelude::*;

fn tracked_shape(scene: &mut Scene, x: f32, y: f32) -> (Entity, RetainedHandle) {
    let entity = scene.spawn_at(x, y);
    let handle = scene
        .add_shape(entity, Shape::rectangle(2.0, 2.0, Color::GREEN))
        .expect("Failed to track shape");
    (entity, handle)
}

#[test]
fn test_three_moves_one_update() {
    let mut scene = Scene::new(MemoryScene::new());
    let (entity, handle) = tracked_shape(&mut scene, 0.0, 0.0);
    scene.sync();
    scene.retained_mut().take_calls();

    scene.set_position_xy(entity, 1.0, 0.0);
    scene.set_position_xy(entity, 2.0, 0.0);
    scene.set_position_xy(entity, 7.0, -3.0);
    let stats = scene.sync();

    assert_eq!(stats.position_updates, 1);
    assert_eq!(stats.visual_updates, 0);
    let calls = scene.retained().calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        RetainedCall::UpdatePosition { handle: h, data } => {
            assert_eq!(*h, handle);
            assert_eq!(data.position, Vec2::new(7.0, -3.0));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_quiet_frame_sends_nothing() {
    let mut scene = Scene::new(MemoryScene::new());
    tracked_shape(&mut scene, 0.0, 0.0);
    scene.sync();
    scene.retained_mut().take_calls();

    assert_eq!(scene.sync(), SyncStats::default());
    assert!(scene.retained().calls().is_empty());
}

#[test]
fn test_destroy_before_sync() {
    let mut scene = Scene::new(MemoryScene::new());
    let (entity, handle) = tracked_shape(&mut scene, 0.0, 0.0);
    scene.set_position_xy(entity, 5.0, 5.0);
    scene.set_z_index(entity, 2);

    assert!(scene.destroy(entity));
    let stats = scene.sync();

    assert_eq!(stats, SyncStats::default());
    assert_eq!(scene.retained().destroy_count(handle), 1);
    assert!(scene.retained().position_updates(handle).is_empty());
}

#[test]
fn test_despawn_behind_bridge_is_skipped() {
    let mut scene = Scene::new(MemoryScene::new());
    let (entity, _) = tracked_shape(&mut scene, 0.0, 0.0);
    scene.world_mut().despawn(entity).unwrap();

    let stats = scene.sync();
    assert_eq!(stats.position_updates, 0);
    assert_eq!(stats.skipped, 2);
    assert_eq!(scene.bridge().tracked_count(), 0);
    assert_eq!(scene.retained().len(), 0);
}

#[test]
fn test_despawn_of_clean_entity_released_on_sync() {
    let mut scene = Scene::new(MemoryScene::new());
    let (entity, handle) = tracked_shape(&mut scene, 0.0, 0.0);
    scene.sync();

    scene.world_mut().despawn(entity).unwrap();
    for _ in 0..3 {
        scene.sync();
    }

    assert_eq!(scene.bridge().tracked_count(), 0);
    assert_eq!(scene.retained().len(), 0);
    assert_eq!(scene.retained().destroy_count(handle), 1);
}

#[test]
fn test_grafting_deep_subtree_rejected() {
    let mut scene = Scene::new(MemoryScene::new());
    let mut trunk = vec![scene.spawn_at(0.0, 0.0)];
    for i in 1..30 {
        let node = scene.spawn_at(1.0, 0.0);
        scene.set_parent(node, trunk[i - 1], ParentOptions::default()).unwrap();
        trunk.push(node);
    }
    let mut branch = vec![scene.spawn_at(0.0, 0.0)];
    for i in 1..5 {
        let (node, _) = tracked_shape(&mut scene, 1.0, 0.0);
        scene.set_parent(node, branch[i - 1], ParentOptions::default()).unwrap();
        branch.push(node);
    }
    let (leaf, handle) = (branch[4], scene.handle(branch[4]).unwrap());
    scene.sync();

    assert_eq!(
        scene.set_parent(branch[0], trunk[29], ParentOptions::default()),
        Err(HierarchyError::HierarchyTooDeep {
            max: MAX_HIERARCHY_DEPTH
        })
    );
    assert!(scene.is_root(branch[0]));

    scene.set_position_xy(leaf, 2.0, 0.0);
    let stats = scene.sync();
    assert_eq!(stats.skipped, 0);
    let data = *scene.retained().position_updates(handle).last().unwrap();
    assert_eq!(data.position, Vec2::new(5.0, 0.0));
}

#[test]
fn test_untrack_twice_destroys_once() {
    let mut scene = Scene::new(MemoryScene::new());
    let (entity, handle) = tracked_shape(&mut scene, 0.0, 0.0);

    assert!(scene.remove_visual(entity));
    assert!(!scene.remove_visual(entity));
    scene.destroy(entity);

    assert_eq!(scene.retained().destroy_count(handle), 1);
}

#[test]
fn test_tracking_failure_propagates() {
    let mut scene = Scene::new(MemoryScene::with_capacity_limit(1));
    let first = scene.spawn_at(0.0, 0.0);
    let second = scene.spawn_at(0.0, 0.0);

    assert!(scene.add_sprite(first, Sprite::new("a")).is_ok());
    let result = scene.add_sprite(second, Sprite::new("b"));

    assert_eq!(
        result,
        Err(SyncError::Allocation(RetainedError::OutOfCapacity {
            capacity: 1
        }))
    );
    assert!(!scene.is_tracked(second));
    assert_eq!(scene.sync().visual_updates, 1);
}

#[test]
fn test_detach_root_marks_nothing() {
    let mut scene = Scene::new(MemoryScene::new());
    let (entity, _) = tracked_shape(&mut scene, 0.0, 0.0);
    scene.sync();

    assert!(!scene.remove_parent(entity));
    assert!(!scene.remove_parent_keep_transform(entity));
    assert_eq!(scene.bridge().pending_count(), 0);
}

#[test]
fn test_reparent_pushes_world_position() {
    let mut scene = Scene::new(MemoryScene::new());
    let parent = scene.spawn(Transform::from_xy(100.0, 0.0).with_rotation(std::f32::consts::FRAC_PI_2));
    let (child, handle) = tracked_shape(&mut scene, 10.0, 0.0);
    scene.sync();

    scene
        .set_parent(child, parent, ParentOptions::rotation())
        .unwrap();
    scene.sync();

    let data = *scene.retained().position_updates(handle).last().unwrap();
    assert!((data.position - Vec2::new(100.0, 10.0)).length() < 1e-4);
    assert!((data.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
}

#[test]
fn test_keep_transform_reparent_keeps_rendered_position() {
    let mut scene = Scene::new(MemoryScene::new());
    let parent = scene.spawn(Transform::default().with_rotation(std::f32::consts::FRAC_PI_2));
    let (child, handle) = tracked_shape(&mut scene, 10.0, 0.0);
    scene.sync();

    scene
        .set_parent_keep_transform(child, parent, ParentOptions::rotation())
        .unwrap();
    scene.sync();

    let data = *scene.retained().position_updates(handle).last().unwrap();
    assert!((data.position - Vec2::new(10.0, 0.0)).length() < 1e-4);
    assert!(data.rotation.abs() < 1e-4);
}

#[test]
fn test_rotating_parent_updates_whole_subtree() {
    let mut scene = Scene::new(MemoryScene::new());
    let root = scene.spawn_at(0.0, 0.0);
    let (arm, arm_handle) = tracked_shape(&mut scene, 5.0, 0.0);
    let (hand, hand_handle) = tracked_shape(&mut scene, 2.0, 0.0);
    scene.set_parent(arm, root, ParentOptions::rotation()).unwrap();
    scene.set_parent(hand, arm, ParentOptions::rotation()).unwrap();
    scene.sync();

    scene.rotate(root, std::f32::consts::PI);
    let stats = scene.sync();
    assert_eq!(stats.position_updates, 2);

    let arm_pos = scene.retained().object(arm_handle).unwrap().position.unwrap();
    let hand_pos = scene.retained().object(hand_handle).unwrap().position.unwrap();
    assert!((arm_pos.position - Vec2::new(-5.0, 0.0)).length() < 1e-4);
    assert!((hand_pos.position - Vec2::new(-7.0, 0.0)).length() < 1e-4);
}

#[test]
fn test_destroy_recursive_releases_subtree() {
    let mut scene = Scene::new(MemoryScene::new());
    let (root, root_handle) = tracked_shape(&mut scene, 0.0, 0.0);
    let (child, child_handle) = tracked_shape(&mut scene, 0.0, 0.0);
    scene.set_parent(child, root, ParentOptions::default()).unwrap();

    assert_eq!(scene.destroy_recursive(root), 2);
    assert_eq!(scene.retained().destroy_count(root_handle), 1);
    assert_eq!(scene.retained().destroy_count(child_handle), 1);
    assert!(scene.retained().is_empty());
    assert_eq!(scene.bridge().tracked_count(), 0);
}

#[test]
fn test_unload_then_reuse() {
    let mut scene = Scene::new(MemoryScene::new());
    for i in 0..3 {
        tracked_shape(&mut scene, i as f32, 0.0);
    }
    scene.unload();
    assert!(scene.retained().is_empty());
    assert_eq!(scene.bridge().pending_count(), 0);

    let (_, handle) = tracked_shape(&mut scene, 0.0, 0.0);
    let stats = scene.sync();
    assert_eq!(stats.position_updates, 1);
    assert!(scene.retained().object(handle).is_some());
}

#[test]
fn test_validate_on_sync_does_not_block_sync() {
    let config = SceneConfig {
        validate_on_sync: true,
        ..SceneConfig::default()
    };
    let mut scene = Scene::with_config(MemoryScene::new(), config);
    let (child, _) = tracked_shape(&mut scene, 0.0, 0.0);
    let parent = scene.spawn_at(0.0, 0.0);

    // Corrupt the hierarchy behind the scene's back
    scene
        .world_mut()
        .insert_one(child, Parent::new(parent, ParentOptions::default()))
        .unwrap();

    assert_eq!(scene.validate_hierarchy().len(), 1);
    let stats = scene.sync();
    assert_eq!(stats.position_updates, 1);
}
