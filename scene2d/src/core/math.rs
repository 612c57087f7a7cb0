//! 2D transform composition shared by the hierarchy and the sync bridge

use crate::core::entity::components::{ParentOptions, Transform};
use glam::Vec2;

/// Rotate `v` counter-clockwise by `angle` radians
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Compose a child's local transform onto its parent's world transform.
///
/// The offset is scaled first, then rotated, then translated:
/// `world = parent.position + R(parent.rotation) * (parent.scale * local.position)`,
/// where the rotation and scale steps only apply when the matching inherit
/// flag is set.
pub fn to_world(parent_world: &Transform, local: &Transform, options: ParentOptions) -> Transform {
    let mut offset = local.position;
    let mut scale = local.scale;
    let mut rotation = local.rotation;

    if options.inherit_scale {
        offset *= parent_world.scale;
        scale *= parent_world.scale;
    }
    if options.inherit_rotation {
        offset = rotate(offset, parent_world.rotation);
        rotation += parent_world.rotation;
    }

    Transform {
        position: parent_world.position + offset,
        rotation,
        scale,
    }
}

/// Inverse of [`to_world`]: the local transform that places a child at
/// `world` under a parent at `parent_world`.
///
/// A zero component in the parent's scale cannot be inverted; that axis is
/// left unscaled.
pub fn to_local(parent_world: &Transform, world: &Transform, options: ParentOptions) -> Transform {
    let mut offset = world.position - parent_world.position;
    let mut scale = world.scale;
    let mut rotation = world.rotation;

    if options.inherit_rotation {
        offset = rotate(offset, -parent_world.rotation);
        rotation -= parent_world.rotation;
    }
    if options.inherit_scale {
        offset = safe_div(offset, parent_world.scale);
        scale = safe_div(scale, parent_world.scale);
    }

    Transform {
        position: offset,
        rotation,
        scale,
    }
}

fn safe_div(value: Vec2, divisor: Vec2) -> Vec2 {
    let axis = |v: f32, d: f32| if d.abs() <= f32::EPSILON { v } else { v / d };
    Vec2::new(axis(value.x, divisor.x), axis(value.y, divisor.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-4;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < EPS, "expected {b:?}, got {a:?}");
    }

    #[test]
    fn test_rotate_quarter_turn() {
        assert_close(rotate(Vec2::X, FRAC_PI_2), Vec2::Y);
        assert_close(rotate(Vec2::Y, -FRAC_PI_2), Vec2::X);
    }

    #[test]
    fn test_to_world_translation_only() {
        let parent = Transform::from_xy(5.0, 5.0).with_rotation(FRAC_PI_2);
        let local = Transform::from_xy(1.0, 0.0);
        let world = to_world(&parent, &local, ParentOptions::default());
        assert_close(world.position, Vec2::new(6.0, 5.0));
        assert_eq!(world.rotation, 0.0);
    }

    #[test]
    fn test_to_world_inherits_rotation() {
        let parent = Transform::from_xy(5.0, 5.0).with_rotation(FRAC_PI_2);
        let local = Transform::from_xy(1.0, 0.0).with_rotation(0.5);
        let world = to_world(&parent, &local, ParentOptions::rotation());
        assert_close(world.position, Vec2::new(5.0, 6.0));
        assert!((world.rotation - (FRAC_PI_2 + 0.5)).abs() < EPS);
    }

    #[test]
    fn test_to_world_inherits_scale() {
        let parent = Transform::default().with_scale(Vec2::new(2.0, 3.0));
        let local = Transform::from_xy(1.0, 1.0);
        let world = to_world(&parent, &local, ParentOptions::all());
        assert_close(world.position, Vec2::new(2.0, 3.0));
        assert_close(world.scale, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_to_local_inverts_to_world() {
        let parent = Transform::from_xy(-3.0, 7.0)
            .with_rotation(0.8)
            .with_scale(Vec2::new(2.0, 0.5));
        let world = Transform::from_xy(10.0, -4.0)
            .with_rotation(1.3)
            .with_scale(Vec2::new(1.0, 4.0));

        for options in [
            ParentOptions::default(),
            ParentOptions::rotation(),
            ParentOptions::all(),
        ] {
            let local = to_local(&parent, &world, options);
            let back = to_world(&parent, &local, options);
            assert_close(back.position, world.position);
            assert_close(back.scale, world.scale);
            assert!((back.rotation - world.rotation).abs() < EPS);
        }
    }

    #[test]
    fn test_to_local_zero_parent_scale() {
        let parent = Transform::default().with_scale(Vec2::new(0.0, 2.0));
        let world = Transform::from_xy(4.0, 4.0);
        let local = to_local(&parent, &world, ParentOptions::all());
        assert_close(local.position, Vec2::new(4.0, 2.0));
        assert!(local.position.is_finite());
    }
}
