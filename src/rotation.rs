//! Heading math and damped rotation.
//!
//! Yaw is measured in radians around +Y, normalized to `[0, TAU)`. Yaw `0`
//! faces -Z and yaw `θ` faces `(-sin θ, 0, -cos θ)`, which matches
//! `Quat::from_rotation_y(θ) * Vec3::NEG_Z`.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use crate::context::MovementContext;

/// Below this the body is considered to already face its target.
const YAW_EPSILON: f32 = 1e-4;

/// Wrap an angle into `[0, TAU)`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Shortest signed difference from `current` to `target`, in `(-PI, PI]`.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(TAU);
    if delta > PI {
        delta -= TAU;
    }
    delta
}

/// Yaw of a direction on the horizontal plane.
#[inline]
pub fn yaw_of(direction: Vec3) -> f32 {
    wrap_angle(f32::atan2(-direction.x, -direction.z))
}

/// Horizontal unit direction for a yaw.
#[inline]
pub fn direction_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Yaw of a body rotation.
#[inline]
pub fn yaw_of_rotation(rotation: Quat) -> f32 {
    yaw_of(rotation * Vec3::NEG_Z)
}

/// Project onto the horizontal plane and normalize. Zero stays zero.
#[inline]
pub fn horizontal_direction(direction: Vec3) -> Vec3 {
    Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero()
}

/// Local movement direction for an analog stick value: right is +X, forward is -Z.
#[inline]
pub fn input_direction(input: Vec2) -> Vec3 {
    Vec3::new(input.x, 0.0, -input.y)
}

/// Critically damped spring toward `target`.
///
/// `velocity` is the caller-owned spring state and is updated in place. The
/// result never overshoots the target.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Clamp overshoot.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = if dt > 0.0 { (output - target) / dt } else { 0.0 };
    }
    output
}

/// [`smooth_damp`] along the shortest arc between two angles.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

/// Point the rotation target along `direction`, optionally relative to the camera yaw.
///
/// A changed target restarts the damping clock. Returns the target yaw.
pub fn update_target_rotation(
    ctx: &mut MovementContext,
    direction: Vec3,
    camera_yaw: Option<f32>,
) -> f32 {
    let mut yaw = yaw_of(direction);
    if let Some(camera_yaw) = camera_yaw {
        yaw = wrap_angle(yaw + camera_yaw);
    }

    if delta_angle(ctx.current_target_rotation.y, yaw).abs() > YAW_EPSILON {
        ctx.current_target_rotation.y = yaw;
        ctx.damped_rotation_elapsed.y = 0.0;
    }
    yaw
}

/// Advance the damped rotation one step.
///
/// Returns the new yaw, or `None` when the body already faces the target.
pub fn rotate_towards_target(ctx: &mut MovementContext, current_yaw: f32, dt: f32) -> Option<f32> {
    let target = ctx.current_target_rotation.y;
    if delta_angle(current_yaw, target).abs() <= YAW_EPSILON {
        return None;
    }

    let remaining = ctx.time_to_reach_target_rotation.y - ctx.damped_rotation_elapsed.y;
    let smoothed = smooth_damp_angle(
        current_yaw,
        target,
        &mut ctx.damped_rotation_velocity.y,
        remaining,
        dt,
    );
    ctx.damped_rotation_elapsed.y += dt;
    Some(wrap_angle(smoothed))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn yaw_and_direction_agree() {
        assert!(approx(yaw_of(Vec3::NEG_Z), 0.0));
        assert!(approx(yaw_of(Vec3::NEG_X), FRAC_PI_2));
        assert!(approx(yaw_of(Vec3::Z), PI));
        assert!(approx(yaw_of(Vec3::X), 3.0 * FRAC_PI_2));

        for yaw in [0.0, 0.5, 2.0, 4.0, 6.0] {
            assert!(approx(yaw_of(direction_from_yaw(yaw)), yaw));
            let from_quat = Quat::from_rotation_y(yaw) * Vec3::NEG_Z;
            assert!(from_quat.distance(direction_from_yaw(yaw)) < 1e-4);
        }
    }

    #[test]
    fn forward_input_faces_negative_z() {
        assert_eq!(input_direction(Vec2::Y), Vec3::NEG_Z);
        assert_eq!(input_direction(Vec2::X), Vec3::X);
    }

    #[test]
    fn horizontal_direction_drops_pitch() {
        let looking_down = Vec3::new(0.0, -1.0, -1.0);
        assert!(horizontal_direction(looking_down).distance(Vec3::NEG_Z) < 1e-5);
        assert_eq!(horizontal_direction(Vec3::NEG_Y), Vec3::ZERO);
    }

    #[test]
    fn delta_angle_takes_shortest_arc() {
        assert!(approx(delta_angle(0.1, TAU - 0.1), -0.2));
        assert!(approx(delta_angle(TAU - 0.1, 0.1), 0.2));
        assert!(approx(delta_angle(0.0, PI), PI));
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let mut velocity = 0.0;
        let mut value = 0.0;
        for _ in 0..120 {
            let next = smooth_damp(value, 1.0, &mut velocity, 0.2, 1.0 / 60.0);
            assert!(next <= 1.0 + 1e-6);
            assert!(next >= value);
            value = next;
        }
        assert!(approx(value, 1.0));
    }

    #[test]
    fn smooth_damp_angle_wraps() {
        let mut velocity = 0.0;
        let next = smooth_damp_angle(TAU - 0.1, 0.1, &mut velocity, 0.1, 1.0 / 60.0);
        // Moves forward across the wrap point instead of back around the circle.
        assert!(next > TAU - 0.1);
    }

    #[test]
    fn new_target_resets_elapsed() {
        let mut ctx = MovementContext::default();
        ctx.damped_rotation_elapsed.y = 0.5;

        let yaw = update_target_rotation(&mut ctx, Vec3::NEG_X, None);
        assert!(approx(yaw, FRAC_PI_2));
        assert_eq!(ctx.damped_rotation_elapsed.y, 0.0);

        ctx.damped_rotation_elapsed.y = 0.3;
        update_target_rotation(&mut ctx, Vec3::NEG_X, None);
        assert_eq!(ctx.damped_rotation_elapsed.y, 0.3);
    }

    #[test]
    fn camera_yaw_offsets_target() {
        let mut ctx = MovementContext::default();
        let yaw = update_target_rotation(&mut ctx, Vec3::NEG_Z, Some(FRAC_PI_2));
        assert!(approx(yaw, FRAC_PI_2));
    }

    #[test]
    fn rotation_reaches_target_and_stops() {
        let mut ctx = MovementContext::new(Vec3::new(0.0, 0.14, 0.0));
        update_target_rotation(&mut ctx, Vec3::NEG_X, None);

        let mut yaw = 0.0;
        for _ in 0..120 {
            if let Some(next) = rotate_towards_target(&mut ctx, yaw, 1.0 / 60.0) {
                yaw = next;
            }
        }
        assert!(approx(yaw, FRAC_PI_2));
        assert_eq!(rotate_towards_target(&mut ctx, yaw, 1.0 / 60.0), None);
    }
}
