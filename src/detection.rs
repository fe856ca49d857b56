//! Ground sensing and the floating capsule.
//!
//! The floating capsule keeps the collider center at its resting height above
//! uneven ground with a single-tick velocity correction, and derives the
//! slope speed multiplier from the angle of the ground under the character.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::{FloatingCapsuleConfig, MovementConfig};
use crate::curve::SpeedCurve;
use crate::host::{ForceMode, RayOrigin};
use crate::machine::StateCx;

/// Vertical velocity change that snaps the capsule back to `resting_height`.
///
/// `shortfall × step_reach_force − vertical_velocity`, or zero when the hit is
/// exactly at the resting height. The velocity term cancels whatever vertical
/// motion is left, so the correction does not accumulate across ticks.
///
/// # Example
///
/// ```rust
/// use player_locomotion::detection::floating_lift;
///
/// let lift = floating_lift(1.0, 0.9, 25.0, 0.0);
/// assert!((lift - 2.5).abs() < 1e-4);
/// assert_eq!(floating_lift(1.0, 1.0, 25.0, -3.0), 0.0);
/// ```
pub fn floating_lift(
    resting_height: f32,
    hit_distance: f32,
    step_reach_force: f32,
    vertical_velocity: f32,
) -> f32 {
    let shortfall = resting_height - hit_distance;
    if shortfall == 0.0 {
        return 0.0;
    }
    shortfall * step_reach_force - vertical_velocity
}

/// Run the floating capsule for one physics step.
///
/// Casts down from the collider center. On a hit the slope modifier is
/// updated from `slope_curve`; a modifier of exactly zero is a cliff and gets
/// no lift. Returns the lift that was applied, if any.
pub fn float_capsule(
    cx: &mut StateCx,
    floating: &FloatingCapsuleConfig,
    slope_curve: &SpeedCurve,
) -> Option<f32> {
    let hit = cx.ground_ray(RayOrigin::ColliderCenter, floating.float_ray_distance)?;

    let modifier = slope_curve.evaluate(hit.slope_angle_degrees());
    cx.ctx.movement_on_slope_speed_modifier = modifier;
    if modifier == 0.0 {
        return None;
    }

    let lift = floating_lift(
        cx.config.capsule.center_height,
        hit.distance,
        floating.step_reach_force,
        cx.vertical_velocity(),
    );
    if lift == 0.0 {
        return None;
    }

    cx.add_force(Vec3::new(0.0, lift, 0.0), ForceMode::VelocityChange);
    Some(lift)
}

/// Whether a grounded character has lost its support.
///
/// True only when the ground-check box is empty and the bottom ray finds
/// nothing within `ground_to_fall_ray_distance`.
pub fn should_fall(cx: &StateCx) -> bool {
    if cx.ground_overlap() {
        return false;
    }
    cx.ground_ray(
        RayOrigin::ColliderBottom,
        cx.config.grounded.ground_to_fall_ray_distance,
    )
    .is_none()
}

/// Ground probe results cached by the physics backend each fixed step.
///
/// Rays are cast once at the longest configured length. Queries with a
/// shorter range filter the cached hit by distance.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct GroundSensors {
    /// Hit of the ray cast down from the collider center.
    #[reflect(ignore)]
    pub center: Option<CollisionData>,
    /// Hit of the ray cast down from the collider bottom.
    #[reflect(ignore)]
    pub bottom: Option<CollisionData>,
    /// Whether the ground-check box overlaps ground.
    pub overlap: bool,
}

impl GroundSensors {
    /// Cached hit for `origin` if it lies within `max_distance`.
    pub fn ray(&self, origin: RayOrigin, max_distance: f32) -> Option<CollisionData> {
        let hit = match origin {
            RayOrigin::ColliderCenter => self.center,
            RayOrigin::ColliderBottom => self.bottom,
        }?;
        (hit.distance <= max_distance).then_some(hit)
    }

    /// Clear every cached result (called before each sensing pass).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Ray lengths the backend must cast to serve every state: `(center, bottom)`.
    pub fn cast_lengths(config: &MovementConfig) -> (f32, f32) {
        let mut center = config
            .grounded
            .floating
            .float_ray_distance
            .max(config.airborne.jump.jump_to_ground_ray_distance);
        if let Some(special) = &config.special_weapon {
            center = center.max(special.floating_capsule.float_ray_distance);
        }
        (center, config.grounded.ground_to_fall_ray_distance)
    }
}
