//! Airborne family: `Jumping` and `Falling`.

use bevy::prelude::*;

use crate::host::{AnimationFlag, AnimationTrigger, ForceMode, RayOrigin};
use crate::intent::InputEvent;
use crate::machine::{StateCx, StateId};
use crate::rotation;

use super::MovementState;

/// Vertical speed below which a body counts as neither rising nor falling.
const MIN_VERTICAL_SPEED: f32 = 0.1;

fn enter(cx: &mut StateCx) {
    cx.start_flag(AnimationFlag::Airborne);
}

fn exit(cx: &mut StateCx) {
    cx.stop_flag(AnimationFlag::Airborne);
}

// ==================== Jumping ====================

/// One directional impulse, then a damped rise until the apex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jumping {
    can_start_falling: bool,
    keep_rotating: bool,
}

impl Jumping {
    /// Impulse for the jump, shaped by facing and the slope underfoot.
    fn jump_force(&self, cx: &mut StateCx) -> Vec3 {
        let config = cx.config;
        let jump = &config.airborne.jump;
        let mut force = cx.ctx.current_jump_force;

        let direction = if cx.ctx.has_movement_input() {
            let input = rotation::input_direction(cx.ctx.movement_input);
            let camera_yaw = cx.camera_yaw();
            let yaw = rotation::update_target_rotation(cx.ctx, input, Some(camera_yaw));
            rotation::direction_from_yaw(yaw)
        } else {
            cx.body_forward()
        };
        force.x *= direction.x;
        force.z *= direction.z;

        if let Some(hit) = cx.ground_ray(RayOrigin::ColliderCenter, jump.jump_to_ground_ray_distance)
        {
            let angle = hit.slope_angle_degrees();
            if cx.is_moving_up(MIN_VERTICAL_SPEED) {
                let modifier = jump.jump_force_modifier_on_slope_upwards.evaluate(angle);
                force.x *= modifier;
                force.z *= modifier;
            } else if cx.is_moving_down(MIN_VERTICAL_SPEED) {
                force.y *= jump.jump_force_modifier_on_slope_downwards.evaluate(angle);
            }
        }
        force
    }
}

impl MovementState for Jumping {
    fn id(&self) -> StateId {
        StateId::Jumping
    }

    fn enter(&mut self, cx: &mut StateCx) {
        enter(cx);
        let config = cx.config;
        let jump = &config.airborne.jump;
        cx.ctx.movement_speed_modifier = 0.0;
        cx.ctx.movement_deceleration_force = jump.deceleration_force;
        cx.ctx.time_to_reach_target_rotation = jump.rotation.target_rotation_reach_time;
        self.keep_rotating = cx.ctx.has_movement_input();
        self.can_start_falling = false;
        cx.start_flag(AnimationFlag::Jump);

        let force = self.jump_force(cx);
        cx.reset_velocity();
        cx.add_force(force, ForceMode::VelocityChange);
    }

    fn exit(&mut self, cx: &mut StateCx) {
        cx.stop_flag(AnimationFlag::Jump);
        exit(cx);
        cx.reset_rotation_time();
        self.can_start_falling = false;
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let vy = cx.vertical_velocity();
        if !self.can_start_falling && vy > 0.0 {
            self.can_start_falling = true;
        }
        (self.can_start_falling && vy <= 0.0).then_some(StateId::Falling)
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if self.keep_rotating {
            cx.rotate_towards_target();
        }

        if cx.is_moving_up(MIN_VERTICAL_SPEED) {
            let rise = Vec3::new(0.0, cx.vertical_velocity(), 0.0);
            let braking = -rise * cx.ctx.movement_deceleration_force;
            cx.add_force(braking, ForceMode::Acceleration);
        }

        let descending = cx.vertical_velocity() <= 0.0;
        (self.can_start_falling && descending && cx.ground_overlap())
            .then_some(StateId::LightLanding)
    }
}

// ==================== Falling ====================

/// Free fall with a terminal speed, tracking the distance fallen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Falling {
    start_height: f32,
    fallen: f32,
}

impl Falling {
    /// Distance fallen since this activation began.
    pub fn fallen_distance(&self) -> f32 {
        self.fallen
    }
}

impl MovementState for Falling {
    fn id(&self) -> StateId {
        StateId::Falling
    }

    fn enter(&mut self, cx: &mut StateCx) {
        enter(cx);
        cx.ctx.movement_speed_modifier = 0.0;
        cx.start_flag(AnimationFlag::Fall);

        self.start_height = cx.position().y;
        self.fallen = 0.0;
        cx.ctx.is_hard_falling = false;
        cx.reset_vertical_velocity();
    }

    fn exit(&mut self, cx: &mut StateCx) {
        cx.stop_flag(AnimationFlag::Fall);
        exit(cx);
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let fall = cx.config.airborne.fall;

        let vy = cx.vertical_velocity();
        if vy < -fall.fall_speed_limit {
            let correction = -fall.fall_speed_limit - vy;
            cx.add_force(Vec3::new(0.0, correction, 0.0), ForceMode::VelocityChange);
        }

        self.fallen = self.start_height - cx.position().y;
        let threshold = fall.minimum_distance_to_be_considered_hard_fall;
        if !cx.ctx.is_hard_falling && self.fallen >= threshold {
            cx.ctx.is_hard_falling = true;
            debug!(fallen = self.fallen, threshold, "hard fall");
        }

        if !cx.ground_overlap() {
            return None;
        }

        if cx.ctx.is_hard_falling {
            let damage = (self.fallen - threshold).max(0.0) * fall.fall_damage_modifier;
            cx.apply_fall_damage(damage);
            cx.fire_trigger(AnimationTrigger::HardLand);
        }
        Some(StateId::LightLanding)
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        if event == InputEvent::JumpPressed && cx.ctx.can_jump_on_air {
            cx.ctx.can_jump_on_air = false;
            return Some(StateId::Jumping);
        }
        None
    }
}
