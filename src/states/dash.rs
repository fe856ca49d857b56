//! Special-weapon dash.

use crate::collision::CollisionContact;
use crate::context::SpecialSkillState;
use crate::detection;
use crate::host::{AnimationFlag, AnimationTrigger};
use crate::machine::{StateCx, StateId};
use crate::rotation;

use bevy::prelude::*;

use super::MovementState;

/// Fixed-duration dash along the camera heading.
///
/// Velocity is assigned every physics step rather than accelerated, so the
/// dash covers `speed × time_to_complete_dash` on flat ground.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dashing {
    direction: Vec3,
    speed: f32,
    elapsed: f32,
}

impl Dashing {
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Final dash speed: the scaled speed stat, floored at `min_dash_speed`.
    pub fn dash_speed(movement_speed: f32, speed_modifier: f32, min_dash_speed: f32) -> f32 {
        (movement_speed * speed_modifier).max(min_dash_speed)
    }

    /// Pick the exit once the dash is over.
    fn end(cx: &StateCx) -> StateId {
        if cx.ground_overlap() {
            StateId::LightStopping
        } else {
            StateId::Falling
        }
    }
}

impl MovementState for Dashing {
    fn id(&self) -> StateId {
        StateId::Dashing
    }

    fn enter(&mut self, cx: &mut StateCx) {
        let dash = cx.config.dash().copied().unwrap_or_default();
        self.speed = Self::dash_speed(cx.movement_speed(), dash.speed_modifier, dash.min_dash_speed);

        let facing = rotation::horizontal_direction(cx.camera_forward());
        self.direction = if facing == Vec3::ZERO {
            cx.body_forward()
        } else {
            facing
        };

        cx.ctx.is_dashing = true;
        cx.ctx.special_skill_state = SpecialSkillState::IsDashing;
        cx.reset_velocity();
        self.elapsed = 0.0;
        cx.start_flag(AnimationFlag::SpecialDash);
        rotation::update_target_rotation(cx.ctx, self.direction, None);
    }

    fn exit(&mut self, cx: &mut StateCx) {
        cx.ctx.is_dashing = false;
        cx.ctx.special_skill_state = SpecialSkillState::None;
        cx.stop_flag(AnimationFlag::SpecialDash);
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let config = cx.config;
        let Some(special) = config.special_weapon.as_ref() else {
            return Some(Self::end(cx));
        };
        if self.elapsed >= special.dash.time_to_complete_dash {
            return Some(Self::end(cx));
        }

        cx.set_velocity(self.direction * self.speed);
        detection::float_capsule(
            cx,
            &special.floating_capsule,
            &config.grounded.slope_speed_angles,
        );
        cx.rotate_towards_target();
        self.elapsed += cx.dt;
        None
    }

    fn on_collision(&mut self, cx: &mut StateCx, contact: CollisionContact) -> Option<StateId> {
        let layers = cx.config.dash().map(|dash| dash.collision_layers)?;
        if !contact.layers.intersects(layers) {
            return None;
        }

        cx.fire_trigger(AnimationTrigger::DashEnded);
        cx.notify_dash_ended();
        Some(Self::end(cx))
    }
}
