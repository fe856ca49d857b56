//! Sprinting and the sprint-start burst.

use bevy::prelude::*;

use crate::config::{SprintConfig, SprintStartConfig};
use crate::host::AnimationFlag;
use crate::intent::{InputAction, InputEvent};
use crate::machine::{StateCx, StateId};
use crate::rotation;

use super::grounded;
use super::MovementState;

fn sprint_config(cx: &StateCx) -> SprintConfig {
    cx.config.grounded.sprint.unwrap_or_default()
}

fn sprint_start_config(cx: &StateCx) -> SprintStartConfig {
    cx.config.grounded.sprint_start.unwrap_or_default()
}

// ==================== Sprinting ====================

/// Full-speed movement that drains stamina.
///
/// Lasts `sprint_to_run_time` unless a sprint-performed input latches it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sprinting {
    start_time: f64,
    keep_sprinting: bool,
    reset_sprint_on_exit: bool,
}

impl Sprinting {
    /// Whether a sprint-performed input latched the sprint during this activation.
    pub fn is_latched(&self) -> bool {
        self.keep_sprinting
    }
}

impl MovementState for Sprinting {
    fn id(&self) -> StateId {
        StateId::Sprinting
    }

    fn enter(&mut self, cx: &mut StateCx) {
        cx.ctx.movement_speed_modifier = sprint_config(cx).speed_modifier;
        grounded::enter(cx);
        cx.ctx.current_jump_force = cx.config.airborne.jump.strong_force;
        grounded::enter_moving(cx, AnimationFlag::Sprint);

        self.reset_sprint_on_exit = true;
        if !cx.ctx.should_sprint {
            self.keep_sprinting = false;
        }
        self.start_time = cx.now;
    }

    fn exit(&mut self, cx: &mut StateCx) {
        grounded::exit_moving(cx, AnimationFlag::Sprint);
        grounded::exit(cx);

        if self.reset_sprint_on_exit {
            self.keep_sprinting = false;
            cx.ctx.should_sprint = false;
        }
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if !cx.ctx.has_movement_input() {
            return Some(StateId::Idle);
        }

        let sprint = sprint_config(cx);
        cx.spend_stamina(sprint.stamina_drain_per_second * cx.dt);
        if cx.stamina() <= 0.0 {
            return Some(StateId::Running);
        }

        if self.keep_sprinting {
            return None;
        }
        if cx.now < self.start_time + f64::from(sprint.sprint_to_run_time) {
            return None;
        }
        Some(StateId::Running)
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let next = grounded::physics(cx);
        if next == Some(StateId::Falling) {
            self.reset_sprint_on_exit = false;
        }
        next
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        match event {
            InputEvent::SprintPerformed => {
                self.keep_sprinting = true;
                cx.ctx.should_sprint = true;
                None
            }
            InputEvent::JumpPressed => {
                self.reset_sprint_on_exit = false;
                Some(StateId::Jumping)
            }
            _ => grounded::on_moving_input(cx, event),
        }
    }
}

// ==================== Sprint Start ====================

/// Short burst that assigns velocity directly, rate limited by a
/// consecutive-dash window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SprintStarting {
    /// Clock time of the previous start. Survives across activations.
    last_start: Option<f64>,
    consecutive_dashes: u32,
    keep_rotating: bool,
}

impl SprintStarting {
    /// Dashes counted in the current consecutive window.
    pub fn consecutive_dashes(&self) -> u32 {
        self.consecutive_dashes
    }

    fn dash(&self, cx: &mut StateCx) {
        let direction = if cx.ctx.has_movement_input() {
            let input = rotation::input_direction(cx.ctx.movement_input);
            let camera_yaw = cx.camera_yaw();
            let yaw = rotation::update_target_rotation(cx.ctx, input, Some(camera_yaw));
            rotation::direction_from_yaw(yaw)
        } else {
            let facing = if cx.is_first_person() {
                rotation::horizontal_direction(cx.camera_forward())
            } else {
                Vec3::ZERO
            };
            let facing = if facing == Vec3::ZERO {
                cx.body_forward()
            } else {
                facing
            };
            rotation::update_target_rotation(cx.ctx, facing, None);
            facing
        };

        let speed = grounded::movement_speed(cx, false);
        cx.set_velocity(direction * speed);
    }

    fn update_consecutive_dashes(&mut self, cx: &mut StateCx, config: &SprintStartConfig) {
        let consecutive = self
            .last_start
            .is_some_and(|start| {
                cx.now < start + f64::from(config.time_to_be_considered_consecutive)
            });
        if !consecutive {
            self.consecutive_dashes = 0;
        }
        self.consecutive_dashes += 1;

        if self.consecutive_dashes >= config.consecutive_dashes_limit {
            self.consecutive_dashes = 0;
            cx.actions.disable_for(
                InputAction::Dash,
                config.dash_limit_reached_cooldown,
                cx.now,
            );
            debug!(
                cooldown = config.dash_limit_reached_cooldown,
                limit = config.consecutive_dashes_limit,
                "consecutive dash limit reached, dash input disabled"
            );
        }
        self.last_start = Some(cx.now);
    }
}

impl MovementState for SprintStarting {
    fn id(&self) -> StateId {
        StateId::SprintStarting
    }

    fn enter(&mut self, cx: &mut StateCx) {
        let config = sprint_start_config(cx);

        cx.ctx.movement_speed_modifier = config.speed_modifier;
        grounded::enter(cx);
        cx.ctx.current_jump_force = cx.config.airborne.jump.strong_force;
        grounded::enter_moving(cx, AnimationFlag::Dash);
        cx.ctx.time_to_reach_target_rotation = config.rotation.target_rotation_reach_time;

        self.dash(cx);
        self.keep_rotating = cx.ctx.has_movement_input();
        self.update_consecutive_dashes(cx, &config);
        cx.spend_stamina(config.stamina_cost);
    }

    fn exit(&mut self, cx: &mut StateCx) {
        grounded::exit_moving(cx, AnimationFlag::Dash);
        grounded::exit(cx);
        cx.reset_rotation_time();
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let next = grounded::physics(cx);
        if next.is_none() && self.keep_rotating && !cx.ctx.has_movement_input() {
            cx.rotate_towards_target();
        }
        next
    }

    fn on_animation_transition(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if cx.ctx.has_movement_input() {
            cx.to(StateId::Sprinting)
        } else {
            Some(StateId::LightStopping)
        }
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        if let InputEvent::MovementPerformed(_) = event {
            self.keep_rotating = true;
            return None;
        }
        grounded::on_input(cx, event)
    }
}
