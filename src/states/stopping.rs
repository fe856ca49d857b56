//! Grounded transitions that end on an animation marker.

use crate::host::{AnimationFlag, AnimationTrigger, ForceMode};
use crate::intent::InputEvent;
use crate::machine::{StateCx, StateId};

use super::grounded::{self, MIN_HORIZONTAL_SPEED};
use super::MovementState;

/// Decelerates a moving body until the stop animation hands over to `Idle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightStopping;

impl MovementState for LightStopping {
    fn id(&self) -> StateId {
        StateId::LightStopping
    }

    fn enter(&mut self, cx: &mut StateCx) {
        cx.ctx.movement_speed_modifier = 0.0;
        grounded::enter(cx);
        cx.ctx.movement_deceleration_force = cx.config.grounded.stop.light_deceleration_force;
        cx.ctx.current_jump_force = cx.config.airborne.jump.weak_force;
        cx.start_flag(AnimationFlag::Stopping);
    }

    fn exit(&mut self, cx: &mut StateCx) {
        cx.stop_flag(AnimationFlag::Stopping);
        grounded::exit(cx);
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if let Some(next) = grounded::physics(cx) {
            return Some(next);
        }

        cx.rotate_towards_target();

        if cx.is_moving_horizontally(MIN_HORIZONTAL_SPEED) {
            let braking = -cx.horizontal_velocity() * cx.ctx.movement_deceleration_force;
            cx.add_force(braking, ForceMode::Acceleration);
        }
        None
    }

    fn camera_update(&mut self, cx: &mut StateCx) {
        grounded::follow_camera(cx);
    }

    fn on_animation_transition(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        Some(StateId::Idle)
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        match event {
            InputEvent::MovementStarted(_) => Some(grounded::on_move(cx)),
            _ => grounded::on_input(cx, event),
        }
    }
}

/// Absorbs a landing; the landing animation hands over to `Idle`.
///
/// Holding movement input during the landing fires the move-start trigger
/// once so the animator can blend out early.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightLanding {
    move_started: bool,
}

impl MovementState for LightLanding {
    fn id(&self) -> StateId {
        StateId::LightLanding
    }

    fn enter(&mut self, cx: &mut StateCx) {
        cx.ctx.movement_speed_modifier = 0.0;
        grounded::enter(cx);
        cx.ctx.current_jump_force = cx.config.airborne.jump.stationary_force;
        cx.reset_horizontal_velocity();
        cx.start_flag(AnimationFlag::Landing);
        self.move_started = false;
    }

    fn exit(&mut self, cx: &mut StateCx) {
        cx.stop_flag(AnimationFlag::Landing);
        grounded::exit(cx);
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if !self.move_started && cx.ctx.has_movement_input() {
            self.move_started = true;
            cx.fire_trigger(AnimationTrigger::MoveStart);
        }
        None
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if let Some(next) = grounded::physics(cx) {
            return Some(next);
        }
        if cx.is_moving_horizontally(MIN_HORIZONTAL_SPEED) {
            cx.reset_horizontal_velocity();
        }
        None
    }

    fn on_animation_transition(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        Some(StateId::Idle)
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        grounded::on_input(cx, event)
    }
}
