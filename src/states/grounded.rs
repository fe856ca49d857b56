//! Grounded family: shared helpers plus `Idle`, `Walking` and `Running`.

use crate::detection;
use crate::host::{AnimationFlag, ForceMode};
use crate::intent::InputEvent;
use crate::machine::{StateCx, StateId};
use crate::rotation;

use super::MovementState;

/// Horizontal speed below which a body counts as standing still.
pub(crate) const MIN_HORIZONTAL_SPEED: f32 = 0.1;

// ==================== Shared Behavior ====================

/// Entry effects common to every grounded state.
pub fn enter(cx: &mut StateCx) {
    cx.start_flag(AnimationFlag::Grounded);
    // A sprint only carries over while the stick is still held.
    if cx.ctx.should_sprint && !cx.ctx.has_movement_input() {
        cx.ctx.should_sprint = false;
    }
    cx.ctx.can_jump_on_air = cx.config.airborne.jump.allow_air_jump;
}

pub fn exit(cx: &mut StateCx) {
    cx.stop_flag(AnimationFlag::Grounded);
}

/// Move, float, then check for lost support.
pub fn physics(cx: &mut StateCx) -> Option<StateId> {
    move_with_input(cx);
    let config = cx.config;
    detection::float_capsule(
        cx,
        &config.grounded.floating,
        &config.grounded.slope_speed_angles,
    );
    detection::should_fall(cx).then_some(StateId::Falling)
}

/// Drive the body toward the camera-relative input heading.
///
/// Target speed is `speed stat × speed modifier × slope modifier`, applied as
/// an instant velocity change against the current horizontal velocity.
pub fn move_with_input(cx: &mut StateCx) {
    if !cx.ctx.has_movement_input() || cx.ctx.movement_speed_modifier == 0.0 {
        return;
    }

    let direction = rotation::input_direction(cx.ctx.movement_input);
    let yaw = cx.rotate(direction);
    let heading = rotation::direction_from_yaw(yaw);

    let speed = movement_speed(cx, true);
    let horizontal = cx.horizontal_velocity();
    cx.add_force(heading * speed - horizontal, ForceMode::VelocityChange);
}

/// Speed stat scaled by the current modifiers.
pub fn movement_speed(cx: &StateCx, on_slope: bool) -> f32 {
    let slope = if on_slope {
        cx.ctx.movement_on_slope_speed_modifier
    } else {
        1.0
    };
    cx.movement_speed() * cx.ctx.movement_speed_modifier * slope
}

/// Input handling shared by the grounded family.
pub fn on_input(cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
    match event {
        InputEvent::JumpPressed => Some(StateId::Jumping),
        InputEvent::DashPressed => cx.to(StateId::SprintStarting),
        InputEvent::SpecialDashPressed => cx.to(StateId::Dashing),
        _ => None,
    }
}

/// Pick the moving state that matches the current intent.
pub fn on_move(cx: &StateCx) -> StateId {
    if cx.ctx.should_sprint && cx.is_registered(StateId::Sprinting) {
        StateId::Sprinting
    } else if cx.ctx.should_walk {
        StateId::Walking
    } else {
        StateId::Running
    }
}

/// Input handling for states that are actively moving.
pub fn on_moving_input(cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
    match event {
        InputEvent::MovementCanceled => Some(StateId::LightStopping),
        _ => on_input(cx, event),
    }
}

/// Zero velocity while the body still slides.
pub fn stick_to_ground(cx: &mut StateCx) {
    if cx.is_moving_horizontally(MIN_HORIZONTAL_SPEED) {
        cx.reset_velocity();
    }
}

/// First-person: turn the body with the camera while stationary.
pub fn follow_camera(cx: &mut StateCx) {
    if !cx.is_first_person() {
        return;
    }
    let forward = cx.camera_forward();
    rotation::update_target_rotation(cx.ctx, forward, None);
    cx.rotate_towards_target();
}

pub(super) fn enter_moving(cx: &mut StateCx, flag: AnimationFlag) {
    cx.start_flag(AnimationFlag::Moving);
    cx.start_flag(flag);
}

pub(super) fn exit_moving(cx: &mut StateCx, flag: AnimationFlag) {
    cx.stop_flag(AnimationFlag::Moving);
    cx.stop_flag(flag);
}

// ==================== Idle ====================

#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl MovementState for Idle {
    fn id(&self) -> StateId {
        StateId::Idle
    }

    fn enter(&mut self, cx: &mut StateCx) {
        cx.ctx.movement_speed_modifier = 0.0;
        enter(cx);
        cx.ctx.current_jump_force = cx.config.airborne.jump.stationary_force;
        cx.reset_velocity();
        cx.start_flag(AnimationFlag::Idle);
    }

    fn exit(&mut self, cx: &mut StateCx) {
        cx.stop_flag(AnimationFlag::Idle);
        exit(cx);
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        cx.ctx.has_movement_input().then(|| on_move(cx))
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let next = physics(cx);
        if next.is_none() {
            stick_to_ground(cx);
        }
        next
    }

    fn camera_update(&mut self, cx: &mut StateCx) {
        follow_camera(cx);
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        on_input(cx, event)
    }
}

// ==================== Walking ====================

#[derive(Debug, Clone, Copy, Default)]
pub struct Walking;

impl MovementState for Walking {
    fn id(&self) -> StateId {
        StateId::Walking
    }

    fn enter(&mut self, cx: &mut StateCx) {
        cx.ctx.movement_speed_modifier = cx.config.grounded.walk.speed_modifier;
        enter(cx);
        cx.ctx.current_jump_force = cx.config.airborne.jump.weak_force;
        enter_moving(cx, AnimationFlag::Walk);
    }

    fn exit(&mut self, cx: &mut StateCx) {
        exit_moving(cx, AnimationFlag::Walk);
        exit(cx);
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        physics(cx)
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        match event {
            InputEvent::WalkToggleStarted => Some(StateId::Running),
            _ => on_moving_input(cx, event),
        }
    }
}

// ==================== Running ====================

#[derive(Debug, Clone, Copy, Default)]
pub struct Running {
    start_time: f64,
}

impl MovementState for Running {
    fn id(&self) -> StateId {
        StateId::Running
    }

    fn enter(&mut self, cx: &mut StateCx) {
        cx.ctx.movement_speed_modifier = cx.config.grounded.run.speed_modifier;
        enter(cx);
        cx.ctx.current_jump_force = cx.config.airborne.jump.medium_force;
        enter_moving(cx, AnimationFlag::Run);
        self.start_time = cx.now;
    }

    fn exit(&mut self, cx: &mut StateCx) {
        exit_moving(cx, AnimationFlag::Run);
        exit(cx);
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        if !cx.ctx.should_walk {
            return None;
        }
        if cx.now < self.start_time + f64::from(cx.config.grounded.run.run_to_walk_time) {
            return None;
        }
        if cx.ctx.has_movement_input() {
            Some(StateId::Walking)
        } else {
            Some(StateId::Idle)
        }
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        physics(cx)
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        match event {
            InputEvent::WalkToggleStarted => Some(StateId::Walking),
            _ => on_moving_input(cx, event),
        }
    }
}
