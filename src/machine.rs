//! The locomotion state machine.
//!
//! One [`LocomotionMachine`] drives one character. It owns the movement
//! context, an arena holding every registered state (built once, reused
//! across activations) and the input gating table. Each fixed tick runs an
//! ordered pipeline:
//!
//! 1. advance the machine clock,
//! 2. drain queued events into the current state,
//! 3. `update`,
//! 4. `physics_update`,
//! 5. `camera_update`.
//!
//! A hook that requests a transition has it applied (exit, assign, enter)
//! before the next hook runs, so no state ever observes a half-initialized
//! successor.

use std::sync::Arc;

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionContact, CollisionData};
use crate::config::{LocomotionAbilities, MovementConfig};
use crate::context::MovementContext;
use crate::error::LocomotionError;
use crate::host::{
    AnimationFlag, AnimationMarker, AnimationTrigger, CharacterHost, ForceMode, RayOrigin, Role,
};
use crate::intent::{InputActions, InputEvent, LocomotionEvent};
use crate::rotation;
use crate::states::{DebuffKind, LocomotionState, MovementState};

/// Identifier of every state a character can be in.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum StateId {
    Idle,
    Walking,
    Running,
    Sprinting,
    SprintStarting,
    LightStopping,
    LightLanding,
    Jumping,
    Falling,
    Stunned,
    Frozen,
    Shocked,
    Dashing,
}

impl StateId {
    pub const COUNT: usize = 13;

    pub const ALL: [StateId; Self::COUNT] = [
        StateId::Idle,
        StateId::Walking,
        StateId::Running,
        StateId::Sprinting,
        StateId::SprintStarting,
        StateId::LightStopping,
        StateId::LightLanding,
        StateId::Jumping,
        StateId::Falling,
        StateId::Stunned,
        StateId::Frozen,
        StateId::Shocked,
        StateId::Dashing,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// States that keep the character on the ground.
    pub fn is_grounded(self) -> bool {
        matches!(
            self,
            StateId::Idle
                | StateId::Walking
                | StateId::Running
                | StateId::Sprinting
                | StateId::SprintStarting
                | StateId::LightStopping
                | StateId::LightLanding
        )
    }

    pub fn is_airborne(self) -> bool {
        matches!(self, StateId::Jumping | StateId::Falling)
    }

    pub fn is_debuff(self) -> bool {
        matches!(self, StateId::Stunned | StateId::Frozen | StateId::Shocked)
    }

    /// Whether characters with `abilities` register this state.
    pub fn is_available(self, abilities: &LocomotionAbilities) -> bool {
        match self {
            StateId::Sprinting | StateId::SprintStarting => abilities.can_sprint,
            StateId::Dashing => abilities.can_use_special_weapon,
            _ => true,
        }
    }
}

/// Everything a state hook may touch during one call.
///
/// Physics writes, stamina writes, fall damage and the dash notifier are
/// silently dropped unless the role holds authority. Animation and camera
/// reads always go through.
pub struct StateCx<'a> {
    pub ctx: &'a mut MovementContext,
    pub config: &'a MovementConfig,
    pub actions: &'a mut InputActions,
    host: &'a mut (dyn CharacterHost + 'a),
    role: Role,
    registered: [bool; StateId::COUNT],
    /// Machine clock in seconds.
    pub now: f64,
    /// Length of the current step in seconds.
    pub dt: f32,
}

impl<'a> StateCx<'a> {
    /// Build a context for a single hook call.
    ///
    /// The machine does this internally. It is public so states can be
    /// exercised in isolation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: &'a mut MovementContext,
        config: &'a MovementConfig,
        actions: &'a mut InputActions,
        host: &'a mut dyn CharacterHost,
        role: Role,
        registered: [bool; StateId::COUNT],
        now: f64,
        dt: f32,
    ) -> Self {
        Self {
            ctx,
            config,
            actions,
            host,
            role,
            registered,
            now,
            dt,
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn is_authority(&self) -> bool {
        self.role.is_authority
    }

    /// Whether `id` can be transitioned to for this character.
    #[inline]
    pub fn is_registered(&self, id: StateId) -> bool {
        self.registered[id.index()]
    }

    /// `Some(id)` when `id` is registered, for use as a transition request.
    #[inline]
    pub fn to(&self, id: StateId) -> Option<StateId> {
        self.is_registered(id).then_some(id)
    }

    // === Rigid Body ===

    pub fn velocity(&self) -> Vec3 {
        self.host.velocity()
    }

    pub fn horizontal_velocity(&self) -> Vec3 {
        let velocity = self.host.velocity();
        Vec3::new(velocity.x, 0.0, velocity.z)
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.host.velocity().y
    }

    pub fn is_moving_horizontally(&self, min: f32) -> bool {
        self.horizontal_velocity().xz().length() > min
    }

    pub fn is_moving_up(&self, min: f32) -> bool {
        self.vertical_velocity() > min
    }

    pub fn is_moving_down(&self, min: f32) -> bool {
        self.vertical_velocity() < -min
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        if self.role.is_authority {
            self.host.set_velocity(velocity);
        }
    }

    pub fn reset_velocity(&mut self) {
        self.set_velocity(Vec3::ZERO);
    }

    pub fn reset_horizontal_velocity(&mut self) {
        let vy = self.vertical_velocity();
        self.set_velocity(Vec3::new(0.0, vy, 0.0));
    }

    pub fn reset_vertical_velocity(&mut self) {
        let horizontal = self.horizontal_velocity();
        self.set_velocity(horizontal);
    }

    pub fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        if self.role.is_authority {
            self.host.add_force(force, mode);
        }
    }

    pub fn position(&self) -> Vec3 {
        self.host.position()
    }

    pub fn body_forward(&self) -> Vec3 {
        self.host.forward()
    }

    pub fn body_yaw(&self) -> f32 {
        rotation::yaw_of_rotation(self.host.rotation())
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        if self.role.is_authority {
            self.host.set_rotation(Quat::from_rotation_y(yaw));
        }
    }

    // === Ground ===

    pub fn ground_ray(&self, origin: RayOrigin, max_distance: f32) -> Option<CollisionData> {
        self.host.ground_ray(origin, max_distance)
    }

    pub fn ground_overlap(&self) -> bool {
        self.host.ground_overlap()
    }

    // === Camera ===

    pub fn is_first_person(&self) -> bool {
        self.host.is_first_person()
    }

    pub fn camera_forward(&self) -> Vec3 {
        self.host.camera_forward()
    }

    pub fn camera_yaw(&self) -> f32 {
        rotation::yaw_of(self.camera_forward())
    }

    // === Animation ===

    pub fn start_flag(&mut self, flag: AnimationFlag) {
        self.host.start_flag(flag);
    }

    pub fn stop_flag(&mut self, flag: AnimationFlag) {
        self.host.stop_flag(flag);
    }

    pub fn fire_trigger(&mut self, trigger: AnimationTrigger) {
        self.host.fire_trigger(trigger);
    }

    // === Stats ===

    pub fn movement_speed(&self) -> f32 {
        self.host.movement_speed()
    }

    pub fn stamina(&self) -> f32 {
        self.host.stamina()
    }

    /// Remove stamina, never going below zero.
    pub fn spend_stamina(&mut self, amount: f32) {
        if self.role.is_authority {
            let stamina = (self.host.stamina() - amount).max(0.0);
            self.host.set_stamina(stamina);
        }
    }

    pub fn apply_fall_damage(&mut self, damage: f32) {
        if self.role.is_authority {
            self.host.apply_fall_damage(damage);
        }
    }

    pub fn notify_dash_ended(&mut self) {
        if self.role.is_authority {
            self.host.notify_dash_ended();
        }
    }

    // === Rotation ===

    /// Point the target along `direction` relative to the camera and step toward it.
    ///
    /// Returns the target yaw.
    pub fn rotate(&mut self, direction: Vec3) -> f32 {
        let camera_yaw = self.camera_yaw();
        let yaw = rotation::update_target_rotation(self.ctx, direction, Some(camera_yaw));
        self.rotate_towards_target();
        yaw
    }

    /// Step the body toward the current target yaw.
    pub fn rotate_towards_target(&mut self) {
        let current = self.body_yaw();
        if let Some(yaw) = rotation::rotate_towards_target(self.ctx, current, self.dt) {
            self.set_yaw(yaw);
        }
    }

    /// Restore the base rotation reach time.
    pub fn reset_rotation_time(&mut self) {
        self.ctx.time_to_reach_target_rotation =
            self.config.grounded.base_rotation.target_rotation_reach_time;
    }
}

/// Hierarchical locomotion state machine for one character.
///
/// # Example
///
/// ```rust
/// use player_locomotion::prelude::*;
///
/// let machine = LocomotionMachine::new(MovementConfig::player(), LocomotionAbilities::default())
///     .expect("player preset is valid");
/// assert_eq!(machine.current(), None);
/// assert!(machine.is_registered(StateId::Sprinting));
/// assert!(!machine.is_registered(StateId::Dashing));
/// ```
#[derive(Component, Debug)]
pub struct LocomotionMachine {
    config: Arc<MovementConfig>,
    context: MovementContext,
    states: [Option<LocomotionState>; StateId::COUNT],
    registered: [bool; StateId::COUNT],
    current: Option<StateId>,
    actions: InputActions,
    clock: f64,
    enters: [u32; StateId::COUNT],
    exits: [u32; StateId::COUNT],
}

/// Outcome of one arena dispatch.
type Transition = Option<StateId>;

impl LocomotionMachine {
    /// Validate `config` and build every state the abilities allow.
    pub fn new(
        config: impl Into<Arc<MovementConfig>>,
        abilities: LocomotionAbilities,
    ) -> Result<Self, LocomotionError> {
        let config = config.into();
        config.validate(&abilities)?;

        let mut states: [Option<LocomotionState>; StateId::COUNT] = Default::default();
        let mut registered = [false; StateId::COUNT];
        for id in StateId::ALL {
            if id.is_available(&abilities) {
                states[id.index()] = Some(LocomotionState::new(id));
                registered[id.index()] = true;
            }
        }

        let context =
            MovementContext::new(config.grounded.base_rotation.target_rotation_reach_time);

        Ok(Self {
            config,
            context,
            states,
            registered,
            current: None,
            actions: InputActions::default(),
            clock: 0.0,
            enters: [0; StateId::COUNT],
            exits: [0; StateId::COUNT],
        })
    }

    /// Machine with no states, parked in a component slot while the real one
    /// is ticked.
    pub(crate) fn vacant() -> Self {
        Self {
            config: Arc::new(MovementConfig::player()),
            context: MovementContext::default(),
            states: Default::default(),
            registered: [false; StateId::COUNT],
            current: None,
            actions: InputActions::default(),
            clock: 0.0,
            enters: [0; StateId::COUNT],
            exits: [0; StateId::COUNT],
        }
    }

    // === Accessors ===

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn context(&self) -> &MovementContext {
        &self.context
    }

    /// Mutable access to the shared context, for external effects such as a grapple pull.
    pub fn context_mut(&mut self) -> &mut MovementContext {
        &mut self.context
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn actions(&self) -> &InputActions {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut InputActions {
        &mut self.actions
    }

    /// Seconds accumulated by [`tick`](Self::tick).
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn is_registered(&self, id: StateId) -> bool {
        self.registered[id.index()]
    }

    /// `(enters, exits)` recorded for `id`.
    pub fn activations(&self, id: StateId) -> (u32, u32) {
        (self.enters[id.index()], self.exits[id.index()])
    }

    /// Borrow a registered state, for inspection.
    pub fn state(&self, id: StateId) -> Option<&LocomotionState> {
        self.states[id.index()].as_ref()
    }

    // === Transitions ===

    /// Enter `Idle` if no state is current yet.
    pub fn start(&mut self, host: &mut dyn CharacterHost, role: Role) -> Result<(), LocomotionError> {
        if self.current.is_none() {
            self.change_state(host, role, StateId::Idle)?;
        }
        Ok(())
    }

    /// Exit the current state (if any), then enter `id`.
    ///
    /// Re-entering the current state runs its exit and enter hooks again.
    pub fn change_state(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        id: StateId,
    ) -> Result<(), LocomotionError> {
        if self.states[id.index()].is_none() {
            return Err(LocomotionError::UnknownState(id));
        }

        let previous = self.current.take();
        if let Some(previous) = previous {
            self.with_state(previous, host, role, 0.0, |state, cx| state.exit(cx));
            self.exits[previous.index()] += 1;
        }

        self.current = Some(id);
        self.with_state(id, host, role, 0.0, |state, cx| state.enter(cx));
        self.enters[id.index()] += 1;

        debug!(from = ?previous, to = ?id, "locomotion state changed");
        Ok(())
    }

    /// Force a debuff onto the character, interrupting whatever it was doing.
    pub fn apply_debuff(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        kind: DebuffKind,
    ) -> Result<(), LocomotionError> {
        self.change_state(host, role, kind.state_id())
    }

    // === Dispatch ===

    /// Run the whole per-tick pipeline.
    pub fn tick(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        events: impl IntoIterator<Item = LocomotionEvent>,
        dt: f32,
    ) -> Result<(), LocomotionError> {
        self.clock += f64::from(dt);

        for event in events {
            self.handle_event(host, role, event, dt)?;
        }
        self.update(host, role, dt)?;
        self.physics_update(host, role, dt)?;
        self.camera_update(host, role, dt);
        Ok(())
    }

    /// Route one event to the current state.
    ///
    /// Input for a disabled action is dropped. Movement events update the
    /// context input and the walk toggle flips `should_walk` before the state
    /// sees them.
    pub fn handle_event(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        event: LocomotionEvent,
        dt: f32,
    ) -> Result<(), LocomotionError> {
        let transition = match event {
            LocomotionEvent::Input(input) => {
                let action = input.action();
                if !self.actions.is_enabled(action, self.clock) {
                    trace!(
                        ?action,
                        remaining = self.actions.remaining(action, self.clock),
                        "input dropped, action disabled"
                    );
                    return Ok(());
                }
                self.preprocess_input(input);
                self.dispatch(host, role, dt, |state, cx| state.on_input(cx, input))
            }
            LocomotionEvent::Animation(marker) => self.dispatch(host, role, dt, |state, cx| match marker {
                AnimationMarker::Enter => state.on_animation_enter(cx),
                AnimationMarker::Exit => state.on_animation_exit(cx),
                AnimationMarker::Transition => state.on_animation_transition(cx),
            }),
            LocomotionEvent::Collision(contact) => {
                self.dispatch(host, role, dt, |state, cx| state.on_collision(cx, contact))
            }
        };
        self.apply(host, role, transition)
    }

    /// Variable-rate logic: timers and input-driven transitions.
    pub fn update(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        dt: f32,
    ) -> Result<(), LocomotionError> {
        let transition = self.dispatch(host, role, dt, |state, cx| state.update(cx));
        self.apply(host, role, transition)
    }

    /// Fixed-rate logic: forces, ground sensing and rotation.
    pub fn physics_update(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        dt: f32,
    ) -> Result<(), LocomotionError> {
        let transition = self.dispatch(host, role, dt, |state, cx| state.physics_update(cx));
        self.apply(host, role, transition)
    }

    /// Late camera-facing adjustments.
    pub fn camera_update(&mut self, host: &mut dyn CharacterHost, role: Role, dt: f32) {
        self.dispatch(host, role, dt, |state, cx| state.camera_update(cx));
    }

    /// Deliver a physical contact outside of [`tick`](Self::tick).
    pub fn on_collision(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        contact: CollisionContact,
    ) -> Result<(), LocomotionError> {
        self.handle_event(host, role, LocomotionEvent::Collision(contact), 0.0)
    }

    fn preprocess_input(&mut self, input: InputEvent) {
        if let Some(movement) = input.movement() {
            self.context.movement_input = movement;
        }
        if input == InputEvent::WalkToggleStarted {
            self.context.should_walk = !self.context.should_walk;
        }
    }

    fn apply(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        transition: Transition,
    ) -> Result<(), LocomotionError> {
        match transition {
            Some(next) => self.change_state(host, role, next),
            None => Ok(()),
        }
    }

    /// Run `f` on the current state. No-op before the first transition.
    fn dispatch<R: Default>(
        &mut self,
        host: &mut dyn CharacterHost,
        role: Role,
        dt: f32,
        f: impl FnOnce(&mut LocomotionState, &mut StateCx) -> R,
    ) -> R {
        match self.current {
            Some(id) => self.with_state(id, host, role, dt, f),
            None => R::default(),
        }
    }

    fn with_state<R: Default>(
        &mut self,
        id: StateId,
        host: &mut dyn CharacterHost,
        role: Role,
        dt: f32,
        f: impl FnOnce(&mut LocomotionState, &mut StateCx) -> R,
    ) -> R {
        let Some(state) = self.states[id.index()].as_mut() else {
            return R::default();
        };
        let mut cx = StateCx::new(
            &mut self.context,
            &self.config,
            &mut self.actions,
            host,
            role,
            self.registered,
            self.clock,
            dt,
        );
        f(state, &mut cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ids_index_their_slot() {
        for (i, id) in StateId::ALL.into_iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn families_are_disjoint() {
        for id in StateId::ALL {
            let families = [id.is_grounded(), id.is_airborne(), id.is_debuff()]
                .into_iter()
                .filter(|f| *f)
                .count();
            let expected = if id == StateId::Dashing { 0 } else { 1 };
            assert_eq!(families, expected, "{id:?}");
        }
    }

    #[test]
    fn registration_follows_abilities() {
        let machine =
            LocomotionMachine::new(MovementConfig::player(), LocomotionAbilities::none()).unwrap();
        assert!(machine.is_registered(StateId::Idle));
        assert!(!machine.is_registered(StateId::Sprinting));
        assert!(!machine.is_registered(StateId::SprintStarting));
        assert!(!machine.is_registered(StateId::Dashing));
        assert!(machine.state(StateId::Dashing).is_none());
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = MovementConfig::player().without_sprint();
        let err = LocomotionMachine::new(config, LocomotionAbilities::default()).unwrap_err();
        assert!(matches!(err, LocomotionError::MissingConfig { .. }));
    }

    #[test]
    fn new_machine_has_no_current_state() {
        let machine =
            LocomotionMachine::new(MovementConfig::player(), LocomotionAbilities::all()).unwrap();
        assert_eq!(machine.current(), None);
        assert_eq!(machine.activations(StateId::Idle), (0, 0));
        assert_eq!(machine.clock(), 0.0);
    }
}
