//! Input events and the per-character event queue.
//!
//! Input devices, animation markers and physics contacts all reach the state
//! machine as [`LocomotionEvent`]s queued on a [`LocomotionInput`] component
//! and drained once per tick, in order.

use bevy::prelude::*;

use crate::collision::CollisionContact;
use crate::host::AnimationMarker;

/// Logical input actions. Each can be disabled for a while independently.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Movement,
    Sprint,
    Jump,
    WalkToggle,
    Dash,
    SpecialDash,
}

impl InputAction {
    pub const COUNT: usize = 6;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Edge-triggered input callbacks.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Movement input left the dead zone.
    MovementStarted(Vec2),
    /// Movement input changed while held.
    MovementPerformed(Vec2),
    /// Movement input returned to zero.
    MovementCanceled,
    /// Sprint held past the sprint-start.
    SprintPerformed,
    JumpPressed,
    WalkToggleStarted,
    DashPressed,
    /// Special-weapon dash.
    SpecialDashPressed,
}

impl InputEvent {
    /// The action this event belongs to.
    pub fn action(&self) -> InputAction {
        match self {
            InputEvent::MovementStarted(_)
            | InputEvent::MovementPerformed(_)
            | InputEvent::MovementCanceled => InputAction::Movement,
            InputEvent::SprintPerformed => InputAction::Sprint,
            InputEvent::JumpPressed => InputAction::Jump,
            InputEvent::WalkToggleStarted => InputAction::WalkToggle,
            InputEvent::DashPressed => InputAction::Dash,
            InputEvent::SpecialDashPressed => InputAction::SpecialDash,
        }
    }

    /// Movement vector carried by the event, if it is a movement event.
    pub fn movement(&self) -> Option<Vec2> {
        match self {
            InputEvent::MovementStarted(v) | InputEvent::MovementPerformed(v) => Some(*v),
            InputEvent::MovementCanceled => Some(Vec2::ZERO),
            _ => None,
        }
    }
}

/// Anything that can happen to a character between two ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocomotionEvent {
    Input(InputEvent),
    Animation(AnimationMarker),
    Collision(CollisionContact),
}

impl From<InputEvent> for LocomotionEvent {
    fn from(event: InputEvent) -> Self {
        LocomotionEvent::Input(event)
    }
}

impl From<AnimationMarker> for LocomotionEvent {
    fn from(marker: AnimationMarker) -> Self {
        LocomotionEvent::Animation(marker)
    }
}

impl From<CollisionContact> for LocomotionEvent {
    fn from(contact: CollisionContact) -> Self {
        LocomotionEvent::Collision(contact)
    }
}

/// Time-boxed disabling of input actions.
///
/// Times are on the machine clock, in seconds.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct InputActions {
    disabled_until: [Option<f64>; InputAction::COUNT],
}

impl InputActions {
    /// Disable `action` for `duration` seconds starting at `now`.
    pub fn disable_for(&mut self, action: InputAction, duration: f32, now: f64) {
        self.disabled_until[action.index()] = Some(now + f64::from(duration.max(0.0)));
    }

    /// Re-enable `action` immediately.
    pub fn enable(&mut self, action: InputAction) {
        self.disabled_until[action.index()] = None;
    }

    pub fn is_enabled(&self, action: InputAction, now: f64) -> bool {
        match self.disabled_until[action.index()] {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// Seconds until `action` is enabled again, zero if it already is.
    pub fn remaining(&self, action: InputAction, now: f64) -> f32 {
        self.disabled_until[action.index()]
            .map(|until| (until - now).max(0.0) as f32)
            .unwrap_or(0.0)
    }
}

/// Event queue feeding one character's state machine.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use player_locomotion::prelude::*;
///
/// let mut input = LocomotionInput::default();
/// input.set_movement(Vec2::Y);
/// input.press(InputEvent::JumpPressed);
/// input.set_movement(Vec2::ZERO);
///
/// let events: Vec<_> = input.drain().collect();
/// assert_eq!(events.len(), 4);
/// assert!(input.is_empty());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct LocomotionInput {
    #[reflect(ignore)]
    events: Vec<LocomotionEvent>,
    /// Last analog value passed to [`set_movement`](Self::set_movement).
    movement: Vec2,
}

impl LocomotionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue any event.
    pub fn push(&mut self, event: impl Into<LocomotionEvent>) {
        self.events.push(event.into());
    }

    /// Queue a button-style input event.
    pub fn press(&mut self, event: InputEvent) {
        self.push(event);
    }

    /// Report an animation marker.
    pub fn animation(&mut self, marker: AnimationMarker) {
        self.push(marker);
    }

    /// Feed the polled analog movement value.
    ///
    /// Emits started/performed when it leaves zero, performed when it changes,
    /// and canceled when it returns to zero. Repeating a value emits nothing.
    pub fn set_movement(&mut self, movement: Vec2) {
        let previous = self.movement;
        if movement == previous {
            return;
        }
        self.movement = movement;

        if movement == Vec2::ZERO {
            self.push(InputEvent::MovementCanceled);
        } else if previous == Vec2::ZERO {
            self.push(InputEvent::MovementStarted(movement));
            self.push(InputEvent::MovementPerformed(movement));
        } else {
            self.push(InputEvent::MovementPerformed(movement));
        }
    }

    /// Current analog movement value.
    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = LocomotionEvent> + '_ {
        self.events.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_edges() {
        let mut input = LocomotionInput::new();
        input.set_movement(Vec2::new(0.0, 1.0));
        input.set_movement(Vec2::new(0.0, 1.0));
        input.set_movement(Vec2::new(1.0, 0.0));
        input.set_movement(Vec2::ZERO);

        let events: Vec<_> = input.drain().collect();
        assert_eq!(
            events,
            vec![
                LocomotionEvent::Input(InputEvent::MovementStarted(Vec2::Y)),
                LocomotionEvent::Input(InputEvent::MovementPerformed(Vec2::Y)),
                LocomotionEvent::Input(InputEvent::MovementPerformed(Vec2::X)),
                LocomotionEvent::Input(InputEvent::MovementCanceled),
            ]
        );
    }

    #[test]
    fn events_map_to_actions() {
        assert_eq!(InputEvent::DashPressed.action(), InputAction::Dash);
        assert_eq!(
            InputEvent::MovementCanceled.action(),
            InputAction::Movement
        );
        assert_eq!(InputEvent::MovementCanceled.movement(), Some(Vec2::ZERO));
        assert_eq!(InputEvent::JumpPressed.movement(), None);
    }

    #[test]
    fn disabled_action_reenables_after_duration() {
        let mut actions = InputActions::default();
        assert!(actions.is_enabled(InputAction::Dash, 0.0));

        actions.disable_for(InputAction::Dash, 1.5, 10.0);
        assert!(!actions.is_enabled(InputAction::Dash, 10.0));
        assert!(!actions.is_enabled(InputAction::Dash, 11.49));
        assert!(actions.is_enabled(InputAction::Dash, 11.5));
        assert!((actions.remaining(InputAction::Dash, 11.0) - 0.5).abs() < 1e-5);

        // Other actions are untouched.
        assert!(actions.is_enabled(InputAction::Jump, 10.0));
    }

    #[test]
    fn cooldown_expires_after_a_week_of_uptime() {
        let step = f64::from(1.0f32 / 60.0);
        let mut now = 7.0 * 24.0 * 3600.0;
        let mut actions = InputActions::default();
        actions.disable_for(InputAction::Dash, 0.5, now);

        let mut steps = 0;
        while !actions.is_enabled(InputAction::Dash, now) {
            now += step;
            steps += 1;
            assert!(steps <= 31, "cooldown never expired");
        }
        assert!(steps >= 30);
    }

    #[test]
    fn enable_clears_cooldown() {
        let mut actions = InputActions::default();
        actions.disable_for(InputAction::Jump, 5.0, 0.0);
        actions.enable(InputAction::Jump);
        assert!(actions.is_enabled(InputAction::Jump, 0.0));
    }
}
