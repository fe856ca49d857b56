//! Concrete locomotion states.
//!
//! Every state is a small struct holding only its own transient fields. The
//! shared algorithms (moving, floating, fall checks, rotation) live in free
//! functions that the states call explicitly, instead of being inherited.

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::collision::CollisionContact;
use crate::config::{DebuffConfig, DebuffSettings};
use crate::host::AnimationFlag;
use crate::intent::InputEvent;
use crate::machine::{StateCx, StateId};

mod airborne;
mod dash;
mod debuff;
pub mod grounded;
mod sprint;
mod stopping;

pub use airborne::{Falling, Jumping};
pub use dash::Dashing;
pub use debuff::Debuffed;
pub use grounded::{Idle, Running, Walking};
pub use sprint::{SprintStarting, Sprinting};
pub use stopping::{LightLanding, LightStopping};

/// Lifecycle contract of a movement state.
///
/// Hooks that may end the state return the identifier of the state to switch
/// to. Every hook defaults to doing nothing.
pub trait MovementState {
    fn id(&self) -> StateId;

    fn enter(&mut self, _cx: &mut StateCx) {}

    fn exit(&mut self, _cx: &mut StateCx) {}

    /// Per-frame logic: timers and input-driven checks.
    fn update(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        None
    }

    /// Per-physics-step logic: forces, ground sensing, rotation.
    fn physics_update(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        None
    }

    /// Late camera-facing adjustments.
    fn camera_update(&mut self, _cx: &mut StateCx) {}

    fn on_input(&mut self, _cx: &mut StateCx, _event: InputEvent) -> Option<StateId> {
        None
    }

    fn on_animation_enter(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        None
    }

    fn on_animation_exit(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        None
    }

    fn on_animation_transition(&mut self, _cx: &mut StateCx) -> Option<StateId> {
        None
    }

    fn on_collision(&mut self, _cx: &mut StateCx, _contact: CollisionContact) -> Option<StateId> {
        None
    }
}

/// The three timed debuffs. One parametrized state implements all of them.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum DebuffKind {
    Stunned,
    Frozen,
    Shocked,
}

impl DebuffKind {
    pub fn state_id(self) -> StateId {
        match self {
            DebuffKind::Stunned => StateId::Stunned,
            DebuffKind::Frozen => StateId::Frozen,
            DebuffKind::Shocked => StateId::Shocked,
        }
    }

    pub fn settings(self, config: &DebuffConfig) -> DebuffSettings {
        match self {
            DebuffKind::Stunned => config.stunned,
            DebuffKind::Frozen => config.frozen,
            DebuffKind::Shocked => config.shocked,
        }
    }

    pub fn flag(self) -> AnimationFlag {
        match self {
            DebuffKind::Stunned => AnimationFlag::Stunned,
            DebuffKind::Frozen => AnimationFlag::Frozen,
            DebuffKind::Shocked => AnimationFlag::Shocked,
        }
    }
}

/// Arena entry: one variant per concrete state.
#[derive(Debug, Clone)]
pub enum LocomotionState {
    Idle(Idle),
    Walking(Walking),
    Running(Running),
    Sprinting(Sprinting),
    SprintStarting(SprintStarting),
    LightStopping(LightStopping),
    LightLanding(LightLanding),
    Jumping(Jumping),
    Falling(Falling),
    Debuffed(Debuffed),
    Dashing(Dashing),
}

impl LocomotionState {
    /// Construct the state registered under `id`.
    pub fn new(id: StateId) -> Self {
        match id {
            StateId::Idle => Self::Idle(Idle),
            StateId::Walking => Self::Walking(Walking),
            StateId::Running => Self::Running(Running::default()),
            StateId::Sprinting => Self::Sprinting(Sprinting::default()),
            StateId::SprintStarting => Self::SprintStarting(SprintStarting::default()),
            StateId::LightStopping => Self::LightStopping(LightStopping),
            StateId::LightLanding => Self::LightLanding(LightLanding::default()),
            StateId::Jumping => Self::Jumping(Jumping::default()),
            StateId::Falling => Self::Falling(Falling::default()),
            StateId::Stunned => Self::Debuffed(Debuffed::new(DebuffKind::Stunned)),
            StateId::Frozen => Self::Debuffed(Debuffed::new(DebuffKind::Frozen)),
            StateId::Shocked => Self::Debuffed(Debuffed::new(DebuffKind::Shocked)),
            StateId::Dashing => Self::Dashing(Dashing::default()),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $state:ident => $body:expr) => {
        match $self {
            LocomotionState::Idle($state) => $body,
            LocomotionState::Walking($state) => $body,
            LocomotionState::Running($state) => $body,
            LocomotionState::Sprinting($state) => $body,
            LocomotionState::SprintStarting($state) => $body,
            LocomotionState::LightStopping($state) => $body,
            LocomotionState::LightLanding($state) => $body,
            LocomotionState::Jumping($state) => $body,
            LocomotionState::Falling($state) => $body,
            LocomotionState::Debuffed($state) => $body,
            LocomotionState::Dashing($state) => $body,
        }
    };
}

impl MovementState for LocomotionState {
    fn id(&self) -> StateId {
        delegate!(self, s => s.id())
    }

    fn enter(&mut self, cx: &mut StateCx) {
        delegate!(self, s => s.enter(cx))
    }

    fn exit(&mut self, cx: &mut StateCx) {
        delegate!(self, s => s.exit(cx))
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        delegate!(self, s => s.update(cx))
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        delegate!(self, s => s.physics_update(cx))
    }

    fn camera_update(&mut self, cx: &mut StateCx) {
        delegate!(self, s => s.camera_update(cx))
    }

    fn on_input(&mut self, cx: &mut StateCx, event: InputEvent) -> Option<StateId> {
        delegate!(self, s => s.on_input(cx, event))
    }

    fn on_animation_enter(&mut self, cx: &mut StateCx) -> Option<StateId> {
        delegate!(self, s => s.on_animation_enter(cx))
    }

    fn on_animation_exit(&mut self, cx: &mut StateCx) -> Option<StateId> {
        delegate!(self, s => s.on_animation_exit(cx))
    }

    fn on_animation_transition(&mut self, cx: &mut StateCx) -> Option<StateId> {
        delegate!(self, s => s.on_animation_transition(cx))
    }

    fn on_collision(&mut self, cx: &mut StateCx, contact: CollisionContact) -> Option<StateId> {
        delegate!(self, s => s.on_collision(cx, contact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_entries_report_their_id() {
        for id in StateId::ALL {
            assert_eq!(LocomotionState::new(id).id(), id);
        }
    }

    #[test]
    fn debuff_kinds_map_to_their_state() {
        let config = DebuffConfig::default();
        for kind in [DebuffKind::Stunned, DebuffKind::Frozen, DebuffKind::Shocked] {
            assert!(kind.state_id().is_debuff());
        }
        assert_eq!(DebuffKind::Frozen.settings(&config), config.frozen);
    }
}
