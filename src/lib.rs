//! # `player_locomotion`
//!
//! A hierarchical player-locomotion state machine driving a floating
//! rigidbody, with a physics backend abstraction.
//!
//! This crate provides a responsive, tuneable third/first-person locomotion
//! layer that:
//! - Floats the capsule above uneven ground with a single-tick velocity correction
//! - Scales speed and jump force by the slope under the character
//! - Moves through idle, walk, run, sprint, sprint-start, stop and landing states
//! - Jumps and falls with terminal speed and hard-fall detection
//! - Supports timed debuffs and a special-weapon dash
//! - Keeps every physics write behind a network authority check
//! - Abstracts the physics backend (Rapier3D included)
//!
//! ## Architecture
//!
//! A [`LocomotionMachine`](machine::LocomotionMachine) owns one state per
//! [`StateId`](machine::StateId) in a fixed arena and a shared
//! [`MovementContext`](context::MovementContext). Each fixed step:
//! 1. The backend fills [`GroundSensors`](detection::GroundSensors)
//! 2. Queued input, animation markers and contacts are dispatched to the current state
//! 3. The current state runs its frame, physics and camera hooks
//! 4. Marker components mirror the resulting state
//!
//! States never see the engine. They talk to a
//! [`CharacterHost`](host::CharacterHost), which the bevy adapter implements
//! on top of a [`LocomotionBackend`](backend::LocomotionBackend).
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use player_locomotion::prelude::*;
//!
//! // Components for a player that can sprint but has no special weapon
//! let config = MovementConfig::player();
//! let abilities = LocomotionAbilities::default();
//! let input = LocomotionInput::default();
//! let stats = LocomotionStats::default();
//!
//! // These can be spawned together with physics components
//! assert!(config.validate(&abilities).is_ok());
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod context;
pub mod curve;
pub mod detection;
pub mod error;
pub mod host;
pub mod intent;
pub mod machine;
pub mod rotation;
pub mod state;
pub mod states;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{LocomotionBackend, NoOpBackendPlugin};
    pub use crate::collision::{CollisionContact, CollisionData, LayerMask};
    pub use crate::config::{
        AirborneConfig, CapsuleConfig, DashConfig, DebuffConfig, DebuffSettings, FallConfig,
        FloatingCapsuleConfig, GroundCheckConfig, GroundedConfig, JumpConfig,
        LocomotionAbilities, MovementConfig, RotationConfig, RunConfig, SpecialWeaponConfig,
        SprintConfig, SprintStartConfig, StopConfig, WalkConfig,
    };
    pub use crate::context::{MovementContext, SpecialSkillState};
    pub use crate::curve::{Keyframe, SpeedCurve};
    pub use crate::detection::GroundSensors;
    pub use crate::error::LocomotionError;
    pub use crate::host::{
        AnimationDriver, AnimationFlag, AnimationMarker, AnimationTrigger, CameraView,
        CharacterHost, DashNotifier, ForceMode, GroundProbe, RayOrigin, RigidBodyActuator, Role,
        StatProvider,
    };
    pub use crate::intent::{InputAction, InputActions, InputEvent, LocomotionEvent, LocomotionInput};
    pub use crate::machine::{LocomotionMachine, StateCx, StateId};
    pub use crate::state::{Airborne, Debuffed, Grounded, LocomotionStatus};
    pub use crate::states::{DebuffKind, LocomotionState, MovementState};
    pub use crate::systems::{
        ApplyDebuff, DashEnded, LocomotionAnimation, LocomotionCamera, LocomotionFault,
        LocomotionStats, NetworkRole, WorldHost,
    };
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets for locomotion, run in order inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Backend sensing: ground rays, overlaps and contacts.
    Sensors,
    /// Machine construction and the per-character tick.
    StateMachine,
    /// Marker components catch up with the machines.
    Sync,
}

/// Main plugin for the locomotion system.
///
/// This plugin is generic over a physics backend `B` which provides the
/// rigid-body access and ground sensing.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use player_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::MovementConfig>();
        app.register_type::<config::LocomotionAbilities>();
        app.register_type::<intent::LocomotionInput>();
        app.register_type::<detection::GroundSensors>();
        app.register_type::<systems::LocomotionCamera>();
        app.register_type::<systems::LocomotionAnimation>();
        app.register_type::<systems::LocomotionStats>();
        app.register_type::<systems::NetworkRole>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Debuffed>();
        app.register_type::<state::LocomotionStatus>();

        app.add_event::<systems::DashEnded>();
        app.add_event::<systems::ApplyDebuff>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Sensors,
                LocomotionSet::StateMachine,
                LocomotionSet::Sync,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::initialize_machines, systems::drive_locomotion::<B>)
                .chain()
                .in_set(LocomotionSet::StateMachine),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(LocomotionSet::Sync),
        );
    }
}
