//! Collaborator contracts.
//!
//! The state machine never touches the engine directly. It talks to the
//! rigid body, the ground probes, the camera, the animator, the stat sheet and
//! the network layer through the narrow traits below. Any type implementing
//! all of them is a [`CharacterHost`].
//!
//! The bevy adapter lives in [`systems`](crate::systems); tests use a
//! scripted host.

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::collision::CollisionData;

/// How a force passed to [`RigidBodyActuator::add_force`] is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Instant velocity change, ignoring mass.
    VelocityChange,
    /// Continuous acceleration over the physics step, ignoring mass.
    Acceleration,
}

/// Where a ground ray starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayOrigin {
    /// The capsule collider's world-space center.
    ColliderCenter,
    /// The bottom of the capsule collider.
    ColliderBottom,
}

/// Read/write access to the character's rigid body.
pub trait RigidBodyActuator {
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn angular_velocity(&self) -> Vec3;
    fn add_force(&mut self, force: Vec3, mode: ForceMode);
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn set_rotation(&mut self, rotation: Quat);

    /// Body forward on the horizontal plane.
    fn forward(&self) -> Vec3 {
        let forward = self.rotation() * Vec3::NEG_Z;
        Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero()
    }
}

/// Ground queries against the ground collision layer.
pub trait GroundProbe {
    /// Cast a ray straight down. `None` when nothing is hit within `max_distance`.
    fn ground_ray(&self, origin: RayOrigin, max_distance: f32) -> Option<CollisionData>;

    /// Whether the ground-check box overlaps any ground collider.
    fn ground_overlap(&self) -> bool;
}

/// The active camera. Only its mode and facing are consumed.
pub trait CameraView {
    fn is_first_person(&self) -> bool;
    fn camera_forward(&self) -> Vec3;
}

/// Fire-and-forget animation commands.
pub trait AnimationDriver {
    fn start_flag(&mut self, flag: AnimationFlag);
    fn stop_flag(&mut self, flag: AnimationFlag);
    fn fire_trigger(&mut self, trigger: AnimationTrigger);
}

/// Character stats the states read and spend.
pub trait StatProvider {
    fn movement_speed(&self) -> f32;
    fn stamina(&self) -> f32;
    fn set_stamina(&mut self, stamina: f32);
    fn apply_fall_damage(&mut self, damage: f32);
}

/// Cross-observer notification for a collision-truncated dash.
pub trait DashNotifier {
    fn notify_dash_ended(&mut self);
}

/// Everything a state may need from the outside world.
pub trait CharacterHost:
    RigidBodyActuator + GroundProbe + CameraView + AnimationDriver + StatProvider + DashNotifier
{
}

impl<T> CharacterHost for T where
    T: RigidBodyActuator + GroundProbe + CameraView + AnimationDriver + StatProvider + DashNotifier
{
}

/// Network role of the simulating peer for one tick.
///
/// Read fresh every tick, since a host migration can change it.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Role {
    /// Allowed to write physics.
    pub is_authority: bool,
    /// Owns the input for this character.
    pub is_local_controller: bool,
    /// Replays the character for animation and camera only.
    pub is_remote_observer: bool,
}

impl Default for Role {
    fn default() -> Self {
        Self::standalone()
    }
}

impl Role {
    /// Single-player: authority and controller at once.
    pub const fn standalone() -> Self {
        Self {
            is_authority: true,
            is_local_controller: true,
            is_remote_observer: false,
        }
    }

    /// Dedicated server simulating a remote player.
    pub const fn server() -> Self {
        Self {
            is_authority: true,
            is_local_controller: false,
            is_remote_observer: false,
        }
    }

    /// Client watching another player.
    pub const fn observer() -> Self {
        Self {
            is_authority: false,
            is_local_controller: false,
            is_remote_observer: true,
        }
    }
}

/// Persistent animator flags, one per movement family.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum AnimationFlag {
    Grounded,
    Moving,
    Stopping,
    Landing,
    Airborne,
    Idle,
    Dash,
    Walk,
    Run,
    Sprint,
    Fall,
    Jump,
    Stunned,
    Frozen,
    Shocked,
    SpecialDash,
}

impl AnimationFlag {
    pub const ALL: [AnimationFlag; 16] = [
        AnimationFlag::Grounded,
        AnimationFlag::Moving,
        AnimationFlag::Stopping,
        AnimationFlag::Landing,
        AnimationFlag::Airborne,
        AnimationFlag::Idle,
        AnimationFlag::Dash,
        AnimationFlag::Walk,
        AnimationFlag::Run,
        AnimationFlag::Sprint,
        AnimationFlag::Fall,
        AnimationFlag::Jump,
        AnimationFlag::Stunned,
        AnimationFlag::Frozen,
        AnimationFlag::Shocked,
        AnimationFlag::SpecialDash,
    ];

    /// Bit used by flag sets.
    #[inline]
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// One-shot animator triggers.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum AnimationTrigger {
    /// Movement resumed while landing.
    MoveStart,
    /// The fall that just ended was hard.
    HardLand,
    /// A special dash was cut short by a collision.
    DashEnded,
}

/// Authored points inside animation clips, reported back by the animator.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum AnimationMarker {
    Enter,
    Exit,
    Transition,
}
