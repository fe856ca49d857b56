//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends implement to drive a
//! locomotion machine. The state machine itself only sees the
//! [`CharacterHost`](crate::host::CharacterHost) traits; the bevy adapter in
//! [`systems`](crate::systems) forwards the rigid-body half of that contract
//! to a backend, so swapping physics engines never touches a state.
//!
//! Ground sensing is not part of the trait. Backends fill the
//! [`GroundSensors`](crate::detection::GroundSensors) component from their own
//! systems in [`LocomotionSet::Sensors`](crate::LocomotionSet::Sensors), where
//! they can take their physics context as a system parameter.

use bevy::prelude::*;

use crate::host::ForceMode;

/// Trait for physics backend implementations.
///
/// All functions are associated functions over the [`World`], called from the
/// exclusive locomotion driver. Missing components are tolerated: reads fall
/// back to zero or identity and writes become no-ops.
///
/// # Example
///
/// See `Rapier3dBackend` (feature `rapier3d`) for a complete implementation.
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Get the current angular velocity of an entity.
    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3;

    /// Apply a force with the given mode.
    ///
    /// Both modes ignore mass: a velocity change of `v` changes velocity by
    /// exactly `v`, and an acceleration of `a` changes it by `a × dt` over one
    /// fixed step. Backends that only accept real forces scale by
    /// [`get_mass`](Self::get_mass).
    fn apply_force(world: &mut World, entity: Entity, force: Vec3, mode: ForceMode);

    /// Get the mass of an entity.
    fn get_mass(_world: &World, _entity: Entity) -> f32 {
        1.0
    }

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Get the current rotation of an entity.
    fn get_rotation(world: &World, entity: Entity) -> Quat;

    /// Set the rotation of an entity.
    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
