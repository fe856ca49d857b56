//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Characters need [`ActiveEvents::COLLISION_EVENTS`] on their collider for
//! dash-ending contacts to reach the machine; [`Rapier3dCharacterBundle`]
//! sets it.

use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::LocomotionBackend;
use crate::collision::{CollisionContact, CollisionData, LayerMask};
use crate::config::MovementConfig;
use crate::detection::GroundSensors;
use crate::host::ForceMode;
use crate::intent::LocomotionInput;
use crate::LocomotionSet;

/// Rapier3D physics backend for the locomotion machine.
///
/// Rigid-body reads and writes go through `Velocity`, `ExternalImpulse` and
/// `Transform`. Ground sensing and contact routing are handled by dedicated
/// Rapier systems that receive the Rapier context as a system parameter.
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.angvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::VelocityChange => {
                if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
                    vel.linvel += force;
                }
            }
            ForceMode::Acceleration => {
                let dt = Self::get_fixed_timestep(world);
                let mass = Self::get_mass(world, entity);
                if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
                    ext_impulse.impulse += force * mass * dt;
                } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
                    // Fallback: integrate directly if no ExternalImpulse component
                    vel.linvel += force * dt;
                }
            }
        }
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|mass| *mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0)
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation())
            })
            .unwrap_or(Vec3::ZERO)
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = rotation;
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the locomotion machine.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (rapier_ground_sensing, rapier_collision_contacts).in_set(LocomotionSet::Sensors),
        );
    }
}

/// Query filter that only sees the configured ground layers.
fn ground_filter(entity: Entity, layers: LayerMask) -> QueryFilter<'static> {
    QueryFilter::default()
        .exclude_rigid_body(entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(layers.bits()),
        ))
}

/// Cast a ray straight down using RapierContext.
fn rapier_ground_ray(
    context: &RapierContext,
    origin: Vec3,
    max_distance: f32,
    filter: QueryFilter,
) -> Option<CollisionData> {
    context
        .cast_ray_and_get_normal(origin, Vec3::NEG_Y, max_distance, true, filter)
        .map(|(hit_entity, hit)| {
            CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
        })
}

/// Rapier-specific ground sensing.
///
/// Fills [`GroundSensors`] with:
/// - the center ray, cast from the collider center,
/// - the bottom ray, cast from the collider bottom,
/// - the ground-check box overlap.
///
/// Rays are cast at the longest length any state asks for. The body origin is
/// taken to be the collider center.
fn rapier_ground_sensing(
    rapier_context: ReadRapierContext,
    mut q_characters: Query<(Entity, &GlobalTransform, &MovementConfig, &mut GroundSensors)>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, mut sensors) in &mut q_characters {
        let center = transform.translation();
        let bottom = center - Vec3::Y * config.capsule.half_height();
        let filter = ground_filter(entity, config.grounded.ground_layers);
        let (center_length, bottom_length) = GroundSensors::cast_lengths(config);

        sensors.reset();
        sensors.center = rapier_ground_ray(&context, center, center_length, filter);
        sensors.bottom = rapier_ground_ray(&context, bottom, bottom_length, filter);

        let check = config.ground_check;
        let shape = Collider::cuboid(check.half_extents.x, check.half_extents.y, check.half_extents.z);
        let mut overlap = false;
        context.intersections_with_shape(
            center + check.center_offset,
            Quat::IDENTITY,
            &shape,
            filter,
            |_| {
                overlap = true;
                false
            },
        );
        sensors.overlap = overlap;
    }
}

/// Forward collision starts to the machine as contacts.
///
/// The contact layers are the other collider's membership bits, or every
/// layer when it has no collision groups.
fn rapier_collision_contacts(
    mut collisions: EventReader<CollisionEvent>,
    mut q_inputs: Query<&mut LocomotionInput>,
    q_groups: Query<&CollisionGroups>,
) {
    for event in collisions.read() {
        let &CollisionEvent::Started(a, b, _) = event else {
            continue;
        };

        for (this, other) in [(a, b), (b, a)] {
            let Ok(mut input) = q_inputs.get_mut(this) else {
                continue;
            };
            let layers = q_groups
                .get(other)
                .map(|groups| LayerMask(groups.memberships.bits()))
                .unwrap_or(LayerMask::ALL);
            input.push(CollisionContact::new(layers).with_other(other));
        }
    }
}

/// Bundle for creating a character with Rapier3D physics.
///
/// Rotation is locked so that contacts never tip the capsule over; the
/// machine turns the body by writing its `Transform` yaw directly.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use player_locomotion::prelude::*;
/// use player_locomotion::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     let config = MovementConfig::player();
///     commands.spawn((
///         Transform::from_xyz(0.0, 1.0, 0.0),
///         Collider::capsule_y(0.6, 0.3),
///         Rapier3dCharacterBundle::new(),
///         config,
///         LocomotionAbilities::default(),
///         LocomotionInput::default(),
///         LocomotionStats::default(),
///         LocomotionAnimation::default(),
///         LocomotionCamera::default(),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Written by the machine each step.
    pub velocity: Velocity,
    /// Accelerations are fed to Rapier as per-step impulses.
    pub external_impulse: ExternalImpulse,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
    /// Computed mass properties. Rapier updates this based on the entity's collider.
    pub mass_properties: ReadMassProperties,
    pub active_events: ActiveEvents,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            mass_properties: ReadMassProperties::default(),
            active_events: ActiveEvents::COLLISION_EVENTS,
        }
    }

    /// Set the damping coefficients for velocity reduction.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}
