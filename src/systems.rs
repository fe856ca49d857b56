//! Core locomotion systems and the world-backed host.
//!
//! These systems build, drive and mirror one [`LocomotionMachine`] per
//! character. They are generic over the physics backend so that the same
//! machine runs on any engine with a [`LocomotionBackend`].

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::backend::LocomotionBackend;
use crate::collision::CollisionData;
use crate::config::{LocomotionAbilities, MovementConfig};
use crate::detection::GroundSensors;
use crate::error::LocomotionError;
use crate::host::{
    AnimationDriver, AnimationFlag, AnimationTrigger, CameraView, DashNotifier, ForceMode,
    GroundProbe, RayOrigin, RigidBodyActuator, Role, StatProvider,
};
use crate::intent::{LocomotionEvent, LocomotionInput};
use crate::machine::LocomotionMachine;
use crate::state::{Airborne, Debuffed, Grounded, LocomotionStatus};
use crate::states::DebuffKind;

// ==================== Components ====================

/// Camera facing consumed by the machine.
///
/// Written by the game's camera rig; the machine only reads it.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct LocomotionCamera {
    pub first_person: bool,
    /// World-space camera forward. Pitch is ignored.
    pub forward: Vec3,
}

impl Default for LocomotionCamera {
    fn default() -> Self {
        Self {
            first_person: false,
            forward: Vec3::NEG_Z,
        }
    }
}

impl LocomotionCamera {
    pub fn third_person(forward: Vec3) -> Self {
        Self {
            first_person: false,
            forward,
        }
    }

    pub fn first_person(forward: Vec3) -> Self {
        Self {
            first_person: true,
            forward,
        }
    }
}

/// Animator-facing output of the machine.
///
/// Flags are persistent and mirror the active states. Triggers queue up until
/// the animation layer drains them.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct LocomotionAnimation {
    flags: u32,
    #[reflect(ignore)]
    triggers: Vec<AnimationTrigger>,
}

impl LocomotionAnimation {
    pub fn is_set(&self, flag: AnimationFlag) -> bool {
        self.flags & flag.bit() != 0
    }

    pub fn set(&mut self, flag: AnimationFlag, value: bool) {
        if value {
            self.flags |= flag.bit();
        } else {
            self.flags &= !flag.bit();
        }
    }

    /// Every flag currently set, in declaration order.
    pub fn active_flags(&self) -> impl Iterator<Item = AnimationFlag> + '_ {
        AnimationFlag::ALL
            .into_iter()
            .filter(|flag| self.is_set(*flag))
    }

    pub fn fire(&mut self, trigger: AnimationTrigger) {
        self.triggers.push(trigger);
    }

    /// Triggers fired since the last drain, oldest first.
    pub fn triggers(&self) -> &[AnimationTrigger] {
        &self.triggers
    }

    pub fn drain_triggers(&mut self) -> impl Iterator<Item = AnimationTrigger> + '_ {
        self.triggers.drain(..)
    }
}

/// Stat sheet read and spent by the machine.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct LocomotionStats {
    /// Base speed in meters per second before modifiers.
    pub movement_speed: f32,
    pub stamina: f32,
    /// Total fall damage applied so far. The game moves it into its health model.
    pub fall_damage_taken: f32,
}

impl Default for LocomotionStats {
    fn default() -> Self {
        Self {
            movement_speed: 5.0,
            stamina: 100.0,
            fall_damage_taken: 0.0,
        }
    }
}

/// Network role of the peer simulating this character. Defaults to standalone.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct NetworkRole(pub Role);

/// Attached instead of a machine when the configuration is rejected.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct LocomotionFault(pub LocomotionError);

// ==================== Events ====================

/// A special-weapon dash was cut short by a collision.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashEnded {
    pub entity: Entity,
}

/// Interrupt a character with a debuff before its next tick.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyDebuff {
    pub entity: Entity,
    pub kind: DebuffKind,
}

// ==================== Host Adapter ====================

/// [`CharacterHost`](crate::host::CharacterHost) backed by one entity in the world.
///
/// Rigid-body access goes through the backend `B`. Ground queries are served
/// from the [`GroundSensors`] the backend cached this step, and the camera is
/// snapshotted when the host is built.
pub struct WorldHost<'w, B: LocomotionBackend> {
    world: &'w mut World,
    entity: Entity,
    sensors: GroundSensors,
    camera: LocomotionCamera,
    _backend: PhantomData<B>,
}

impl<'w, B: LocomotionBackend> WorldHost<'w, B> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        let sensors = world.get::<GroundSensors>(entity).copied().unwrap_or_default();
        let camera = world.get::<LocomotionCamera>(entity).copied().unwrap_or_default();
        Self {
            world,
            entity,
            sensors,
            camera,
            _backend: PhantomData,
        }
    }

    fn stats(&self) -> LocomotionStats {
        self.world
            .get::<LocomotionStats>(self.entity)
            .copied()
            .unwrap_or_default()
    }
}

impl<B: LocomotionBackend> RigidBodyActuator for WorldHost<'_, B> {
    fn velocity(&self) -> Vec3 {
        B::get_velocity(self.world, self.entity)
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        B::set_velocity(self.world, self.entity, velocity);
    }

    fn angular_velocity(&self) -> Vec3 {
        B::get_angular_velocity(self.world, self.entity)
    }

    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        B::apply_force(self.world, self.entity, force, mode);
    }

    fn position(&self) -> Vec3 {
        B::get_position(self.world, self.entity)
    }

    fn rotation(&self) -> Quat {
        B::get_rotation(self.world, self.entity)
    }

    fn set_rotation(&mut self, rotation: Quat) {
        B::set_rotation(self.world, self.entity, rotation);
    }
}

impl<B: LocomotionBackend> GroundProbe for WorldHost<'_, B> {
    fn ground_ray(&self, origin: RayOrigin, max_distance: f32) -> Option<CollisionData> {
        self.sensors.ray(origin, max_distance)
    }

    fn ground_overlap(&self) -> bool {
        self.sensors.overlap
    }
}

impl<B: LocomotionBackend> CameraView for WorldHost<'_, B> {
    fn is_first_person(&self) -> bool {
        self.camera.first_person
    }

    fn camera_forward(&self) -> Vec3 {
        self.camera.forward
    }
}

impl<B: LocomotionBackend> AnimationDriver for WorldHost<'_, B> {
    fn start_flag(&mut self, flag: AnimationFlag) {
        if let Some(mut animation) = self.world.get_mut::<LocomotionAnimation>(self.entity) {
            animation.set(flag, true);
        }
    }

    fn stop_flag(&mut self, flag: AnimationFlag) {
        if let Some(mut animation) = self.world.get_mut::<LocomotionAnimation>(self.entity) {
            animation.set(flag, false);
        }
    }

    fn fire_trigger(&mut self, trigger: AnimationTrigger) {
        if let Some(mut animation) = self.world.get_mut::<LocomotionAnimation>(self.entity) {
            animation.fire(trigger);
        }
    }
}

impl<B: LocomotionBackend> StatProvider for WorldHost<'_, B> {
    fn movement_speed(&self) -> f32 {
        self.stats().movement_speed
    }

    fn stamina(&self) -> f32 {
        self.stats().stamina
    }

    fn set_stamina(&mut self, stamina: f32) {
        if let Some(mut stats) = self.world.get_mut::<LocomotionStats>(self.entity) {
            stats.stamina = stamina;
        }
    }

    fn apply_fall_damage(&mut self, damage: f32) {
        if let Some(mut stats) = self.world.get_mut::<LocomotionStats>(self.entity) {
            stats.fall_damage_taken += damage;
        }
    }
}

impl<B: LocomotionBackend> DashNotifier for WorldHost<'_, B> {
    fn notify_dash_ended(&mut self) {
        self.world.send_event(DashEnded {
            entity: self.entity,
        });
    }
}

// ==================== Systems ====================

/// Build a machine for every configured character that has none yet.
///
/// A rejected configuration is logged once and parks the entity with a
/// [`LocomotionFault`].
pub fn initialize_machines(
    mut commands: Commands,
    q_characters: Query<
        (Entity, &MovementConfig, Option<&LocomotionAbilities>),
        (Without<LocomotionMachine>, Without<LocomotionFault>),
    >,
) {
    for (entity, config, abilities) in &q_characters {
        let abilities = abilities.copied().unwrap_or_default();
        match LocomotionMachine::new(config.clone(), abilities) {
            Ok(machine) => {
                commands.entity(entity).insert((machine, LocomotionStatus::default()));
                commands.entity(entity).insert_if_new(GroundSensors::default());
            }
            Err(err) => {
                error!(?entity, %err, "locomotion configuration rejected");
                commands.entity(entity).insert(LocomotionFault(err));
            }
        }
    }
}

/// Tick every machine once with this step's queued events.
///
/// The machine is swapped out of its component for the duration of the tick
/// so the host can borrow the rest of the world mutably. A vacant machine
/// holds the slot meanwhile, so the entity never changes archetype.
pub fn drive_locomotion<B: LocomotionBackend>(
    world: &mut World,
    mut spare: Local<Option<LocomotionMachine>>,
) {
    let dt = B::get_fixed_timestep(world);

    let debuffs: Vec<ApplyDebuff> = world
        .get_resource_mut::<Events<ApplyDebuff>>()
        .map(|mut events| events.drain().collect())
        .unwrap_or_default();

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<LocomotionMachine>>()
        .iter(world)
        .collect();

    for entity in entities {
        let Some(mut slot) = world.get_mut::<LocomotionMachine>(entity) else {
            continue;
        };
        let vacant = spare.take().unwrap_or_else(LocomotionMachine::vacant);
        let mut machine = std::mem::replace(&mut *slot, vacant);
        let role = world.get::<NetworkRole>(entity).copied().unwrap_or_default().0;
        let events: Vec<LocomotionEvent> = world
            .get_mut::<LocomotionInput>(entity)
            .map(|mut input| input.drain().collect())
            .unwrap_or_default();

        let mut host = WorldHost::<B>::new(world, entity);
        let mut result = machine.start(&mut host, role);
        for debuff in debuffs.iter().filter(|d| d.entity == entity) {
            result = result.and_then(|()| machine.apply_debuff(&mut host, role, debuff.kind));
        }
        let result = result.and_then(|()| machine.tick(&mut host, role, events, dt));
        if let Err(err) = result {
            error!(?entity, %err, "locomotion tick abandoned");
        }

        let state = machine.current();
        if let Some(mut status) = world.get_mut::<LocomotionStatus>(entity) {
            status.set_if_neq(LocomotionStatus { state });
        }
        if let Some(mut slot) = world.get_mut::<LocomotionMachine>(entity) {
            *spare = Some(std::mem::replace(&mut *slot, machine));
        }
    }
}

/// Sync the family marker components with each machine's current state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_status: Query<
        (
            Entity,
            &LocomotionStatus,
            Has<Grounded>,
            Has<Airborne>,
            Has<Debuffed>,
        ),
        Changed<LocomotionStatus>,
    >,
) {
    for (entity, status, has_grounded, has_airborne, has_debuffed) in &q_status {
        let mut entity_commands = commands.entity(entity);

        if status.is_grounded() && !has_grounded {
            entity_commands.insert(Grounded);
        } else if !status.is_grounded() && has_grounded {
            entity_commands.remove::<Grounded>();
        }

        if status.is_airborne() && !has_airborne {
            entity_commands.insert(Airborne);
        } else if !status.is_airborne() && has_airborne {
            entity_commands.remove::<Airborne>();
        }

        if status.is_debuffed() && !has_debuffed {
            entity_commands.insert(Debuffed);
        } else if !status.is_debuffed() && has_debuffed {
            entity_commands.remove::<Debuffed>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_flags_toggle() {
        let mut animation = LocomotionAnimation::default();
        animation.set(AnimationFlag::Grounded, true);
        animation.set(AnimationFlag::Idle, true);
        animation.set(AnimationFlag::Idle, false);

        assert!(animation.is_set(AnimationFlag::Grounded));
        assert!(!animation.is_set(AnimationFlag::Idle));
        assert_eq!(
            animation.active_flags().collect::<Vec<_>>(),
            vec![AnimationFlag::Grounded]
        );
    }

    #[test]
    fn triggers_drain_in_order() {
        let mut animation = LocomotionAnimation::default();
        animation.fire(AnimationTrigger::HardLand);
        animation.fire(AnimationTrigger::MoveStart);

        let drained: Vec<_> = animation.drain_triggers().collect();
        assert_eq!(
            drained,
            vec![AnimationTrigger::HardLand, AnimationTrigger::MoveStart]
        );
        assert!(animation.triggers().is_empty());
    }

    #[test]
    fn default_role_is_standalone() {
        assert_eq!(NetworkRole::default().0, Role::standalone());
    }
}
