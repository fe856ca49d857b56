//! Scripted character host shared by the integration tests.
//!
//! Every collaborator contract is backed by a plain public field so a test
//! can set up the world, tick the machine and inspect what it did.

#![allow(dead_code)]

use std::collections::HashSet;

use bevy::prelude::*;
use player_locomotion::prelude::*;

/// Fixed step used by every test.
pub const DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone)]
pub struct TestHost {
    // Rigid body
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
    /// Velocity, force and rotation writes that reached the body.
    pub physics_writes: u32,
    pub forces: Vec<(Vec3, ForceMode)>,

    // Ground
    pub center_hit: Option<CollisionData>,
    pub bottom_hit: Option<CollisionData>,
    pub overlap: bool,

    // Camera
    pub first_person: bool,
    pub camera_forward: Vec3,

    // Animation
    pub flags: HashSet<AnimationFlag>,
    pub triggers: Vec<AnimationTrigger>,

    // Stats
    pub movement_speed: f32,
    pub stamina: f32,
    pub fall_damage: f32,

    pub dash_notifications: u32,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::on_flat_ground(MovementConfig::player().capsule.center_height)
    }
}

impl TestHost {
    /// Body resting at `center_height` above flat ground.
    pub fn on_flat_ground(center_height: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            position: Vec3::new(0.0, center_height, 0.0),
            rotation: Quat::IDENTITY,
            physics_writes: 0,
            forces: Vec::new(),
            center_hit: Some(flat_hit(center_height)),
            bottom_hit: Some(flat_hit(0.0)),
            overlap: true,
            first_person: false,
            camera_forward: Vec3::NEG_Z,
            flags: HashSet::new(),
            triggers: Vec::new(),
            movement_speed: 5.0,
            stamina: 100.0,
            fall_damage: 0.0,
            dash_notifications: 0,
        }
    }

    /// Body with nothing underneath.
    pub fn in_air(height: f32) -> Self {
        let mut host = Self::on_flat_ground(height);
        host.leave_ground();
        host
    }

    pub fn leave_ground(&mut self) {
        self.center_hit = None;
        self.bottom_hit = None;
        self.overlap = false;
    }

    pub fn touch_ground(&mut self, center_height: f32) {
        self.center_hit = Some(flat_hit(center_height));
        self.bottom_hit = Some(flat_hit(0.0));
        self.overlap = true;
    }

    pub fn has_flag(&self, flag: AnimationFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn horizontal_speed(&self) -> f32 {
        self.velocity.xz().length()
    }
}

/// Ground hit straight below at `distance` on flat ground.
pub fn flat_hit(distance: f32) -> CollisionData {
    CollisionData::new(distance, Vec3::Y, Vec3::ZERO, None)
}

/// Ground hit at `distance` on a slope tilted `degrees` about the Z axis.
pub fn sloped_hit(distance: f32, degrees: f32) -> CollisionData {
    let tilt = degrees.to_radians();
    CollisionData::new(distance, Vec3::new(tilt.sin(), tilt.cos(), 0.0), Vec3::ZERO, None)
}

impl RigidBodyActuator for TestHost {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.physics_writes += 1;
        self.velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        self.physics_writes += 1;
        self.forces.push((force, mode));
        match mode {
            ForceMode::VelocityChange => self.velocity += force,
            ForceMode::Acceleration => self.velocity += force * DT,
        }
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.physics_writes += 1;
        self.rotation = rotation;
    }
}

impl GroundProbe for TestHost {
    fn ground_ray(&self, origin: RayOrigin, max_distance: f32) -> Option<CollisionData> {
        let hit = match origin {
            RayOrigin::ColliderCenter => self.center_hit,
            RayOrigin::ColliderBottom => self.bottom_hit,
        }?;
        (hit.distance <= max_distance).then_some(hit)
    }

    fn ground_overlap(&self) -> bool {
        self.overlap
    }
}

impl CameraView for TestHost {
    fn is_first_person(&self) -> bool {
        self.first_person
    }

    fn camera_forward(&self) -> Vec3 {
        self.camera_forward
    }
}

impl AnimationDriver for TestHost {
    fn start_flag(&mut self, flag: AnimationFlag) {
        self.flags.insert(flag);
    }

    fn stop_flag(&mut self, flag: AnimationFlag) {
        self.flags.remove(&flag);
    }

    fn fire_trigger(&mut self, trigger: AnimationTrigger) {
        self.triggers.push(trigger);
    }
}

impl StatProvider for TestHost {
    fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    fn stamina(&self) -> f32 {
        self.stamina
    }

    fn set_stamina(&mut self, stamina: f32) {
        self.stamina = stamina;
    }

    fn apply_fall_damage(&mut self, damage: f32) {
        self.fall_damage += damage;
    }
}

impl DashNotifier for TestHost {
    fn notify_dash_ended(&mut self) {
        self.dash_notifications += 1;
    }
}

/// Player preset with the special weapon equipped.
pub fn armed_config() -> MovementConfig {
    MovementConfig::player().with_special_weapon(Some(SpecialWeaponConfig::default()))
}

/// Machine with every ability, already started in `Idle`.
pub fn started_machine(config: MovementConfig, host: &mut TestHost) -> LocomotionMachine {
    let abilities = if config.special_weapon.is_some() {
        LocomotionAbilities::all()
    } else {
        LocomotionAbilities::default()
    };
    let mut machine = LocomotionMachine::new(config, abilities).unwrap();
    machine.start(host, Role::standalone()).unwrap();
    machine
}

/// Run one tick as the standalone authority.
pub fn tick(machine: &mut LocomotionMachine, host: &mut TestHost, events: Vec<LocomotionEvent>) {
    machine
        .tick(host, Role::standalone(), events, DT)
        .unwrap();
}

/// Run `n` ticks without events.
pub fn run_ticks(machine: &mut LocomotionMachine, host: &mut TestHost, n: usize) {
    for _ in 0..n {
        tick(machine, host, Vec::new());
    }
}

pub fn input(event: InputEvent) -> Vec<LocomotionEvent> {
    vec![LocomotionEvent::Input(event)]
}
