//! The plugin wired into a headless bevy app with an in-memory backend.

use bevy::prelude::*;
use player_locomotion::prelude::*;

/// Rigid body state owned by the test backend.
#[derive(Component, Default)]
struct Body {
    velocity: Vec3,
}

/// Backend that integrates nothing: it only records what the machine asks for.
struct TestBackend;

impl LocomotionBackend for TestBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Body>(entity)
            .map(|b| b.velocity)
            .unwrap_or_default()
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<Body>(entity) {
            body.velocity = velocity;
        }
    }

    fn get_angular_velocity(_world: &World, _entity: Entity) -> Vec3 {
        Vec3::ZERO
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3, mode: ForceMode) {
        let dt = Self::get_fixed_timestep(world);
        if let Some(mut body) = world.get_mut::<Body>(entity) {
            match mode {
                ForceMode::VelocityChange => body.velocity += force,
                ForceMode::Acceleration => body.velocity += force * dt,
            }
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or_default()
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .unwrap_or_default()
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = rotation;
        }
    }
}

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(LocomotionPlugin::<TestBackend>::default());
    app.finish();
    app.cleanup();
    app
}

fn on_ground() -> GroundSensors {
    let center_height = MovementConfig::player().capsule.center_height;
    GroundSensors {
        center: Some(CollisionData::new(center_height, Vec3::Y, Vec3::ZERO, None)),
        bottom: Some(CollisionData::new(0.0, Vec3::Y, Vec3::ZERO, None)),
        overlap: true,
    }
}

fn spawn_character(app: &mut App, config: MovementConfig, abilities: LocomotionAbilities) -> Entity {
    app.world_mut()
        .spawn((
            config,
            abilities,
            LocomotionInput::default(),
            LocomotionStats::default(),
            LocomotionAnimation::default(),
            LocomotionCamera::default(),
            on_ground(),
            Body::default(),
            Transform::from_xyz(0.0, 0.9, 0.0),
        ))
        .id()
}

fn step(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn status(app: &App, entity: Entity) -> Option<StateId> {
    app.world().get::<LocomotionStatus>(entity).and_then(|s| s.state)
}

#[test]
fn machine_is_built_and_started() {
    let mut app = test_app();
    let entity = spawn_character(&mut app, MovementConfig::player(), LocomotionAbilities::default());

    step(&mut app);

    let world = app.world();
    assert!(world.get::<LocomotionMachine>(entity).is_some());
    assert_eq!(status(&app, entity), Some(StateId::Idle));
    assert!(world.get::<Grounded>(entity).is_some());
    assert!(world.get::<Airborne>(entity).is_none());

    let animation = world.get::<LocomotionAnimation>(entity).unwrap();
    assert!(animation.is_set(AnimationFlag::Idle));
    assert!(animation.is_set(AnimationFlag::Grounded));
}

#[test]
fn invalid_config_parks_the_character() {
    let mut app = test_app();
    let entity = spawn_character(
        &mut app,
        MovementConfig::player().without_sprint(),
        LocomotionAbilities::default(),
    );

    step(&mut app);
    step(&mut app);

    let world = app.world();
    assert!(world.get::<LocomotionMachine>(entity).is_none());
    let fault = world.get::<LocomotionFault>(entity).unwrap();
    assert!(matches!(fault.0, LocomotionError::MissingConfig { .. }));
}

#[test]
fn movement_input_runs_the_body() {
    let mut app = test_app();
    let entity = spawn_character(&mut app, MovementConfig::player(), LocomotionAbilities::default());
    step(&mut app);

    app.world_mut()
        .get_mut::<LocomotionInput>(entity)
        .unwrap()
        .set_movement(Vec2::Y);
    step(&mut app);

    assert_eq!(status(&app, entity), Some(StateId::Running));
    let body = app.world().get::<Body>(entity).unwrap();
    assert!((body.velocity.z + 5.0).abs() < 1e-4);
    assert!(app.world().get::<Grounded>(entity).is_some());

    let input = app.world().get::<LocomotionInput>(entity).unwrap();
    assert!(input.is_empty());
}

#[test]
fn debuff_event_interrupts_and_marks() {
    let mut app = test_app();
    let entity = spawn_character(&mut app, MovementConfig::player(), LocomotionAbilities::default());
    step(&mut app);

    app.world_mut().send_event(ApplyDebuff {
        entity,
        kind: DebuffKind::Frozen,
    });
    step(&mut app);

    assert_eq!(status(&app, entity), Some(StateId::Frozen));
    assert!(app.world().get::<Debuffed>(entity).is_some());
    assert!(app.world().get::<Grounded>(entity).is_none());
}

#[test]
fn losing_the_ground_marks_airborne() {
    let mut app = test_app();
    let entity = spawn_character(&mut app, MovementConfig::player(), LocomotionAbilities::default());
    step(&mut app);

    app.world_mut()
        .get_mut::<GroundSensors>(entity)
        .unwrap()
        .reset();
    step(&mut app);

    assert_eq!(status(&app, entity), Some(StateId::Falling));
    assert!(app.world().get::<Airborne>(entity).is_some());
    assert!(app.world().get::<Grounded>(entity).is_none());
}

#[test]
fn observer_role_leaves_the_body_alone() {
    let mut app = test_app();
    let entity = spawn_character(&mut app, MovementConfig::player(), LocomotionAbilities::default());
    app.world_mut()
        .entity_mut(entity)
        .insert(NetworkRole(Role::observer()));
    step(&mut app);

    app.world_mut()
        .get_mut::<LocomotionInput>(entity)
        .unwrap()
        .set_movement(Vec2::Y);
    step(&mut app);

    assert_eq!(status(&app, entity), Some(StateId::Running));
    let body = app.world().get::<Body>(entity).unwrap();
    assert_eq!(body.velocity, Vec3::ZERO);
}

#[test]
fn truncated_special_dash_is_announced() {
    let mut app = test_app();
    let config = MovementConfig::player().with_special_weapon(Some(SpecialWeaponConfig::default()));
    let entity = spawn_character(&mut app, config, LocomotionAbilities::all());
    step(&mut app);

    app.world_mut()
        .get_mut::<LocomotionInput>(entity)
        .unwrap()
        .press(InputEvent::SpecialDashPressed);
    step(&mut app);
    assert_eq!(status(&app, entity), Some(StateId::Dashing));

    app.world_mut()
        .get_mut::<LocomotionInput>(entity)
        .unwrap()
        .push(CollisionContact::new(LayerMask::ALL));
    step(&mut app);

    assert_eq!(status(&app, entity), Some(StateId::LightStopping));
    let ended: Vec<_> = app
        .world()
        .resource::<Events<DashEnded>>()
        .iter_current_update_events()
        .copied()
        .collect();
    assert_eq!(ended, vec![DashEnded { entity }]);

    let animation = app.world().get::<LocomotionAnimation>(entity).unwrap();
    assert_eq!(animation.triggers(), &[AnimationTrigger::DashEnded]);
}

#[test]
fn ticking_keeps_the_machine_in_place() {
    let mut app = test_app();
    let entity = spawn_character(&mut app, MovementConfig::player(), LocomotionAbilities::default());
    step(&mut app);
    let archetype = app.world().entity(entity).archetype().id();

    for _ in 0..5 {
        step(&mut app);
    }

    let world = app.world();
    assert_eq!(world.removed::<LocomotionMachine>().count(), 0);
    assert_eq!(world.entity(entity).archetype().id(), archetype);
    let machine = world.get::<LocomotionMachine>(entity).unwrap();
    assert_eq!(machine.current(), Some(StateId::Idle));
    assert!(machine.clock() > 0.0);
}
