//! Movement configuration components.
//!
//! This module defines the immutable per-archetype tunables consumed by the
//! locomotion states: speed modifiers, forces, curves and durations, grouped
//! by state family (grounded, airborne, debuff, special weapon).
//!
//! A [`MovementConfig`] is validated once when a
//! [`LocomotionMachine`](crate::machine::LocomotionMachine) is built and is
//! shared read-only between all states of that character afterwards.

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::collision::LayerMask;
use crate::curve::SpeedCurve;
use crate::error::LocomotionError;
use crate::machine::StateId;

/// Declares which optional states a character is allowed to enter.
///
/// Optional states are only registered in the state arena when the matching
/// ability is enabled, and only then is their configuration required.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LocomotionAbilities {
    /// Registers `Sprinting` and `SprintStarting`.
    pub can_sprint: bool,
    /// Registers the special-weapon `Dashing` state.
    pub can_use_special_weapon: bool,
}

impl Default for LocomotionAbilities {
    fn default() -> Self {
        Self {
            can_sprint: true,
            can_use_special_weapon: false,
        }
    }
}

impl LocomotionAbilities {
    /// Every optional state enabled.
    pub fn all() -> Self {
        Self {
            can_sprint: true,
            can_use_special_weapon: true,
        }
    }

    /// Only the mandatory states.
    pub fn none() -> Self {
        Self {
            can_sprint: false,
            can_use_special_weapon: false,
        }
    }
}

// ==================== Grounded ====================

/// Floating-capsule tuning: how far to look for ground and how hard to snap.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FloatingCapsuleConfig {
    /// Length of the ray cast down from the collider center.
    pub float_ray_distance: f32,
    /// Gain applied to the height shortfall when computing lift.
    pub step_reach_force: f32,
}

impl Default for FloatingCapsuleConfig {
    fn default() -> Self {
        Self {
            float_ray_distance: 2.0,
            step_reach_force: 25.0,
        }
    }
}

/// Damped rotation reach time, per axis, in seconds.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RotationConfig {
    pub target_rotation_reach_time: Vec3,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            target_rotation_reach_time: Vec3::new(0.0, 0.14, 0.0),
        }
    }
}

impl RotationConfig {
    pub fn yaw(seconds: f32) -> Self {
        Self {
            target_rotation_reach_time: Vec3::new(0.0, seconds, 0.0),
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct WalkConfig {
    pub speed_modifier: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            speed_modifier: 0.225,
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RunConfig {
    pub speed_modifier: f32,
    /// Seconds spent running before the walk toggle takes over.
    pub run_to_walk_time: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            speed_modifier: 1.0,
            run_to_walk_time: 0.5,
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SprintConfig {
    pub speed_modifier: f32,
    /// Seconds a sprint lasts without a sprint-continue input.
    pub sprint_to_run_time: f32,
    /// Stamina removed per second while sprinting.
    pub stamina_drain_per_second: f32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            speed_modifier: 1.7,
            sprint_to_run_time: 1.0,
            stamina_drain_per_second: 10.0,
        }
    }
}

/// The sprint-start burst and its rate limit.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SprintStartConfig {
    pub speed_modifier: f32,
    /// Window after a dash start in which the next one counts as consecutive.
    pub time_to_be_considered_consecutive: f32,
    /// Consecutive dashes allowed before the dash input is disabled.
    pub consecutive_dashes_limit: u32,
    /// How long the dash input stays disabled once the limit is hit.
    pub dash_limit_reached_cooldown: f32,
    pub stamina_cost: f32,
    pub rotation: RotationConfig,
}

impl Default for SprintStartConfig {
    fn default() -> Self {
        Self {
            speed_modifier: 2.0,
            time_to_be_considered_consecutive: 1.0,
            consecutive_dashes_limit: 2,
            dash_limit_reached_cooldown: 1.75,
            stamina_cost: 20.0,
            rotation: RotationConfig::yaw(0.02),
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StopConfig {
    pub light_deceleration_force: f32,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            light_deceleration_force: 5.0,
        }
    }
}

/// Configuration shared by the grounded state family.
#[derive(Reflect, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GroundedConfig {
    /// Slope angle (degrees) to speed multiplier.
    pub slope_speed_angles: SpeedCurve,
    pub floating: FloatingCapsuleConfig,
    /// Length of the bottom ray used by the fall check.
    pub ground_to_fall_ray_distance: f32,
    pub base_rotation: RotationConfig,
    pub walk: WalkConfig,
    pub run: RunConfig,
    pub sprint: Option<SprintConfig>,
    pub sprint_start: Option<SprintStartConfig>,
    pub stop: StopConfig,
    /// Layers considered ground by probes.
    pub ground_layers: LayerMask,
}

impl Default for GroundedConfig {
    fn default() -> Self {
        Self {
            slope_speed_angles: SpeedCurve::from_points(&[(0.0, 1.0), (40.0, 0.85), (60.0, 0.0)]),
            floating: FloatingCapsuleConfig::default(),
            ground_to_fall_ray_distance: 1.0,
            base_rotation: RotationConfig::default(),
            walk: WalkConfig::default(),
            run: RunConfig::default(),
            sprint: Some(SprintConfig::default()),
            sprint_start: Some(SprintStartConfig::default()),
            stop: StopConfig::default(),
            ground_layers: LayerMask::ALL,
        }
    }
}

// ==================== Airborne ====================

/// Jump force profiles and slope shaping.
///
/// The four force profiles are picked by the grounded state the jump starts
/// from and grow with the locomotion speed tier.
#[derive(Reflect, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct JumpConfig {
    pub stationary_force: Vec3,
    pub weak_force: Vec3,
    pub medium_force: Vec3,
    pub strong_force: Vec3,
    /// Length of the center ray used to find the slope under a jump.
    pub jump_to_ground_ray_distance: f32,
    /// Horizontal force multiplier when jumping up a slope.
    pub jump_force_modifier_on_slope_upwards: SpeedCurve,
    /// Vertical force multiplier when jumping down a slope.
    pub jump_force_modifier_on_slope_downwards: SpeedCurve,
    /// Vertical deceleration applied while rising.
    pub deceleration_force: f32,
    pub rotation: RotationConfig,
    /// Grants one mid-air jump on leaving the ground.
    pub allow_air_jump: bool,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            stationary_force: Vec3::new(0.0, 5.0, 0.0),
            weak_force: Vec3::new(1.0, 5.0, 1.0),
            medium_force: Vec3::new(3.5, 5.0, 3.5),
            strong_force: Vec3::new(5.0, 5.0, 5.0),
            jump_to_ground_ray_distance: 2.0,
            jump_force_modifier_on_slope_upwards: SpeedCurve::from_points(&[
                (0.0, 1.0),
                (45.0, 0.5),
                (60.0, 0.0),
            ]),
            jump_force_modifier_on_slope_downwards: SpeedCurve::from_points(&[
                (0.0, 1.0),
                (45.0, 0.6),
            ]),
            deceleration_force: 1.5,
            rotation: RotationConfig::yaw(1.0),
            allow_air_jump: false,
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FallConfig {
    /// Maximum downward speed.
    pub fall_speed_limit: f32,
    /// Fallen distance past which a landing counts as hard.
    pub minimum_distance_to_be_considered_hard_fall: f32,
    /// Damage per unit of distance fallen beyond the hard-fall threshold.
    pub fall_damage_modifier: f32,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            fall_speed_limit: 15.0,
            minimum_distance_to_be_considered_hard_fall: 3.0,
            fall_damage_modifier: 5.0,
        }
    }
}

#[derive(Reflect, Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct AirborneConfig {
    pub jump: JumpConfig,
    pub fall: FallConfig,
}

// ==================== Debuffs ====================

/// One timed debuff: the speed it allows and how long it lasts.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DebuffSettings {
    pub speed_modifier: f32,
    pub duration: f32,
}

impl DebuffSettings {
    pub const fn new(speed_modifier: f32, duration: f32) -> Self {
        Self {
            speed_modifier,
            duration,
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DebuffConfig {
    pub stunned: DebuffSettings,
    pub frozen: DebuffSettings,
    pub shocked: DebuffSettings,
}

impl Default for DebuffConfig {
    fn default() -> Self {
        Self {
            stunned: DebuffSettings::new(0.0, 1.5),
            frozen: DebuffSettings::new(0.0, 3.0),
            shocked: DebuffSettings::new(0.2, 2.0),
        }
    }
}

// ==================== Special Weapon ====================

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DashConfig {
    pub speed_modifier: f32,
    /// Lower bound on the dash speed regardless of the speed stat.
    pub min_dash_speed: f32,
    /// Duration of the dash in seconds.
    pub time_to_complete_dash: f32,
    /// Ramp rate for hosts that ease their dash effects in.
    ///
    /// Not read by the machine: the dash assigns its full velocity every step.
    pub acceleration: f32,
    /// Contacts on these layers end the dash early.
    pub collision_layers: LayerMask,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            speed_modifier: 3.0,
            min_dash_speed: 12.0,
            time_to_complete_dash: 0.35,
            acceleration: 50.0,
            collision_layers: LayerMask::ALL,
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SpecialWeaponConfig {
    pub floating_capsule: FloatingCapsuleConfig,
    pub dash: DashConfig,
}

// ==================== Body ====================

/// Capsule collider dimensions.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CapsuleConfig {
    pub height: f32,
    pub radius: f32,
    /// Height of the collider center above the ground when at rest.
    ///
    /// The floating capsule snaps the center ray's hit distance to this value.
    pub center_height: f32,
}

impl Default for CapsuleConfig {
    fn default() -> Self {
        Self {
            height: 1.8,
            radius: 0.3,
            center_height: 0.9,
        }
    }
}

impl CapsuleConfig {
    /// Distance from the collider center to its bottom.
    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }
}

/// Box overlap used to confirm ground contact, relative to the body origin.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GroundCheckConfig {
    pub center_offset: Vec3,
    pub half_extents: Vec3,
}

impl Default for GroundCheckConfig {
    fn default() -> Self {
        Self {
            center_offset: Vec3::new(0.0, -0.9, 0.0),
            half_extents: Vec3::new(0.25, 0.05, 0.25),
        }
    }
}

// ==================== MovementConfig ====================

/// Complete locomotion configuration for one character archetype.
///
/// # Example
///
/// ```rust
/// use player_locomotion::prelude::*;
///
/// let config = MovementConfig::player().with_air_jump(true);
/// assert!(config.validate(&LocomotionAbilities::default()).is_ok());
///
/// let grounded_only = MovementConfig::player().without_sprint();
/// assert!(grounded_only.validate(&LocomotionAbilities::none()).is_ok());
/// assert!(grounded_only.validate(&LocomotionAbilities::default()).is_err());
/// ```
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct MovementConfig {
    pub grounded: GroundedConfig,
    pub airborne: AirborneConfig,
    pub debuff: DebuffConfig,
    pub special_weapon: Option<SpecialWeaponConfig>,
    pub capsule: CapsuleConfig,
    pub ground_check: GroundCheckConfig,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self::player()
    }
}

impl MovementConfig {
    /// Preset for a player character with every section filled.
    pub fn player() -> Self {
        Self {
            grounded: GroundedConfig::default(),
            airborne: AirborneConfig::default(),
            debuff: DebuffConfig::default(),
            special_weapon: Some(SpecialWeaponConfig::default()),
            capsule: CapsuleConfig::default(),
            ground_check: GroundCheckConfig::default(),
        }
    }

    /// Remove sprint and sprint-start data.
    pub fn without_sprint(mut self) -> Self {
        self.grounded.sprint = None;
        self.grounded.sprint_start = None;
        self
    }

    /// Builder: set the sprint section.
    pub fn with_sprint(mut self, sprint: SprintConfig) -> Self {
        self.grounded.sprint = Some(sprint);
        self
    }

    /// Builder: set the sprint-start section.
    pub fn with_sprint_start(mut self, sprint_start: SprintStartConfig) -> Self {
        self.grounded.sprint_start = Some(sprint_start);
        self
    }

    /// Builder: set or clear the special-weapon section.
    pub fn with_special_weapon(mut self, special_weapon: Option<SpecialWeaponConfig>) -> Self {
        self.special_weapon = special_weapon;
        self
    }

    /// Builder: set the floating capsule used by grounded and debuff states.
    pub fn with_floating(mut self, floating: FloatingCapsuleConfig) -> Self {
        self.grounded.floating = floating;
        self
    }

    /// Builder: set the slope speed curve.
    pub fn with_slope_curve(mut self, curve: SpeedCurve) -> Self {
        self.grounded.slope_speed_angles = curve;
        self
    }

    /// Builder: set the fall section.
    pub fn with_fall(mut self, fall: FallConfig) -> Self {
        self.airborne.fall = fall;
        self
    }

    /// Builder: set the debuff section.
    pub fn with_debuffs(mut self, debuff: DebuffConfig) -> Self {
        self.debuff = debuff;
        self
    }

    /// Builder: allow one mid-air jump.
    pub fn with_air_jump(mut self, allow: bool) -> Self {
        self.airborne.jump.allow_air_jump = allow;
        self
    }

    /// Builder: set the capsule dimensions.
    pub fn with_capsule(mut self, capsule: CapsuleConfig) -> Self {
        self.capsule = capsule;
        self
    }

    /// Builder: set the ground layers.
    pub fn with_ground_layers(mut self, layers: LayerMask) -> Self {
        self.grounded.ground_layers = layers;
        self
    }

    /// Sprint data. Only `None` when sprinting is disabled.
    pub fn sprint(&self) -> Option<&SprintConfig> {
        self.grounded.sprint.as_ref()
    }

    pub fn sprint_start(&self) -> Option<&SprintStartConfig> {
        self.grounded.sprint_start.as_ref()
    }

    pub fn dash(&self) -> Option<&DashConfig> {
        self.special_weapon.as_ref().map(|s| &s.dash)
    }

    /// Check that every section the abilities need exists and that values are in range.
    pub fn validate(&self, abilities: &LocomotionAbilities) -> Result<(), LocomotionError> {
        let grounded = &self.grounded;

        if abilities.can_sprint {
            let sprint = grounded.sprint.as_ref().ok_or(LocomotionError::MissingConfig {
                state: StateId::Sprinting,
                section: "grounded.sprint",
            })?;
            let start = grounded
                .sprint_start
                .as_ref()
                .ok_or(LocomotionError::MissingConfig {
                    state: StateId::SprintStarting,
                    section: "grounded.sprint_start",
                })?;

            non_negative("grounded.sprint.speed_modifier", sprint.speed_modifier)?;
            non_negative("grounded.sprint.sprint_to_run_time", sprint.sprint_to_run_time)?;
            non_negative(
                "grounded.sprint.stamina_drain_per_second",
                sprint.stamina_drain_per_second,
            )?;

            non_negative("grounded.sprint_start.speed_modifier", start.speed_modifier)?;
            non_negative(
                "grounded.sprint_start.time_to_be_considered_consecutive",
                start.time_to_be_considered_consecutive,
            )?;
            non_negative(
                "grounded.sprint_start.dash_limit_reached_cooldown",
                start.dash_limit_reached_cooldown,
            )?;
            non_negative("grounded.sprint_start.stamina_cost", start.stamina_cost)?;
            rotation("grounded.sprint_start.rotation", &start.rotation)?;
            if start.consecutive_dashes_limit == 0 {
                return Err(LocomotionError::invalid(
                    "grounded.sprint_start.consecutive_dashes_limit",
                    "must allow at least one dash",
                ));
            }
        }

        if abilities.can_use_special_weapon {
            let special = self
                .special_weapon
                .as_ref()
                .ok_or(LocomotionError::MissingConfig {
                    state: StateId::Dashing,
                    section: "special_weapon",
                })?;
            floating("special_weapon.floating_capsule", &special.floating_capsule)?;
            non_negative("special_weapon.dash.speed_modifier", special.dash.speed_modifier)?;
            non_negative("special_weapon.dash.min_dash_speed", special.dash.min_dash_speed)?;
            non_negative(
                "special_weapon.dash.time_to_complete_dash",
                special.dash.time_to_complete_dash,
            )?;
            non_negative("special_weapon.dash.acceleration", special.dash.acceleration)?;
        }

        grounded.slope_speed_angles.validate("grounded.slope_speed_angles")?;
        floating("grounded.floating", &grounded.floating)?;
        non_negative(
            "grounded.ground_to_fall_ray_distance",
            grounded.ground_to_fall_ray_distance,
        )?;
        rotation("grounded.base_rotation", &grounded.base_rotation)?;
        non_negative("grounded.walk.speed_modifier", grounded.walk.speed_modifier)?;
        non_negative("grounded.run.speed_modifier", grounded.run.speed_modifier)?;
        non_negative("grounded.run.run_to_walk_time", grounded.run.run_to_walk_time)?;
        non_negative(
            "grounded.stop.light_deceleration_force",
            grounded.stop.light_deceleration_force,
        )?;

        let jump = &self.airborne.jump;
        for (field, force) in [
            ("airborne.jump.stationary_force", jump.stationary_force),
            ("airborne.jump.weak_force", jump.weak_force),
            ("airborne.jump.medium_force", jump.medium_force),
            ("airborne.jump.strong_force", jump.strong_force),
        ] {
            if !force.is_finite() || force.min_element() < 0.0 {
                return Err(LocomotionError::invalid(
                    field,
                    format!("force components must be finite and non-negative, got {force}"),
                ));
            }
        }
        non_negative(
            "airborne.jump.jump_to_ground_ray_distance",
            jump.jump_to_ground_ray_distance,
        )?;
        jump.jump_force_modifier_on_slope_upwards
            .validate("airborne.jump.jump_force_modifier_on_slope_upwards")?;
        jump.jump_force_modifier_on_slope_downwards
            .validate("airborne.jump.jump_force_modifier_on_slope_downwards")?;
        non_negative("airborne.jump.deceleration_force", jump.deceleration_force)?;
        rotation("airborne.jump.rotation", &jump.rotation)?;

        let fall = &self.airborne.fall;
        non_negative("airborne.fall.fall_speed_limit", fall.fall_speed_limit)?;
        non_negative(
            "airborne.fall.minimum_distance_to_be_considered_hard_fall",
            fall.minimum_distance_to_be_considered_hard_fall,
        )?;
        non_negative("airborne.fall.fall_damage_modifier", fall.fall_damage_modifier)?;

        for (field, settings) in [
            ("debuff.stunned", self.debuff.stunned),
            ("debuff.frozen", self.debuff.frozen),
            ("debuff.shocked", self.debuff.shocked),
        ] {
            non_negative(field, settings.speed_modifier)?;
            non_negative(field, settings.duration)?;
        }

        if self.capsule.center_height <= 0.0 || !self.capsule.center_height.is_finite() {
            return Err(LocomotionError::invalid(
                "capsule.center_height",
                "must be positive",
            ));
        }
        non_negative("capsule.height", self.capsule.height)?;
        non_negative("capsule.radius", self.capsule.radius)?;

        if !self.ground_check.half_extents.is_finite()
            || self.ground_check.half_extents.min_element() <= 0.0
        {
            return Err(LocomotionError::invalid(
                "ground_check.half_extents",
                "every extent must be positive",
            ));
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), LocomotionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LocomotionError::invalid(
            field,
            format!("expected a finite value >= 0, got {value}"),
        ))
    }
}

fn floating(field: &'static str, floating: &FloatingCapsuleConfig) -> Result<(), LocomotionError> {
    non_negative(field, floating.float_ray_distance)?;
    non_negative(field, floating.step_reach_force)
}

fn rotation(field: &'static str, rotation: &RotationConfig) -> Result<(), LocomotionError> {
    let time = rotation.target_rotation_reach_time;
    if time.is_finite() && time.min_element() >= 0.0 {
        Ok(())
    } else {
        Err(LocomotionError::invalid(
            field,
            "reach times must be finite and non-negative",
        ))
    }
}
