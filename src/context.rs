//! The reusable movement context shared by every state of one character.
//!
//! Whichever state is current reads and writes this blackboard. It is owned
//! by the [`LocomotionMachine`](crate::machine::LocomotionMachine) and handed
//! to state hooks explicitly, never through globals.

use bevy::prelude::*;

/// Special-weapon skill currently affecting the character.
///
/// Only one skill can be active at a time. The owning state is the single
/// writer within a tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialSkillState {
    #[default]
    None,
    /// A special-weapon dash is in progress.
    IsDashing,
    /// An external grapple effect is pulling the character.
    IsBeingPulled,
}

/// Shared mutable state read and written by the active movement state.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct MovementContext {
    // === Input ===
    /// Latest analog movement input.
    pub movement_input: Vec2,

    // === Speed Shaping ===
    /// Multiplier applied to the character's speed stat.
    pub movement_speed_modifier: f32,
    /// Multiplier sampled from the slope curve by the floating capsule.
    pub movement_on_slope_speed_modifier: f32,
    /// Horizontal or vertical deceleration applied by stopping and jumping states.
    pub movement_deceleration_force: f32,

    // === Skills and Debuffs ===
    pub special_skill_state: SpecialSkillState,
    pub is_dashing: bool,
    pub is_frozen: bool,
    pub is_stunned: bool,
    pub is_shocked: bool,

    // === Locomotion Intent ===
    /// Walk toggle. Flipped by the walk-toggle input.
    pub should_walk: bool,
    /// Carries a sprint across a sprint-start or airborne interruption.
    pub should_sprint: bool,
    /// Whether one mid-air jump is still available.
    pub can_jump_on_air: bool,
    /// Set once a fall exceeds the hard-fall threshold. Cleared when a new fall starts.
    pub is_hard_falling: bool,

    // === Rotation (per-axis, radians) ===
    pub current_target_rotation: Vec3,
    pub time_to_reach_target_rotation: Vec3,
    pub damped_rotation_velocity: Vec3,
    pub damped_rotation_elapsed: Vec3,

    // === Jump ===
    /// Force profile chosen by the last grounded state.
    pub current_jump_force: Vec3,
}

impl Default for MovementContext {
    fn default() -> Self {
        Self {
            movement_input: Vec2::ZERO,
            movement_speed_modifier: 1.0,
            movement_on_slope_speed_modifier: 1.0,
            movement_deceleration_force: 0.0,
            special_skill_state: SpecialSkillState::None,
            is_dashing: false,
            is_frozen: false,
            is_stunned: false,
            is_shocked: false,
            should_walk: false,
            should_sprint: false,
            can_jump_on_air: false,
            is_hard_falling: false,
            current_target_rotation: Vec3::ZERO,
            time_to_reach_target_rotation: Vec3::splat(0.14),
            damped_rotation_velocity: Vec3::ZERO,
            damped_rotation_elapsed: Vec3::ZERO,
            current_jump_force: Vec3::ZERO,
        }
    }
}

impl MovementContext {
    /// Create a context whose rotation reach time comes from configuration.
    pub fn new(time_to_reach_target_rotation: Vec3) -> Self {
        Self {
            time_to_reach_target_rotation,
            ..default()
        }
    }

    /// Whether there is any movement input this tick.
    #[inline]
    pub fn has_movement_input(&self) -> bool {
        self.movement_input != Vec2::ZERO
    }

    /// Number of exclusive status flags currently raised.
    ///
    /// The states owning these flags are mutually exclusive, so this never
    /// exceeds one.
    pub fn exclusive_flag_count(&self) -> usize {
        [self.is_frozen, self.is_stunned, self.is_shocked, self.is_dashing]
            .into_iter()
            .filter(|flag| *flag)
            .count()
    }

    /// Whether any debuff currently restricts the character.
    pub fn is_debuffed(&self) -> bool {
        self.is_frozen || self.is_stunned || self.is_shocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_neutral() {
        let ctx = MovementContext::default();
        assert!(!ctx.has_movement_input());
        assert_eq!(ctx.movement_speed_modifier, 1.0);
        assert_eq!(ctx.special_skill_state, SpecialSkillState::None);
        assert_eq!(ctx.exclusive_flag_count(), 0);
        assert!(!ctx.is_debuffed());
    }

    #[test]
    fn new_uses_given_reach_time() {
        let ctx = MovementContext::new(Vec3::new(0.0, 0.3, 0.0));
        assert_eq!(ctx.time_to_reach_target_rotation.y, 0.3);
    }

    #[test]
    fn counts_exclusive_flags() {
        let mut ctx = MovementContext::default();
        ctx.is_stunned = true;
        assert_eq!(ctx.exclusive_flag_count(), 1);
        assert!(ctx.is_debuffed());

        ctx.is_stunned = false;
        ctx.is_dashing = true;
        assert_eq!(ctx.exclusive_flag_count(), 1);
        assert!(!ctx.is_debuffed());
    }
}
