//! State marker components.
//!
//! These components mirror the current state of a character's
//! [`LocomotionMachine`](crate::machine::LocomotionMachine) so that gameplay
//! systems can filter on them in queries. They are added and removed by
//! [`sync_state_markers`](crate::systems::sync_state_markers) and are never
//! read back by the machine.

use bevy::prelude::*;

use crate::machine::StateId;

/// Marker component indicating the character is in a grounded state.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use player_locomotion::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn count_grounded(q: Query<(), With<Grounded>>) -> usize {
///     q.iter().count()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is jumping or falling.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is stunned, frozen or shocked.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Debuffed;

/// Current state of the character's machine, `None` before it starts.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct LocomotionStatus {
    pub state: Option<StateId>,
}

impl LocomotionStatus {
    pub fn is(&self, id: StateId) -> bool {
        self.state == Some(id)
    }

    pub fn is_grounded(&self) -> bool {
        self.state.is_some_and(StateId::is_grounded)
    }

    pub fn is_airborne(&self) -> bool {
        self.state.is_some_and(StateId::is_airborne)
    }

    pub fn is_debuffed(&self) -> bool {
        self.state.is_some_and(StateId::is_debuff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_before_start_is_nothing() {
        let status = LocomotionStatus::default();
        assert!(!status.is_grounded());
        assert!(!status.is_airborne());
        assert!(!status.is_debuffed());
    }

    #[test]
    fn status_families() {
        let falling = LocomotionStatus {
            state: Some(StateId::Falling),
        };
        assert!(falling.is(StateId::Falling));
        assert!(falling.is_airborne());
        assert!(!falling.is_grounded());

        let frozen = LocomotionStatus {
            state: Some(StateId::Frozen),
        };
        assert!(frozen.is_debuffed());
    }

    #[test]
    fn dash_is_in_no_family() {
        let dashing = LocomotionStatus {
            state: Some(StateId::Dashing),
        };
        assert!(!dashing.is_grounded());
        assert!(!dashing.is_airborne());
        assert!(!dashing.is_debuffed());
    }
}
