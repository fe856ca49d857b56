//! Structural failures of the locomotion state machine.
//!
//! Only integrity violations live here. Per-tick physics outcomes such as a
//! ray finding no ground are ordinary branches and never produce an error.

use thiserror::Error;

use crate::machine::StateId;

/// Fatal errors raised while building or driving a [`LocomotionMachine`].
///
/// [`LocomotionMachine`]: crate::machine::LocomotionMachine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocomotionError {
    /// A state the character is allowed to enter has no configuration.
    #[error("state {state:?} requires the `{section}` configuration section")]
    MissingConfig {
        /// The state that cannot be built.
        state: StateId,
        /// Path of the missing configuration section.
        section: &'static str,
    },

    /// A configuration value is outside its valid range.
    #[error("invalid configuration value `{field}`: {reason}")]
    InvalidConfig {
        /// Path of the offending field.
        field: &'static str,
        /// Human readable description of the violated constraint.
        reason: String,
    },

    /// A transition targeted a state that was never registered for this character.
    #[error("unknown state identifier {0:?}")]
    UnknownState(StateId),
}

impl LocomotionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = LocomotionError::MissingConfig {
            state: StateId::Sprinting,
            section: "grounded.sprint",
        };
        assert_eq!(
            err.to_string(),
            "state Sprinting requires the `grounded.sprint` configuration section"
        );

        let err = LocomotionError::UnknownState(StateId::Dashing);
        assert_eq!(err.to_string(), "unknown state identifier Dashing");
    }
}
