//! Piecewise-linear response curves.
//!
//! Curves map an authored input (usually a slope angle in degrees) to a
//! multiplier. They replace the keyframed animation curves a designer would
//! normally author in an editor.

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::error::LocomotionError;

/// A single `(time, value)` sample of a [`SpeedCurve`].
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear curve, clamped to its first and last keys.
///
/// # Example
///
/// ```rust
/// use player_locomotion::curve::SpeedCurve;
///
/// // Full speed on flat ground, no traction past 60 degrees.
/// let curve = SpeedCurve::from_points(&[(0.0, 1.0), (45.0, 0.5), (60.0, 0.0)]);
/// assert_eq!(curve.evaluate(0.0), 1.0);
/// assert_eq!(curve.evaluate(90.0), 0.0);
/// ```
#[derive(Reflect, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SpeedCurve {
    keys: Vec<Keyframe>,
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self::constant(1.0)
    }
}

impl SpeedCurve {
    /// Build a curve from keyframes. Keys must be sorted by time.
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    /// Build a curve from `(time, value)` pairs.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        Self::new(points.iter().map(|&(t, v)| Keyframe::new(t, v)).collect())
    }

    /// A curve that returns `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Sample the curve at `time`.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if time <= b.time {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    return b.value;
                }
                let t = (time - a.time) / span;
                return a.value + (b.value - a.value) * t;
            }
        }

        last.value
    }

    /// Reject empty curves and keys out of order.
    pub fn validate(&self, field: &'static str) -> Result<(), LocomotionError> {
        if self.keys.is_empty() {
            return Err(LocomotionError::invalid(field, "curve has no keyframes"));
        }
        if self
            .keys
            .iter()
            .any(|k| !k.time.is_finite() || !k.value.is_finite())
        {
            return Err(LocomotionError::invalid(field, "curve has non-finite keys"));
        }
        if self.keys.windows(2).any(|w| w[1].time < w[0].time) {
            return Err(LocomotionError::invalid(field, "curve keys are not sorted"));
        }
        Ok(())
    }
}
