//! Collision query results and contact descriptions.
//!
//! These structures carry the results of ground probes (rays) and physical
//! contacts between the character and the world.

use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Bitmask of collision layers.
///
/// Mirrors the membership/filter bits of the physics engine. A contact
/// qualifies for a filter when the two masks share at least one bit.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Mask containing only `layer` (0..32).
    pub const fn layer(layer: u32) -> Self {
        Self(1 << layer)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the two masks share any layer.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Angle in degrees between the surface normal and world up.
    ///
    /// This equals the incidence angle against a ray cast straight down.
    pub fn slope_angle_degrees(&self) -> f32 {
        let normal = self.normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            return 0.0;
        }
        normal.angle_between(Vec3::Y).to_degrees()
    }
}

/// A physical contact reported by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionContact {
    /// The other collider, if known.
    pub other: Option<Entity>,
    /// Collision layers the other collider belongs to.
    pub layers: LayerMask,
    /// Contact normal pointing away from the other collider.
    pub normal: Vec3,
}

impl CollisionContact {
    pub fn new(layers: LayerMask) -> Self {
        Self {
            other: None,
            layers,
            normal: Vec3::ZERO,
        }
    }

    pub fn with_other(mut self, other: Entity) -> Self {
        self.other = Some(other);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_data_fields() {
        let hit = CollisionData::new(0.9, Vec3::Y, Vec3::new(1.0, 0.0, 2.0), None);
        assert_eq!(hit.distance, 0.9);
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.point, Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn collision_data_with_entity() {
        let entity = Entity::from_raw(42);
        let hit = CollisionData::new(3.0, Vec3::Y, Vec3::ZERO, Some(entity));
        assert_eq!(hit.entity, Some(entity));
    }

    #[test]
    fn flat_ground_has_zero_slope() {
        let hit = CollisionData::new(1.0, Vec3::Y, Vec3::ZERO, None);
        assert!(hit.slope_angle_degrees().abs() < 1e-4);
    }

    #[test]
    fn tilted_normal_reports_slope_in_degrees() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let hit = CollisionData::new(1.0, normal, Vec3::ZERO, None);
        assert!((hit.slope_angle_degrees() - 45.0).abs() < 1e-3);
    }

    #[test]
    fn layer_masks_intersect_on_shared_bits() {
        let walls = LayerMask::layer(3);
        let props = LayerMask::layer(4);
        assert!(walls.intersects(walls.union(props)));
        assert!(!walls.intersects(props));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
    }
}
