use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Forward axis in an entity's local frame.
pub const FORWARD: Vec3 = Vec3::X;
/// Right axis in an entity's local frame.
pub const RIGHT: Vec3 = Vec3::NEG_Y;

/// Unique identifier for an entity in the world arena.
///
/// Ids are handed out monotonically and never reused, so an id that outlives
/// its entity simply fails every lookup instead of aliasing a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which physical controller a hand is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    /// +1 for the right hand, -1 for the left. Scales the lateral part of
    /// per-hand offsets.
    pub fn mirror(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity rotation and unit scale at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// World-space forward direction.
    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    /// Apply `local` as an offset expressed in this transform's frame.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale * local.position),
            rotation: self.rotation * local.rotation,
            scale: self.scale * local.scale,
        }
    }

    /// Express a world-space point in this transform's local frame.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        (self.rotation.inverse() * (point - self.position)) / self.scale
    }

    pub fn distance(&self, other: &Transform) -> f32 {
        self.position.distance(other.position)
    }
}

/// Float comparison with an absolute tolerance.
pub fn almost_eq(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

/// Frame-rate independent smoothing factor: `1 - e^(-rate * dt)`.
///
/// Feeding this into a lerp converges exponentially toward the target, so
/// uneven frame times never produce a visible jump.
pub fn exp_smoothing(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_ordering() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn compose_applies_rotation_to_offset() {
        let parent = Transform::from_position_rotation(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let child = parent.compose(&Transform::from_position(Vec3::X));
        assert!(child.position.distance(Vec3::new(1.0, 1.0, 0.0)) < 1e-5);
    }

    #[test]
    fn inverse_transform_point_round_trips() {
        let t = Transform::from_position_rotation(
            Vec3::new(3.0, -2.0, 1.0),
            Quat::from_rotation_y(0.7),
        );
        let local = Vec3::new(0.5, 0.25, -1.0);
        let world = t.compose(&Transform::from_position(local)).position;
        assert!(t.inverse_transform_point(world).distance(local) < 1e-5);
    }

    #[test]
    fn exp_smoothing_matches_closed_form() {
        let f = exp_smoothing(10.0, 1.0 / 60.0);
        assert!((f - (1.0 - (-10.0f32 / 60.0).exp())).abs() < 1e-7);
        assert_eq!(exp_smoothing(10.0, 0.0), 0.0);
    }

    #[test]
    fn almost_eq_uses_tolerance() {
        assert!(almost_eq(0.99995, 1.0, 1e-4));
        assert!(!almost_eq(0.99, 1.0, 1e-4));
    }

    #[test]
    fn mirror_flips_left() {
        assert_eq!(HandSide::Left.mirror(), -1.0);
        assert_eq!(HandSide::Right.mirror(), 1.0);
    }
}
