//! Spatial queries consumed by the hands.
//!
//! The engine only needs ray casts from whatever physics provider hosts it.
//! [`SphereCaster`] answers them from the world's own sphere colliders, which
//! is enough for tests and headless runs.

use glam::Vec3;
use handworks_common::EntityId;
use serde::{Deserialize, Serialize};

use crate::world::World;

/// Sphere collider centred on its entity's world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    /// Trigger volumes report overlaps but do not block rays.
    pub is_trigger: bool,
}

impl Collider {
    pub fn solid(radius: f32) -> Self {
        Self {
            radius,
            is_trigger: false,
        }
    }

    pub fn trigger(radius: f32) -> Self {
        Self {
            radius,
            is_trigger: true,
        }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::solid(0.5)
    }
}

/// What a ray struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

/// Ray casting against the world.
pub trait SpatialQuery {
    /// Cast from `origin` along `direction` (need not be normalized) up to
    /// `max_distance`. Entities in the hierarchy rooted at `ignore_root` are
    /// skipped.
    fn ray_cast(
        &self,
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore_root: Option<EntityId>,
    ) -> Option<RayHit>;
}

/// Ray casts against the spheres attached with [`World::set_collider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereCaster {
    pub hit_triggers: bool,
}

impl SpatialQuery for SphereCaster {
    fn ray_cast(
        &self,
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore_root: Option<EntityId>,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        let mut best: Option<RayHit> = None;
        for (id, data) in world.entities() {
            let Some(collider) = data.collider else {
                continue;
            };
            if collider.is_trigger && !self.hit_triggers {
                continue;
            }
            if ignore_root.is_some() && world.root_of(*id) == ignore_root {
                continue;
            }
            let Some(center) = world.position(*id) else {
                continue;
            };
            let Some(t) = ray_sphere(origin, dir, center, collider.radius) else {
                continue;
            };
            if t > max_distance {
                continue;
            }
            if best.is_none_or(|b| t < b.distance) {
                best = Some(RayHit {
                    entity: *id,
                    point: origin + dir * t,
                    distance: t,
                });
            }
        }
        best
    }
}

/// Distance along a normalized ray to the first intersection with a sphere.
/// A ray starting inside the sphere hits at distance 0.
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}
