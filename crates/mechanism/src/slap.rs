//! Slap-to-release: a hand swatting the slide from behind while it is locked
//! back sends it home.

use glam::Vec3;
use handworks_common::{EntityId, FORWARD, almost_eq};
use handworks_input::TickContext;
use handworks_kernel::{System, World};
use serde::{Deserialize, Serialize};

use crate::slide::DEFAULT_TOLERANCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlapConfig {
    /// Minimum hand speed, in units per tick.
    pub min_speed: f32,
    /// Exclusive bounds on the forward component of the normalized hand
    /// direction, measured in the volume's local frame.
    pub cone_min: f32,
    pub cone_max: f32,
    /// Tracking is dropped once the hand wanders further than this.
    pub max_track_distance: f32,
    /// Only objects carrying this tag start tracking.
    pub hand_tag: String,
    pub tolerance: f32,
}

impl Default for SlapConfig {
    fn default() -> Self {
        Self {
            min_speed: 1.2,
            cone_min: 0.25,
            cone_max: 0.75,
            max_track_distance: 64.0,
            hand_tag: "hands".to_owned(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Watches one trigger volume for a hand and resets the slide when that hand
/// moves fast enough, glancing forward.
#[derive(Debug, Clone)]
pub struct SlideSlap {
    interactable: EntityId,
    volume: EntityId,
    tracked: Option<EntityId>,
    config: SlapConfig,
}

impl SlideSlap {
    pub fn new(interactable: EntityId, volume: EntityId) -> Self {
        Self::with_config(interactable, volume, SlapConfig::default())
    }

    pub fn with_config(interactable: EntityId, volume: EntityId, config: SlapConfig) -> Self {
        Self {
            interactable,
            volume,
            tracked: None,
            config,
        }
    }

    /// Root object of the hand being watched.
    pub fn tracked(&self) -> Option<EntityId> {
        self.tracked
    }

    pub fn is_pulled(&self, world: &World) -> bool {
        world
            .completion(self.interactable)
            .is_some_and(|c| almost_eq(c, 1.0, self.config.tolerance))
    }

    /// Whether `velocity` counts as a slap against the volume's frame.
    pub fn is_slap(&self, world: &World, velocity: Vec3) -> bool {
        if velocity.length() < self.config.min_speed {
            return false;
        }
        let Some(frame) = world.transform(self.volume) else {
            return false;
        };
        let local = (frame.rotation.inverse() * velocity).normalize_or_zero();
        let how = local.dot(FORWARD);
        how > self.config.cone_min && how < self.config.cone_max
    }

    fn tracked_velocity(world: &World, tracked: EntityId) -> Vec3 {
        world
            .hand_in_hierarchy(tracked)
            .and_then(|h| world.hand(h))
            .map_or(Vec3::ZERO, |h| h.velocity())
    }
}

impl System for SlideSlap {
    fn update(&mut self, world: &mut World, _ctx: &TickContext) {
        let Some(tracked) = self.tracked else {
            return;
        };
        if !world.contains(tracked) {
            self.tracked = None;
            return;
        }

        let velocity = Self::tracked_velocity(world, tracked);
        if self.is_pulled(world) && self.is_slap(world, velocity) {
            if world.request_completion(self.interactable, 0.0) {
                tracing::info!(
                    interactable = %self.interactable,
                    hand = %tracked,
                    speed = velocity.length(),
                    "slide slapped home"
                );
            }
            self.tracked = None;
            return;
        }

        if world
            .distance(tracked, self.volume)
            .is_none_or(|d| d > self.config.max_track_distance)
        {
            tracing::trace!(hand = %tracked, "slap tracking dropped");
            self.tracked = None;
        }
    }

    fn on_trigger_enter(&mut self, world: &mut World, volume: EntityId, other: EntityId) {
        if volume != self.volume || !world.has_tag(other, &self.config.hand_tag) {
            return;
        }
        self.tracked = world.root_of(other);
        tracing::trace!(hand = ?self.tracked, "slap tracking");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use handworks_common::{HandSide, Transform};
    use handworks_input::ControllerState;
    use handworks_kernel::{Hand, Interactable, SphereCaster};

    struct Rig {
        world: World,
        slide: EntityId,
        volume: EntityId,
        hand: EntityId,
    }

    fn rig(volume_rotation: Quat) -> Rig {
        let mut world = World::new();
        let slide = world.spawn("slide", Transform::default());
        world.add_interactable(slide, Interactable::new()).unwrap();
        let volume = world.spawn(
            "slap volume",
            Transform::from_position_rotation(Vec3::ZERO, volume_rotation),
        );
        let hand = world.spawn_hand(Hand::new(HandSide::Left), Transform::default());
        world.force_set_completion(slide, 1.0);
        Rig {
            world,
            slide,
            volume,
            hand,
        }
    }

    /// Move the hand by `delta` in one tick so its velocity equals `delta`.
    fn swing(r: &mut Rig, delta: Vec3) {
        let caster = SphereCaster::default();
        let from = r.world.position(r.hand).unwrap();
        let ctx = TickContext::new(1.0 / 60.0).with_controller(
            HandSide::Left,
            ControllerState::at(Transform::from_position(from + delta)),
        );
        r.world.update_hand(r.hand, &ctx, &caster);
    }

    /// Speed 2 whose forward share is `dot`.
    fn velocity(dot: f32) -> Vec3 {
        Vec3::new(dot, (1.0 - dot * dot).sqrt(), 0.0) * 2.0
    }

    fn tracking(r: &mut Rig) -> SlideSlap {
        let mut slap = SlideSlap::new(r.slide, r.volume);
        slap.on_trigger_enter(&mut r.world, r.volume, r.hand);
        assert_eq!(slap.tracked(), Some(r.hand));
        slap
    }

    #[test]
    fn glancing_slap_resets_slide() {
        let mut r = rig(Quat::IDENTITY);
        let mut slap = tracking(&mut r);
        swing(&mut r, velocity(0.5));
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(r.world.completion(r.slide), Some(0.0));
        assert_eq!(slap.tracked(), None);
    }

    #[test]
    fn straight_push_is_not_a_slap() {
        let mut r = rig(Quat::IDENTITY);
        let mut slap = tracking(&mut r);
        swing(&mut r, velocity(0.9));
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(r.world.completion(r.slide), Some(1.0));
        assert_eq!(slap.tracked(), Some(r.hand));
    }

    #[test]
    fn slow_hand_is_not_a_slap() {
        let mut r = rig(Quat::IDENTITY);
        let mut slap = tracking(&mut r);
        swing(&mut r, Vec3::new(0.5, 0.866, 0.0));
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(r.world.completion(r.slide), Some(1.0));
    }

    /// Slap whose cone bounds sit exactly on the forward share of `v`.
    fn bounded_at(r: &Rig, v: Vec3, min: bool) -> SlideSlap {
        let dot = v.normalize().dot(FORWARD);
        let mut config = SlapConfig::default();
        if min {
            config.cone_min = dot;
        } else {
            config.cone_max = dot;
        }
        SlideSlap::with_config(r.slide, r.volume, config)
    }

    #[test]
    fn cone_bounds_are_exclusive() {
        let r = rig(Quat::IDENTITY);
        let shallow = velocity(0.25);
        let steep = velocity(0.75);
        let slap = SlideSlap::new(r.slide, r.volume);
        assert!(slap.is_slap(&r.world, velocity(0.26)));
        assert!(slap.is_slap(&r.world, velocity(0.74)));

        assert!(!bounded_at(&r, shallow, true).is_slap(&r.world, shallow));
        assert!(!bounded_at(&r, steep, false).is_slap(&r.world, steep));
    }

    #[test]
    fn speed_threshold_is_inclusive() {
        // Volume forward is 60 degrees off +X, so a +X swing has a forward
        // share of one half.
        let mut r = rig(Quat::from_rotation_z(std::f32::consts::FRAC_PI_3));
        let mut slap = tracking(&mut r);
        assert_eq!(SlapConfig::default().min_speed, 1.2);
        assert!(!slap.is_slap(&r.world, Vec3::new(1.19, 0.0, 0.0)));

        swing(&mut r, Vec3::new(1.2, 0.0, 0.0));
        assert_eq!(r.world.hand(r.hand).unwrap().velocity().length(), 1.2);
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(r.world.completion(r.slide), Some(0.0));
    }

    #[test]
    fn direction_is_measured_in_volume_frame() {
        // Volume faces +Y, so a world-space +Y swing is straight ahead.
        let r = rig(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let slap = SlideSlap::new(r.slide, r.volume);
        assert!(!slap.is_slap(&r.world, Vec3::new(0.0, 2.0, 0.0)));
        assert!(slap.is_slap(&r.world, Vec3::new(-1.732, 1.0, 0.0)));
    }

    #[test]
    fn slide_must_be_locked_back() {
        let mut r = rig(Quat::IDENTITY);
        r.world.force_set_completion(r.slide, 0.5);
        let mut slap = tracking(&mut r);
        swing(&mut r, velocity(0.5));
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(r.world.completion(r.slide), Some(0.5));
    }

    #[test]
    fn untagged_objects_are_not_tracked() {
        let mut r = rig(Quat::IDENTITY);
        let mag = r.world.spawn("mag", Transform::default());
        let mut slap = SlideSlap::new(r.slide, r.volume);
        slap.on_trigger_enter(&mut r.world, r.volume, mag);
        assert_eq!(slap.tracked(), None);
        let other_volume = r.world.spawn("other", Transform::default());
        slap.on_trigger_enter(&mut r.world, other_volume, r.hand);
        assert_eq!(slap.tracked(), None);
    }

    #[test]
    fn wandering_hand_drops_tracking() {
        let mut r = rig(Quat::IDENTITY);
        let mut slap = tracking(&mut r);
        swing(&mut r, Vec3::new(0.0, 0.0, 64.0));
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(slap.tracked(), Some(r.hand), "exactly at the limit still tracks");

        swing(&mut r, Vec3::new(0.0, 0.0, 1.0));
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(slap.tracked(), None);
        assert_eq!(r.world.completion(r.slide), Some(1.0));
    }

    #[test]
    fn despawned_hand_drops_tracking() {
        let mut r = rig(Quat::IDENTITY);
        let mut slap = tracking(&mut r);
        r.world.despawn(r.hand);
        slap.update(&mut r.world, &TickContext::new(1.0 / 60.0));
        assert_eq!(slap.tracked(), None);
    }
}
