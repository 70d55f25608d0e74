//! Frame-stepped driver tying the world, hands and secondary systems together.

use std::cell::RefCell;
use std::rc::Rc;

use handworks_common::EntityId;
use handworks_input::TickContext;

use crate::overlap::{OverlapEvent, OverlapTracker};
use crate::spatial::{SpatialQuery, SphereCaster};
use crate::world::World;

/// A component updated once per tick after all hands have resolved.
///
/// Trigger callbacks default to no-ops; systems that own a trigger volume
/// filter on `volume` themselves.
pub trait System {
    fn update(&mut self, world: &mut World, ctx: &TickContext);

    fn on_trigger_enter(&mut self, _world: &mut World, _volume: EntityId, _other: EntityId) {}

    fn on_trigger_exit(&mut self, _world: &mut World, _volume: EntityId, _other: EntityId) {}
}

/// Owns the world and runs one synchronous tick at a time.
///
/// Tick order: overlap notifications, every hand (acquire/release and the
/// listener fan-out it triggers), slide tracks, registered systems in
/// registration order, then the world tick counter.
///
/// The world's event log is never drained here. Callers that read it drain
/// it; otherwise it holds only the most recent events.
pub struct Simulation {
    world: World,
    spatial: Box<dyn SpatialQuery>,
    overlaps: Option<OverlapTracker>,
    systems: Vec<Rc<RefCell<dyn System>>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("tracks_overlaps", &self.overlaps.is_some())
            .field("systems", &self.systems.len())
            .finish()
    }
}

impl Simulation {
    /// A simulation that ray casts and derives overlaps from the world's own
    /// sphere colliders.
    pub fn new(world: World) -> Self {
        Self {
            world,
            spatial: Box::new(SphereCaster::default()),
            overlaps: Some(OverlapTracker::new()),
            systems: Vec::new(),
        }
    }

    /// Use an external spatial provider. Overlap tracking is left on unless
    /// disabled with [`Simulation::without_overlap_tracking`].
    pub fn with_spatial(mut self, spatial: impl SpatialQuery + 'static) -> Self {
        self.spatial = Box::new(spatial);
        self
    }

    /// Rely on the caller to deliver trigger notifications instead.
    pub fn without_overlap_tracking(mut self) -> Self {
        self.overlaps = None;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn add_system<S: System + 'static>(&mut self, system: &Rc<RefCell<S>>) {
        let shared: Rc<RefCell<dyn System>> = system.clone();
        self.systems.push(shared);
    }

    /// Deliver a trigger-enter notification to the hands and every system.
    pub fn trigger_enter(&mut self, volume: EntityId, other: EntityId) {
        self.world.trigger_enter(volume, other);
        for system in &self.systems {
            system
                .borrow_mut()
                .on_trigger_enter(&mut self.world, volume, other);
        }
    }

    pub fn trigger_exit(&mut self, volume: EntityId, other: EntityId) {
        self.world.trigger_exit(volume, other);
        for system in &self.systems {
            system
                .borrow_mut()
                .on_trigger_exit(&mut self.world, volume, other);
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self, ctx: &TickContext) {
        let _span = tracing::info_span!("tick", tick = self.world.tick()).entered();

        let overlaps = self
            .overlaps
            .as_mut()
            .map(|tracker| tracker.update(&self.world))
            .unwrap_or_default();
        for event in overlaps {
            match event {
                OverlapEvent::Entered { volume, other } => self.trigger_enter(volume, other),
                OverlapEvent::Exited { volume, other } => self.trigger_exit(volume, other),
            }
        }

        for hand in self.world.hand_ids() {
            self.world.update_hand(hand, ctx, self.spatial.as_ref());
        }

        self.world.update_slide_tracks();

        for system in &self.systems {
            system.borrow_mut().update(&mut self.world, ctx);
        }

        self.world.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Hand;
    use crate::interactable::Interactable;
    use crate::spatial::Collider;
    use glam::Vec3;
    use handworks_common::{HandSide, Transform};
    use handworks_input::{ControllerState, GrabInputMode};

    #[derive(Default)]
    struct Counter {
        updates: usize,
        enters: Vec<(EntityId, EntityId)>,
    }

    impl System for Counter {
        fn update(&mut self, _world: &mut World, _ctx: &TickContext) {
            self.updates += 1;
        }

        fn on_trigger_enter(&mut self, _world: &mut World, volume: EntityId, other: EntityId) {
            self.enters.push((volume, other));
        }
    }

    #[test]
    fn tick_runs_systems_and_advances() {
        let mut sim = Simulation::new(World::new());
        let counter = Rc::new(RefCell::new(Counter::default()));
        sim.add_system(&counter);
        sim.tick(&TickContext::new(1.0 / 60.0));
        sim.tick(&TickContext::new(1.0 / 60.0));
        assert_eq!(counter.borrow().updates, 2);
        assert_eq!(sim.world().tick(), 2);
    }

    #[test]
    fn long_runs_keep_a_bounded_log() {
        let mut sim = Simulation::new(World::new());
        let ctx = TickContext::new(1.0 / 60.0);
        for _ in 0..100_000 {
            sim.tick(&ctx);
        }
        assert_eq!(sim.world().events().len(), crate::world::DEFAULT_EVENT_CAPACITY);
        assert_eq!(
            sim.world().events().back(),
            Some(&crate::world::WorldEvent::Stepped { tick: 100_000 })
        );
    }

    #[test]
    fn overlaps_feed_hover_and_systems() {
        let mut world = World::new();
        let hand = world.spawn_hand(Hand::new(HandSide::Right), Transform::default());
        world.set_collider(hand, Collider::trigger(0.5));
        let mag = world.spawn("mag", Transform::from_position(Vec3::new(0.7, 0.0, 0.0)));
        world.set_collider(mag, Collider::trigger(0.5));
        world.add_interactable(mag, Interactable::new()).unwrap();
        world.add_grabbable(mag, GrabInputMode::Grip, Some(mag)).unwrap();

        let mut sim = Simulation::new(world);
        let counter = Rc::new(RefCell::new(Counter::default()));
        sim.add_system(&counter);

        let grip = TickContext::new(1.0 / 60.0)
            .with_controller(HandSide::Right, ControllerState::default().with_grip(1.0));
        sim.tick(&grip);
        assert_eq!(sim.world().held_by(mag), Some(hand));
        assert!(counter.borrow().enters.contains(&(hand, mag)));
    }
}
