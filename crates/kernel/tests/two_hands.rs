use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use handworks_common::{EntityId, HandSide, Transform};
use handworks_input::{ControllerState, GrabInputMode, TickContext};
use handworks_kernel::{
    Collider, GrabListener, Hand, Interactable, ListenerScope, Simulation, World,
};

/// Every held grabbable points at a hand that points back at it, and no two
/// hands share a grabbable.
fn assert_single_ownership(world: &World) {
    let mut seen = Vec::new();
    for (hand_id, hand) in world.hands() {
        if let Some(held) = hand.held() {
            assert!(!seen.contains(&held), "{held} held by two hands");
            seen.push(held);
            assert_eq!(world.held_by(held), Some(*hand_id));
        }
    }
    for (id, grabbable) in world.grabbables() {
        if let Some(holder) = grabbable.holder() {
            assert_eq!(world.hand(holder).and_then(Hand::held), Some(*id));
        }
    }
}

#[derive(Default)]
struct Log(Vec<String>);

impl GrabListener for Log {
    fn on_grab_start(&mut self, world: &mut World, interactable: EntityId, hand: EntityId) {
        let side = world.hand(hand).map(|h| h.side);
        self.0.push(format!("start {interactable} {side:?}"));
    }

    fn on_grab_end(&mut self, world: &mut World, interactable: EntityId, hand: EntityId) {
        let side = world.hand(hand).map(|h| h.side);
        self.0.push(format!("end {interactable} {side:?}"));
    }
}

fn controller(pos: Vec3, grip: f32) -> ControllerState {
    ControllerState::at(Transform::from_position(pos)).with_grip(grip)
}

#[test]
fn hands_contend_for_one_object() {
    let mut world = World::new();
    let left = world.spawn_hand(Hand::new(HandSide::Left), Transform::default());
    let right = world.spawn_hand(Hand::new(HandSide::Right), Transform::default());
    world.set_collider(left, Collider::trigger(0.5));
    world.set_collider(right, Collider::trigger(0.5));

    let mag = world.spawn("magazine", Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
    world.set_collider(mag, Collider::solid(0.5));
    world.add_interactable(mag, Interactable::new()).unwrap();
    world.add_grabbable(mag, GrabInputMode::Grip, Some(mag)).unwrap();

    let log = Rc::new(RefCell::new(Log::default()));
    world.add_grab_listener(ListenerScope::World, &log).unwrap();

    let mut sim = Simulation::new(world);
    let at_mag = Vec3::new(0.0, 0.0, 10.0);

    // Both hands reach the magazine with grips down on the same tick. Left
    // hands update first (lower id), so left wins.
    let both = TickContext::new(1.0 / 60.0)
        .with_controller(HandSide::Left, controller(at_mag, 1.0))
        .with_controller(HandSide::Right, controller(at_mag, 1.0));
    // First tick moves the hands in; overlaps are seen on the next.
    sim.tick(&both);
    assert_single_ownership(sim.world());
    sim.tick(&both);
    assert_single_ownership(sim.world());
    assert_eq!(sim.world().held_by(mag), Some(left));

    // Left lets go while right keeps squeezing. Left resolves first, so right
    // takes over within the same tick.
    let handoff = TickContext::new(1.0 / 60.0)
        .with_controller(HandSide::Left, controller(at_mag, 0.0))
        .with_controller(HandSide::Right, controller(at_mag, 1.0));
    sim.tick(&handoff);
    assert_single_ownership(sim.world());
    assert_eq!(sim.world().held_by(mag), Some(right));
    sim.tick(&handoff);
    assert_single_ownership(sim.world());
    assert_eq!(sim.world().held_by(mag), Some(right));

    assert_eq!(
        log.borrow().0,
        vec![
            format!("start {mag} Some(Left)"),
            format!("end {mag} Some(Left)"),
            format!("start {mag} Some(Right)"),
        ]
    );
}

#[test]
fn destroying_held_object_mid_session() {
    let mut world = World::new();
    let hand = world.spawn_hand(Hand::new(HandSide::Right), Transform::default());
    let pistol = world.spawn("pistol", Transform::default());
    world.add_interactable(pistol, Interactable::new()).unwrap();
    let grip = world.spawn_child(pistol, "grip", Transform::default()).unwrap();
    world.add_grabbable(grip, GrabInputMode::Grip, Some(pistol)).unwrap();
    world.trigger_enter(hand, grip);

    let log = Rc::new(RefCell::new(Log::default()));
    world.add_grab_listener(ListenerScope::World, &log).unwrap();

    let mut sim = Simulation::new(world).without_overlap_tracking();
    let squeeze = TickContext::new(1.0 / 60.0)
        .with_controller(HandSide::Right, controller(Vec3::ZERO, 1.0));
    sim.tick(&squeeze);
    assert_eq!(sim.world().held_by(grip), Some(hand));

    sim.world_mut().despawn(pistol);
    assert!(!sim.world().contains(grip));
    assert!(sim.world().hand(hand).unwrap().held().is_none());

    // The hand keeps ticking against a world without the pistol.
    sim.tick(&squeeze);
    assert_single_ownership(sim.world());
    assert_eq!(log.borrow().0.len(), 2);
    assert_eq!(log.borrow().0[1], format!("end {pistol} Some(Right)"));
}
