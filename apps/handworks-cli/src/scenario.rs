//! Scripted runs of the grab stack, printed as they go.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use handworks_common::{EntityId, HandSide, Transform};
use handworks_input::{Button, ControllerState, GrabInputMode, TickContext};
use handworks_kernel::{
    Collider, GrabConfig, Hand, Interactable, ListenerScope, Simulation, World, WorldEvent,
};
use handworks_mechanism::{Chamber, SlideAction, SlideRelease};
use handworks_pouch::PlayerPouch;
use handworks_tools::GrabInspector;

const DELTA: f32 = 1.0 / 60.0;

fn hand_at(pos: Vec3, grip: f32) -> ControllerState {
    ControllerState::at(Transform::from_position(pos)).with_grip(grip)
}

fn print_events(world: &mut World) {
    for event in world.drain_events() {
        println!("  {event:?}");
    }
}

fn audit(world: &World) -> anyhow::Result<()> {
    if let Some(violation) = GrabInspector::check_ownership(world).into_iter().next() {
        anyhow::bail!("ownership audit failed: {violation}");
    }
    Ok(())
}

pub fn contest(config: GrabConfig, ticks: u64) -> anyhow::Result<()> {
    let mut world = World::with_config(config);
    let left = world.spawn_hand(Hand::new(HandSide::Left), Transform::default());
    let right = world.spawn_hand(Hand::new(HandSide::Right), Transform::default());
    world.set_collider(left, Collider::trigger(0.5));
    world.set_collider(right, Collider::trigger(0.5));

    let at = Vec3::new(0.0, 0.0, 10.0);
    let mag = world.spawn("magazine", Transform::from_position(at));
    world.set_collider(mag, Collider::solid(0.5));
    world.add_interactable(mag, Interactable::new())?;
    world.add_grabbable(mag, GrabInputMode::Grip, Some(mag))?;
    world.drain_events();

    let mut sim = Simulation::new(world);
    let both = TickContext::new(DELTA)
        .with_controller(HandSide::Left, hand_at(at, 1.0))
        .with_controller(HandSide::Right, hand_at(at, 1.0));
    sim.tick(&both);
    sim.tick(&both);
    println!("both hands squeeze: held by {:?}", sim.world().held_by(mag));
    print_events(sim.world_mut());
    audit(sim.world())?;

    let handoff = TickContext::new(DELTA)
        .with_controller(HandSide::Left, hand_at(at, 0.0))
        .with_controller(HandSide::Right, hand_at(at, 1.0));
    for _ in 0..ticks {
        sim.tick(&handoff);
        audit(sim.world())?;
    }
    println!("left lets go: held by {:?}", sim.world().held_by(mag));
    print_events(sim.world_mut());

    for info in GrabInspector::list_hands(sim.world()) {
        println!("{info}");
    }
    Ok(())
}

pub fn pouch(config: GrabConfig, ticks: u64) -> anyhow::Result<()> {
    let mut world = World::with_config(config);
    let pouch_entity = world.spawn("pouch", Transform::from_position(Vec3::new(0.0, -1.0, 0.0)));
    let hand = world.spawn_hand(Hand::new(HandSide::Right), Transform::default());
    let mag = world.spawn("magazine", Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
    world.add_interactable(mag, Interactable::new())?;
    world.add_grabbable(mag, GrabInputMode::Grip, Some(mag))?;
    world.trigger_enter(hand, mag);

    let pouch = Rc::new(RefCell::new(PlayerPouch::new(pouch_entity)));
    world.add_grab_listener(ListenerScope::World, &pouch)?;

    let mut sim = Simulation::new(world).without_overlap_tracking();
    sim.add_system(&pouch);

    sim.tick(&TickContext::new(DELTA).with_controller(HandSide::Right, hand_at(Vec3::ZERO, 1.0)));
    println!("grabbed: held by {:?}", sim.world().held_by(mag));

    let open = TickContext::new(DELTA).with_controller(HandSide::Right, hand_at(Vec3::ZERO, 0.0));
    for _ in 0..ticks {
        sim.tick(&open);
    }
    let distance = sim.world().distance(mag, pouch_entity).unwrap_or(f32::NAN);
    println!(
        "after {ticks} ticks: stowed={:?} distance={distance:.4} motion={:?}",
        pouch.borrow().held(),
        sim.world().motion_enabled(mag)
    );
    audit(sim.world())
}

pub fn slide(config: GrabConfig, rounds: u32) -> anyhow::Result<()> {
    let mut world = World::with_config(config);
    let hand = world.spawn_hand(Hand::new(HandSide::Right), Transform::default());
    let pistol = world.spawn("pistol", Transform::default());
    world.add_interactable(pistol, Interactable::new())?;
    let grip = world.spawn_child(pistol, "grip", Transform::default())?;
    world.add_grabbable(grip, GrabInputMode::Grip, Some(pistol))?;
    let slide = world.spawn_child(pistol, "slide", Transform::from_position(Vec3::new(1.0, 0.0, 0.5)))?;
    world.add_interactable(slide, Interactable::new())?;
    world.trigger_enter(hand, grip);

    let action = Rc::new(RefCell::new(SlideAction::new(Chamber::with_magazine(rounds))));
    world.add_completion_listener(slide, &action)?;
    let release = Rc::new(RefCell::new(SlideRelease::new(slide, grip)));

    let mut sim = Simulation::new(world).without_overlap_tracking();
    sim.add_system(&release);

    let hold = |press| {
        TickContext::new(DELTA).with_controller(
            HandSide::Right,
            hand_at(Vec3::ZERO, 1.0).with_button(Button::Primary, press),
        )
    };
    sim.tick(&hold(false));

    for cycle in 0..=rounds {
        release.borrow().pull_manually(sim.world_mut());
        sim.tick(&hold(true));
        sim.tick(&hold(false));
        let a = action.borrow();
        println!("cycle {cycle}: {:?} feeds={} ejects={}", a.breech(), a.feeds(), a.ejects());
    }
    count_completion_changes(sim.world_mut(), slide);
    audit(sim.world())
}

fn count_completion_changes(world: &mut World, interactable: EntityId) {
    let changes = world
        .drain_events()
        .into_iter()
        .filter(|e| {
            matches!(e, WorldEvent::CompletionChanged { interactable: i, .. } if *i == interactable)
        })
        .count();
    println!("slide completion changes: {changes}");
}
