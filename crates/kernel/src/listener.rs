//! Observer fan-out for grab and completion notifications.
//!
//! Listeners are registered as shared cells and held weakly: their lifetime
//! belongs to whoever created them, and a dropped listener is pruned on the
//! next dispatch. Notifications are delivered synchronously, in registration
//! order, after the state change they describe has been applied.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use handworks_common::EntityId;

use crate::error::WorldError;
use crate::world::World;

/// Receives grab start/end notifications. Both methods default to no-ops so
/// implementers only override what they care about.
pub trait GrabListener {
    fn on_grab_start(&mut self, _world: &mut World, _interactable: EntityId, _hand: EntityId) {}

    fn on_grab_end(&mut self, _world: &mut World, _interactable: EntityId, _hand: EntityId) {}
}

/// Receives every change of an interactable's completion value.
pub trait CompletionListener {
    fn on_completion_changed(
        &mut self,
        world: &mut World,
        interactable: EntityId,
        before: f32,
        after: f32,
    );
}

/// Which grabs a listener hears about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    /// Every interactable in the world.
    World,
    /// One interactable only.
    Interactable(EntityId),
}

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GrabPhase {
    Start,
    End,
}

struct Slot<T: ?Sized> {
    id: ListenerId,
    target: Weak<RefCell<T>>,
}

/// Ordered list of weakly held listeners.
pub(crate) struct ListenerList<T: ?Sized> {
    slots: Vec<Slot<T>>,
}

impl<T: ?Sized> Default for ListenerList<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: ?Sized> std::fmt::Debug for ListenerList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.slots.len())
            .finish()
    }
}

impl<T: ?Sized> ListenerList<T> {
    pub(crate) fn push(&mut self, id: ListenerId, target: Weak<RefCell<T>>) {
        self.slots.push(Slot { id, target });
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        self.slots.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Upgrade every live listener, dropping the dead ones.
    pub(crate) fn live(&mut self) -> Vec<Rc<RefCell<T>>> {
        self.slots.retain(|s| s.target.strong_count() > 0);
        self.slots.iter().filter_map(|s| s.target.upgrade()).collect()
    }
}

impl World {
    fn next_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        id
    }

    /// Register a grab listener. The world keeps only a weak reference.
    pub fn add_grab_listener<L: GrabListener + 'static>(
        &mut self,
        scope: ListenerScope,
        listener: &Rc<RefCell<L>>,
    ) -> Result<ListenerId, WorldError> {
        let shared: Rc<RefCell<dyn GrabListener>> = listener.clone();
        let target = Rc::downgrade(&shared);
        match scope {
            ListenerScope::World => {
                let id = self.next_listener();
                self.grab_listeners.push(id, target);
                Ok(id)
            }
            ListenerScope::Interactable(owner) => {
                if !self.interactables.contains_key(&owner) {
                    return Err(WorldError::NotInteractable(owner));
                }
                let id = self.next_listener();
                if let Some(i) = self.interactables.get_mut(&owner) {
                    i.grab_listeners.push(id, target);
                }
                Ok(id)
            }
        }
    }

    /// Unregister a grab listener from wherever it was registered.
    pub fn remove_grab_listener(&mut self, id: ListenerId) -> bool {
        if self.grab_listeners.remove(id) {
            return true;
        }
        self.interactables
            .values_mut()
            .any(|i| i.grab_listeners.remove(id))
    }

    /// Subscribe to an interactable's completion changes.
    pub fn add_completion_listener<L: CompletionListener + 'static>(
        &mut self,
        interactable: EntityId,
        listener: &Rc<RefCell<L>>,
    ) -> Result<ListenerId, WorldError> {
        if !self.interactables.contains_key(&interactable) {
            return Err(WorldError::NotInteractable(interactable));
        }
        let shared: Rc<RefCell<dyn CompletionListener>> = listener.clone();
        let id = self.next_listener();
        if let Some(i) = self.interactables.get_mut(&interactable) {
            i.completion_listeners.push(id, Rc::downgrade(&shared));
        }
        Ok(id)
    }

    pub fn remove_completion_listener(&mut self, id: ListenerId) -> bool {
        self.interactables
            .values_mut()
            .any(|i| i.completion_listeners.remove(id))
    }

    /// Number of registered world-scope grab listeners, dead ones included.
    pub fn grab_listener_count(&self) -> usize {
        self.grab_listeners.len()
    }

    /// Fan a grab transition out to the interactable's own listeners, then to
    /// world-scope listeners.
    pub(crate) fn notify_grab(&mut self, phase: GrabPhase, interactable: EntityId, hand: EntityId) {
        let mut targets = match self.interactables.get_mut(&interactable) {
            Some(i) => i.grab_listeners.live(),
            None => Vec::new(),
        };
        targets.extend(self.grab_listeners.live());

        for target in targets {
            let Ok(mut listener) = target.try_borrow_mut() else {
                tracing::warn!(%interactable, ?phase, "grab listener busy; skipping re-entrant notification");
                continue;
            };
            match phase {
                GrabPhase::Start => listener.on_grab_start(self, interactable, hand),
                GrabPhase::End => listener.on_grab_end(self, interactable, hand),
            }
        }
    }

    pub(crate) fn notify_completion(&mut self, interactable: EntityId, before: f32, after: f32) {
        let targets = match self.interactables.get_mut(&interactable) {
            Some(i) => i.completion_listeners.live(),
            None => return,
        };
        for target in targets {
            let Ok(mut listener) = target.try_borrow_mut() else {
                tracing::warn!(%interactable, "completion listener busy; skipping re-entrant notification");
                continue;
            };
            listener.on_completion_changed(self, interactable, before, after);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Hand;
    use crate::interactable::{Interactable, Locked};
    use handworks_common::{HandSide, Transform};
    use handworks_input::GrabInputMode;

    #[derive(Default)]
    struct Recorder {
        starts: Vec<(EntityId, EntityId)>,
        ends: Vec<(EntityId, EntityId)>,
        saw_holder_on_start: Vec<bool>,
    }

    impl GrabListener for Recorder {
        fn on_grab_start(&mut self, world: &mut World, interactable: EntityId, hand: EntityId) {
            self.starts.push((interactable, hand));
            self.saw_holder_on_start
                .push(world.hand(hand).and_then(|h| h.held()).is_some());
        }

        fn on_grab_end(&mut self, _world: &mut World, interactable: EntityId, hand: EntityId) {
            self.ends.push((interactable, hand));
        }
    }

    /// Only cares about grab ends; start uses the default no-op.
    #[derive(Default)]
    struct EndsOnly(usize);

    impl GrabListener for EndsOnly {
        fn on_grab_end(&mut self, _world: &mut World, _interactable: EntityId, _hand: EntityId) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct Changes(Vec<(f32, f32)>);

    impl CompletionListener for Changes {
        fn on_completion_changed(&mut self, _world: &mut World, _interactable: EntityId, before: f32, after: f32) {
            self.0.push((before, after));
        }
    }

    fn scene() -> (World, EntityId, EntityId) {
        let mut w = World::new();
        let object = w.spawn("pistol", Transform::default());
        w.add_interactable(object, Interactable::new()).unwrap();
        w.add_grabbable(object, GrabInputMode::Hover, Some(object)).unwrap();
        let hand = w.spawn_hand(Hand::new(HandSide::Right), Transform::default());
        (w, object, hand)
    }

    #[test]
    fn world_listener_sees_post_transition_state() {
        let (mut w, object, hand) = scene();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        w.add_grab_listener(ListenerScope::World, &recorder).unwrap();

        w.attempt_acquire(object, hand);
        w.attempt_release(object, hand);

        let r = recorder.borrow();
        assert_eq!(r.starts, vec![(object, hand)]);
        assert_eq!(r.ends, vec![(object, hand)]);
        assert_eq!(r.saw_holder_on_start, vec![true]);
    }

    #[test]
    fn default_methods_are_no_ops() {
        let (mut w, object, hand) = scene();
        let ends = Rc::new(RefCell::new(EndsOnly::default()));
        w.add_grab_listener(ListenerScope::World, &ends).unwrap();
        w.attempt_acquire(object, hand);
        w.attempt_release(object, hand);
        assert_eq!(ends.borrow().0, 1);
    }

    #[test]
    fn scoped_listener_ignores_other_interactables() {
        let (mut w, object, hand) = scene();
        let other = w.spawn("rifle", Transform::default());
        w.add_interactable(other, Interactable::new()).unwrap();
        w.add_grabbable(other, GrabInputMode::Hover, Some(other)).unwrap();

        let scoped = Rc::new(RefCell::new(Recorder::default()));
        w.add_grab_listener(ListenerScope::Interactable(other), &scoped).unwrap();

        w.attempt_acquire(object, hand);
        w.attempt_release(object, hand);
        assert!(scoped.borrow().starts.is_empty());

        w.attempt_acquire(other, hand);
        assert_eq!(scoped.borrow().starts, vec![(other, hand)]);
    }

    #[test]
    fn denied_grabs_notify_nobody() {
        let mut w = World::new();
        let object = w.spawn("bolted", Transform::default());
        w.add_interactable(object, Interactable::with_authority(Locked)).unwrap();
        w.add_grabbable(object, GrabInputMode::Hover, Some(object)).unwrap();
        let hand = w.spawn_hand(Hand::new(HandSide::Right), Transform::default());
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        w.add_grab_listener(ListenerScope::World, &recorder).unwrap();

        for _ in 0..5 {
            w.attempt_acquire(object, hand);
            w.release_held(hand);
        }
        assert!(recorder.borrow().starts.is_empty());
        assert!(recorder.borrow().ends.is_empty());
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let (mut w, object, hand) = scene();
        {
            let temporary = Rc::new(RefCell::new(Recorder::default()));
            w.add_grab_listener(ListenerScope::World, &temporary).unwrap();
        }
        assert_eq!(w.grab_listener_count(), 1);
        w.attempt_acquire(object, hand);
        assert_eq!(w.grab_listener_count(), 0);
    }

    #[test]
    fn remove_listener() {
        let (mut w, object, hand) = scene();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let id = w
            .add_grab_listener(ListenerScope::Interactable(object), &recorder)
            .unwrap();
        assert!(w.remove_grab_listener(id));
        assert!(!w.remove_grab_listener(id));
        w.attempt_acquire(object, hand);
        assert!(recorder.borrow().starts.is_empty());
    }

    #[test]
    fn scoped_registration_requires_interactable() {
        let mut w = World::new();
        let plain = w.spawn("plain", Transform::default());
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        assert_eq!(
            w.add_grab_listener(ListenerScope::Interactable(plain), &recorder),
            Err(WorldError::NotInteractable(plain))
        );
    }

    #[test]
    fn completion_listeners_run_in_registration_order() {
        let (mut w, object, _) = scene();
        let first = Rc::new(RefCell::new(Changes::default()));
        let second = Rc::new(RefCell::new(Changes::default()));
        w.add_completion_listener(object, &first).unwrap();
        w.add_completion_listener(object, &second).unwrap();

        w.force_set_completion(object, 1.0);
        w.force_set_completion(object, 1.0);
        w.force_set_completion(object, 0.0);

        assert_eq!(first.borrow().0, vec![(0.0, 1.0), (1.0, 0.0)]);
        assert_eq!(second.borrow().0, first.borrow().0);
    }

    #[test]
    fn removed_completion_listener_stops_hearing() {
        let (mut w, object, _) = scene();
        let changes = Rc::new(RefCell::new(Changes::default()));
        let id = w.add_completion_listener(object, &changes).unwrap();
        w.force_set_completion(object, 1.0);
        assert!(w.remove_completion_listener(id));
        assert!(!w.remove_completion_listener(id));
        w.force_set_completion(object, 0.0);
        assert_eq!(changes.borrow().0, vec![(0.0, 1.0)]);
    }
}
