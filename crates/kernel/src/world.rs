use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use handworks_common::{EntityId, Transform};

use crate::config::GrabConfig;
use crate::error::WorldError;
use crate::grab::Grabbable;
use crate::hand::Hand;
use crate::interactable::Interactable;
use crate::listener::{GrabListener, ListenerList};
use crate::spatial::Collider;

/// Events kept by a world that nobody drains.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// An event record produced by every state change in the world.
///
/// Tests and tooling read the log to check what happened during a tick.
/// Whoever reads the log owns draining it; an undrained log keeps only the
/// most recent [`World::event_capacity`] events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Spawned {
        id: EntityId,
    },
    /// Entity was removed, after any grab it took part in was released.
    Despawned {
        id: EntityId,
    },
    GrabStarted {
        grabbable: EntityId,
        interactable: EntityId,
        hand: EntityId,
    },
    /// A grab ended. `forced` is set when the authority was bypassed.
    GrabEnded {
        grabbable: EntityId,
        interactable: Option<EntityId>,
        hand: EntityId,
        forced: bool,
    },
    CompletionChanged {
        interactable: EntityId,
        before: f32,
        after: f32,
    },
    MotionChanged {
        id: EntityId,
        enabled: bool,
    },
    HoverEntered {
        hand: EntityId,
        grabbable: EntityId,
    },
    HoverExited {
        hand: EntityId,
        grabbable: EntityId,
    },
    Stepped {
        tick: u64,
    },
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub name: String,
    /// Transform relative to the parent, or to the world for roots.
    pub local: Transform,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub tags: BTreeSet<String>,
    /// Whether the physics provider may move this entity.
    pub motion_enabled: bool,
    pub collider: Option<Collider>,
}

/// The world arena: entities plus the capabilities they expose.
///
/// Capabilities (grabbable, interactable, hand) are typed optional components
/// keyed by `EntityId`. Every relation between them is an id, never an owning
/// pointer. All ownership changes go through the grab protocol in
/// [`crate::grab`].
///
/// Uses BTreeMap for deterministic iteration order.
pub struct World {
    pub(crate) config: GrabConfig,
    pub(crate) entities: BTreeMap<EntityId, EntityData>,
    pub(crate) grabbables: BTreeMap<EntityId, Grabbable>,
    pub(crate) interactables: BTreeMap<EntityId, Interactable>,
    pub(crate) hands: BTreeMap<EntityId, Hand>,
    /// Listeners that hear about every interactable.
    pub(crate) grab_listeners: ListenerList<dyn GrabListener>,
    next_id: u64,
    pub(crate) next_listener_id: u64,
    tick: u64,
    /// Entities inside a `despawn` call that have not been removed yet.
    despawning: BTreeSet<EntityId>,
    /// Most recent mutations, oldest first.
    event_log: VecDeque<WorldEvent>,
    event_capacity: usize,
    dropped_events: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("entities", &self.entities.len())
            .field("grabbables", &self.grabbables.len())
            .field("interactables", &self.interactables.len())
            .field("hands", &self.hands.len())
            .field("grab_listeners", &self.grab_listeners.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::with_config(GrabConfig::default())
    }
}

impl World {
    /// Create an empty world with default tunables.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GrabConfig) -> Self {
        Self {
            config,
            entities: BTreeMap::new(),
            grabbables: BTreeMap::new(),
            interactables: BTreeMap::new(),
            hands: BTreeMap::new(),
            grab_listeners: ListenerList::default(),
            next_id: 1,
            next_listener_id: 1,
            tick: 0,
            despawning: BTreeSet::new(),
            event_log: VecDeque::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            dropped_events: 0,
        }
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the tick counter. Called once at the end of every simulation tick.
    pub fn step(&mut self) {
        self.tick += 1;
        self.log(WorldEvent::Stepped { tick: self.tick });
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Whether `id` is being torn down by a `despawn` still in progress.
    ///
    /// Listeners notified from inside `despawn` see the entity as present but
    /// should not take new references to it.
    pub fn is_despawning(&self, id: EntityId) -> bool {
        self.despawning.contains(&id)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log).into()
    }

    /// Read-only access to the event log, oldest first.
    pub fn events(&self) -> &VecDeque<WorldEvent> {
        &self.event_log
    }

    /// Upper bound on retained events. Zero turns logging off.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Change the retained event bound, dropping the oldest events if the
    /// log is already longer.
    pub fn set_event_capacity(&mut self, capacity: usize) {
        self.event_capacity = capacity;
        self.trim_events();
    }

    /// Events discarded because the log was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    pub(crate) fn log(&mut self, event: WorldEvent) {
        if self.event_capacity == 0 {
            self.dropped_events += 1;
            return;
        }
        self.event_log.push_back(event);
        self.trim_events();
    }

    fn trim_events(&mut self) {
        while self.event_log.len() > self.event_capacity {
            self.event_log.pop_front();
            self.dropped_events += 1;
        }
    }

    /// Read-only access to all entities.
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Spawn a root entity at a world transform. Returns its id.
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            EntityData {
                name: name.into(),
                local: transform,
                parent: None,
                children: Vec::new(),
                tags: BTreeSet::new(),
                motion_enabled: true,
                collider: None,
            },
        );
        self.log(WorldEvent::Spawned { id });
        id
    }

    /// Spawn an entity under `parent` with a transform relative to it.
    pub fn spawn_child(
        &mut self,
        parent: EntityId,
        name: impl Into<String>,
        local: Transform,
    ) -> Result<EntityId, WorldError> {
        if !self.contains(parent) {
            return Err(WorldError::EntityNotFound(parent));
        }
        let id = self.spawn(name, local);
        if let Some(data) = self.entities.get_mut(&id) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.entities.get_mut(&parent) {
            data.children.push(id);
        }
        Ok(id)
    }

    /// Remove an entity and its descendants.
    ///
    /// Any grab the removed entities take part in is force-released first, so
    /// listeners get their end notification while the interactable still
    /// exists and no hand is left pointing at a dead grabbable.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let _span = tracing::debug_span!("despawn", %id).entered();
        let doomed = self.descendants(id);
        self.despawning.extend(doomed);

        if self.interactables.contains_key(&id) {
            self.clear_all_interactions(id);
        }

        let children = self
            .entities
            .get(&id)
            .map(|d| d.children.clone())
            .unwrap_or_default();
        for child in children {
            self.despawn(child);
        }

        if self.grabbables.contains_key(&id) {
            self.force_release(id);
            if let Some(grabbable) = self.grabbables.remove(&id) {
                if let Some(owner) = grabbable.interactable {
                    if let Some(interactable) = self.interactables.get_mut(&owner) {
                        interactable.grab_points.retain(|g| *g != id);
                    }
                }
            }
        }

        if let Some(held) = self.hands.get(&id).and_then(|h| h.held) {
            self.force_release(held);
        }
        self.hands.remove(&id);
        for hand in self.hands.values_mut() {
            hand.hovered.retain(|g| *g != id);
        }

        if let Some(interactable) = self.interactables.remove(&id) {
            for point in interactable.grab_points {
                if let Some(grabbable) = self.grabbables.get_mut(&point) {
                    grabbable.interactable = None;
                }
            }
        }

        self.despawning.remove(&id);
        let Some(data) = self.entities.remove(&id) else {
            return false;
        };
        if let Some(parent) = data.parent {
            if let Some(parent) = self.entities.get_mut(&parent) {
                parent.children.retain(|c| *c != id);
            }
        }
        self.log(WorldEvent::Despawned { id });
        tracing::debug!(%id, name = %data.name, "despawned");
        true
    }

    /// Topmost ancestor of `id` (itself for roots).
    pub fn root_of(&self, id: EntityId) -> Option<EntityId> {
        let mut current = id;
        let mut data = self.entities.get(&current)?;
        while let Some(parent) = data.parent {
            current = parent;
            data = self.entities.get(&current)?;
        }
        Some(current)
    }

    /// `root` and every entity below it, depth first.
    pub fn descendants(&self, root: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.entities.get(&id) {
                out.push(id);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// World-space transform of an entity.
    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        let data = self.entities.get(&id)?;
        match data.parent {
            Some(parent) => Some(self.transform(parent)?.compose(&data.local)),
            None => Some(data.local),
        }
    }

    pub fn position(&self, id: EntityId) -> Option<glam::Vec3> {
        self.transform(id).map(|t| t.position)
    }

    /// Place an entity at a world-space transform.
    pub fn set_transform(&mut self, id: EntityId, world: Transform) -> bool {
        let Some(parent) = self.entities.get(&id).map(|d| d.parent) else {
            return false;
        };
        let local = match parent.and_then(|p| self.transform(p)) {
            Some(frame) => Transform {
                position: frame.inverse_transform_point(world.position),
                rotation: frame.rotation.inverse() * world.rotation,
                scale: world.scale / frame.scale,
            },
            None => world,
        };
        self.set_local_transform(id, local)
    }

    pub fn set_local_transform(&mut self, id: EntityId, local: Transform) -> bool {
        match self.entities.get_mut(&id) {
            Some(data) => {
                data.local = local;
                true
            }
            None => false,
        }
    }

    /// Distance between two entities' world positions.
    pub fn distance(&self, a: EntityId, b: EntityId) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    pub fn add_tag(&mut self, id: EntityId, tag: impl Into<String>) -> bool {
        match self.entities.get_mut(&id) {
            Some(data) => data.tags.insert(tag.into()),
            None => false,
        }
    }

    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|d| d.tags.contains(tag))
    }

    pub fn set_collider(&mut self, id: EntityId, collider: Collider) -> bool {
        match self.entities.get_mut(&id) {
            Some(data) => {
                data.collider = Some(collider);
                true
            }
            None => false,
        }
    }

    pub fn motion_enabled(&self, id: EntityId) -> Option<bool> {
        self.entities.get(&id).map(|d| d.motion_enabled)
    }

    /// Hand an entity's motion to (or take it from) the physics provider.
    pub fn set_motion_enabled(&mut self, id: EntityId, enabled: bool) -> bool {
        let Some(data) = self.entities.get_mut(&id) else {
            return false;
        };
        if data.motion_enabled != enabled {
            data.motion_enabled = enabled;
            self.log(WorldEvent::MotionChanged { id, enabled });
        }
        true
    }

    /// Attach the interactable capability to an existing entity.
    pub fn add_interactable(
        &mut self,
        id: EntityId,
        interactable: Interactable,
    ) -> Result<(), WorldError> {
        if !self.contains(id) {
            return Err(WorldError::EntityNotFound(id));
        }
        if self.interactables.contains_key(&id) {
            return Err(WorldError::CapabilityExists(id, "interactable"));
        }
        self.interactables.insert(id, interactable);
        Ok(())
    }

    /// Spawn a root entity carrying a hand. The entity is tagged `hands`.
    pub fn spawn_hand(&mut self, hand: Hand, transform: Transform) -> EntityId {
        let name = format!("{:?} hand", hand.side);
        let id = self.spawn(name, transform);
        self.add_tag(id, "hands");
        self.hands.insert(id, hand);
        id
    }

    pub fn interactable(&self, id: EntityId) -> Option<&Interactable> {
        self.interactables.get(&id)
    }

    pub fn grabbable(&self, id: EntityId) -> Option<&Grabbable> {
        self.grabbables.get(&id)
    }

    pub fn hand(&self, id: EntityId) -> Option<&Hand> {
        self.hands.get(&id)
    }

    /// Ids of all hands, in id order.
    pub fn hand_ids(&self) -> Vec<EntityId> {
        self.hands.keys().copied().collect()
    }

    pub fn grabbables(&self) -> &BTreeMap<EntityId, Grabbable> {
        &self.grabbables
    }

    pub fn interactables(&self) -> &BTreeMap<EntityId, Interactable> {
        &self.interactables
    }

    pub fn hands(&self) -> &BTreeMap<EntityId, Hand> {
        &self.hands
    }

    /// The interactable exposed by `id`'s root object: the root itself if it
    /// has one, otherwise the first descendant that does.
    pub fn interactable_of_root(&self, id: EntityId) -> Option<EntityId> {
        let root = self.root_of(id)?;
        self.descendants(root)
            .into_iter()
            .find(|e| self.interactables.contains_key(e))
    }

    /// The hand capability in `root`'s hierarchy, if any.
    pub fn hand_in_hierarchy(&self, root: EntityId) -> Option<EntityId> {
        self.descendants(root)
            .into_iter()
            .find(|e| self.hands.contains_key(e))
    }
}
