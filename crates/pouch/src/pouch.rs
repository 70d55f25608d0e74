use handworks_common::{EntityId, exp_smoothing};
use handworks_input::TickContext;
use handworks_kernel::{GrabListener, System, World};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PouchConfig {
    /// Released objects closer than this (strictly) are stowed.
    pub radius: f32,
    /// Exponential approach rate, per second.
    pub lerp_speed: f32,
}

impl Default for PouchConfig {
    fn default() -> Self {
        Self {
            radius: 4.0,
            lerp_speed: 10.0,
        }
    }
}

/// Single-slot holster near the player.
///
/// Listens to grabs world-wide: an object released near the pouch while it is
/// empty is stowed and pulled in every tick, and grabbing the stowed object
/// again takes it back out.
#[derive(Debug, Clone)]
pub struct PlayerPouch {
    pouch: EntityId,
    held: Option<EntityId>,
    config: PouchConfig,
}

impl PlayerPouch {
    pub fn new(pouch: EntityId) -> Self {
        Self::with_config(pouch, PouchConfig::default())
    }

    pub fn with_config(pouch: EntityId, config: PouchConfig) -> Self {
        Self {
            pouch,
            held: None,
            config,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.pouch
    }

    /// The stowed object's root, if any.
    pub fn held(&self) -> Option<EntityId> {
        self.held
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_none()
    }

    pub fn config(&self) -> &PouchConfig {
        &self.config
    }

    fn evict(&mut self, world: &mut World, reason: &str) {
        if let Some(object) = self.held.take() {
            world.set_motion_enabled(object, true);
            tracing::info!(pouch = %self.pouch, %object, reason, "pouch emptied");
        }
    }
}

impl GrabListener for PlayerPouch {
    fn on_grab_start(&mut self, world: &mut World, interactable: EntityId, _hand: EntityId) {
        if self.held == Some(interactable) {
            self.evict(world, "taken");
        }
    }

    fn on_grab_end(&mut self, world: &mut World, interactable: EntityId, _hand: EntityId) {
        if let Some(held) = self.held {
            if world.contains(held) && !world.is_despawning(held) {
                return;
            }
            self.held = None;
            tracing::info!(pouch = %self.pouch, object = %held, "stowed object is gone");
        }
        if world.is_despawning(interactable) {
            return;
        }
        let Some(distance) = world.distance(interactable, self.pouch) else {
            return;
        };
        if distance >= self.config.radius {
            return;
        }
        self.held = Some(interactable);
        world.set_motion_enabled(interactable, false);
        tracing::info!(pouch = %self.pouch, object = %interactable, distance, "stowed in pouch");
    }
}

impl System for PlayerPouch {
    fn update(&mut self, world: &mut World, ctx: &TickContext) {
        let Some(object) = self.held else {
            return;
        };
        let (Some(target), Some(current)) = (world.transform(self.pouch), world.transform(object))
        else {
            self.evict(world, "gone");
            return;
        };
        let t = exp_smoothing(self.config.lerp_speed, ctx.delta);
        let mut next = current;
        next.position = current.position.lerp(target.position, t);
        next.rotation = current.rotation.slerp(target.rotation, t);
        world.set_transform(object, next);
    }
}
