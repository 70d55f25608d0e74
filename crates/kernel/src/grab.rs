//! The acquire/release protocol between hands and grabbables.
//!
//! A grabbable is either free or held by exactly one hand, and a hand holds at
//! most one grabbable. The two sides of that link (`Grabbable::holder` and
//! `Hand::held`) are only ever written together, by the functions in this
//! module.

use handworks_common::EntityId;
use handworks_input::GrabInputMode;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::interactable::GrabRequest;
use crate::listener::GrabPhase;
use crate::world::{World, WorldEvent};

/// Capability marking an entity as something a hand can take hold of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grabbable {
    pub input_mode: GrabInputMode,
    pub(crate) interactable: Option<EntityId>,
    pub(crate) holder: Option<EntityId>,
}

impl Grabbable {
    /// The interactable that decides whether grabs on this point succeed.
    pub fn interactable(&self) -> Option<EntityId> {
        self.interactable
    }

    /// The hand holding this grabbable, if any.
    pub fn holder(&self) -> Option<EntityId> {
        self.holder
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }
}

/// Result of an acquire or release attempt.
///
/// Only `Acquired` and `Released` change state. Everything else is an expected,
/// silent outcome; a hand will simply try again next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    Acquired,
    Released,
    /// The hand already holds this grabbable.
    AlreadyHeld,
    /// The hand's input does not satisfy the grabbable's input mode.
    InputInactive,
    /// Another hand holds the grabbable.
    HeldElsewhere,
    /// The hand already holds a different grabbable.
    HandBusy,
    /// The grabbable is not held by this hand.
    NotHeld,
    /// The interactable is missing, disabled, or its authority said no.
    Denied,
    /// A referenced hand or grabbable no longer exists.
    Stale,
}

impl GrabOutcome {
    /// Whether the attempt changed ownership.
    pub fn changed(self) -> bool {
        matches!(self, Self::Acquired | Self::Released)
    }
}

impl World {
    /// Mark `id` as a grab point of `interactable` (or of nothing).
    ///
    /// A grab point with no interactable can never be acquired.
    pub fn add_grabbable(
        &mut self,
        id: EntityId,
        input_mode: GrabInputMode,
        interactable: Option<EntityId>,
    ) -> Result<(), WorldError> {
        if !self.contains(id) {
            return Err(WorldError::EntityNotFound(id));
        }
        if self.grabbables.contains_key(&id) {
            return Err(WorldError::CapabilityExists(id, "grabbable"));
        }
        if let Some(owner) = interactable {
            let Some(owner) = self.interactables.get_mut(&owner) else {
                return Err(if self.contains(owner) {
                    WorldError::NotInteractable(owner)
                } else {
                    WorldError::EntityNotFound(owner)
                });
            };
            owner.grab_points.push(id);
        }
        self.grabbables.insert(
            id,
            Grabbable {
                input_mode,
                interactable,
                holder: None,
            },
        );
        Ok(())
    }

    pub fn is_held(&self, grabbable: EntityId) -> bool {
        self.grabbables
            .get(&grabbable)
            .is_some_and(Grabbable::is_held)
    }

    pub fn held_by(&self, grabbable: EntityId) -> Option<EntityId> {
        self.grabbables.get(&grabbable).and_then(|g| g.holder)
    }

    pub fn input_mode(&self, grabbable: EntityId) -> Option<GrabInputMode> {
        self.grabbables.get(&grabbable).map(|g| g.input_mode)
    }

    /// Try to have `hand` take hold of `grabbable`.
    ///
    /// Checks, in order: liveness, whether the hand already holds it, the
    /// hand's live input against the grabbable's mode, arbitration with other
    /// hands, and finally the interactable's authority. Listeners hear
    /// `on_grab_start` only after both sides of the link are written.
    pub fn attempt_acquire(&mut self, grabbable: EntityId, hand: EntityId) -> GrabOutcome {
        let (Some(g), Some(h)) = (self.grabbables.get(&grabbable), self.hands.get(&hand)) else {
            return GrabOutcome::Stale;
        };
        if h.held == Some(grabbable) {
            return GrabOutcome::AlreadyHeld;
        }
        if !h.controller.is_down(g.input_mode, self.config.deadzone) {
            return GrabOutcome::InputInactive;
        }
        if g.holder.is_some() {
            tracing::trace!(%grabbable, %hand, "grab refused: held by another hand");
            return GrabOutcome::HeldElsewhere;
        }
        if h.held.is_some() {
            return GrabOutcome::HandBusy;
        }
        let Some(owner) = g.interactable else {
            return GrabOutcome::Denied;
        };
        let Some(interactable) = self.interactables.get_mut(&owner) else {
            return GrabOutcome::Denied;
        };
        let request = GrabRequest {
            interactable: owner,
            grabbable,
            hand,
        };
        if !interactable.enabled || !interactable.authority.allow_grab(&request) {
            tracing::trace!(%grabbable, %hand, "grab denied by interactable");
            return GrabOutcome::Denied;
        }

        if let Some(g) = self.grabbables.get_mut(&grabbable) {
            g.holder = Some(hand);
        }
        if let Some(h) = self.hands.get_mut(&hand) {
            h.held = Some(grabbable);
            h.model_anchor = Some(grabbable);
        }
        self.log(WorldEvent::GrabStarted {
            grabbable,
            interactable: owner,
            hand,
        });
        tracing::debug!(%grabbable, interactable = %owner, %hand, "grab started");
        self.notify_grab(GrabPhase::Start, owner, hand);
        GrabOutcome::Acquired
    }

    /// Try to have `hand` let go of `grabbable`. The authority may veto, in
    /// which case the hold persists.
    pub fn attempt_release(&mut self, grabbable: EntityId, hand: EntityId) -> GrabOutcome {
        let Some(g) = self.grabbables.get(&grabbable) else {
            return GrabOutcome::Stale;
        };
        if !self.hands.contains_key(&hand) {
            return GrabOutcome::Stale;
        }
        if g.holder != Some(hand) {
            return GrabOutcome::NotHeld;
        }
        if let Some(owner) = g.interactable {
            if let Some(interactable) = self.interactables.get_mut(&owner) {
                let request = GrabRequest {
                    interactable: owner,
                    grabbable,
                    hand,
                };
                if !interactable.authority.allow_release(&request) {
                    tracing::trace!(%grabbable, %hand, "release vetoed by interactable");
                    return GrabOutcome::Denied;
                }
            }
        }
        self.finish_release(grabbable, hand, false);
        GrabOutcome::Released
    }

    /// Release whatever `hand` holds. A hand holding nothing is a no-op.
    pub fn release_held(&mut self, hand: EntityId) -> GrabOutcome {
        let Some(h) = self.hands.get(&hand) else {
            return GrabOutcome::Stale;
        };
        let Some(held) = h.held else {
            return GrabOutcome::NotHeld;
        };
        if !self.grabbables.contains_key(&held) {
            // Dangling reference; repair the hand side.
            if let Some(h) = self.hands.get_mut(&hand) {
                h.held = None;
                h.model_anchor = None;
            }
            return GrabOutcome::Stale;
        }
        self.attempt_release(held, hand)
    }

    /// Release `grabbable` without consulting its authority.
    ///
    /// Used for teardown. Returns whether a hold was actually broken.
    pub fn force_release(&mut self, grabbable: EntityId) -> bool {
        let Some(hand) = self.held_by(grabbable) else {
            return false;
        };
        self.finish_release(grabbable, hand, true);
        true
    }

    /// Force-release every grab point of an interactable.
    pub fn clear_all_interactions(&mut self, interactable: EntityId) -> usize {
        let points = match self.interactables.get(&interactable) {
            Some(i) => i.grab_points.clone(),
            None => return 0,
        };
        points
            .into_iter()
            .filter(|point| self.force_release(*point))
            .count()
    }

    fn finish_release(&mut self, grabbable: EntityId, hand: EntityId, forced: bool) {
        let interactable = match self.grabbables.get_mut(&grabbable) {
            Some(g) => {
                g.holder = None;
                g.interactable
            }
            None => None,
        };
        if let Some(h) = self.hands.get_mut(&hand) {
            if h.held == Some(grabbable) {
                h.held = None;
                h.model_anchor = None;
            }
            h.hovered.retain(|g| *g != grabbable);
        }
        self.log(WorldEvent::GrabEnded {
            grabbable,
            interactable,
            hand,
            forced,
        });
        tracing::debug!(%grabbable, %hand, forced, "grab ended");
        if let Some(owner) = interactable.filter(|i| self.interactables.contains_key(i)) {
            self.notify_grab(GrabPhase::End, owner, hand);
        }
    }
}
