//! Per-hand controller: pose tracking, hover set, candidate selection and the
//! pointer pickup path.

use glam::{Quat, Vec3};
use handworks_common::{EntityId, HandSide, RIGHT, Transform};
use handworks_input::{ControllerState, GrabInputMode, TickContext};

use crate::config::HoverExitPolicy;
use crate::grab::GrabOutcome;
use crate::spatial::SpatialQuery;
use crate::world::{World, WorldEvent};

/// Hand capability: one per tracked controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub side: HandSide,
    /// Remote hands only mirror their pose; they never grab.
    pub is_local: bool,
    /// Offset from the raw controller pose to where the palm actually is,
    /// authored for the right hand.
    pub grip_offset: Transform,
    pub(crate) velocity: Vec3,
    pub(crate) controller: ControllerState,
    /// Hovered grabbables in the order they were first touched.
    pub(crate) hovered: Vec<EntityId>,
    pub(crate) held: Option<EntityId>,
    pub(crate) model_anchor: Option<EntityId>,
}

impl Hand {
    pub fn new(side: HandSide) -> Self {
        Self {
            side,
            is_local: true,
            grip_offset: Transform::default(),
            velocity: Vec3::ZERO,
            controller: ControllerState::default(),
            hovered: Vec::new(),
            held: None,
            model_anchor: None,
        }
    }

    pub fn remote(side: HandSide) -> Self {
        Self {
            is_local: false,
            ..Self::new(side)
        }
    }

    pub fn with_grip_offset(mut self, offset: Transform) -> Self {
        self.grip_offset = offset;
        self
    }

    /// The grip offset for this hand's side. Left hands mirror it across the
    /// forward-up plane.
    pub fn side_grip_offset(&self) -> Transform {
        let m = self.side.mirror();
        let mut offset = self.grip_offset;
        let lateral = offset.position.dot(RIGHT);
        offset.position += RIGHT * (lateral * (m - 1.0));
        let r = offset.rotation;
        offset.rotation = Quat::from_xyzw(r.x * m, r.y, r.z * m, r.w);
        offset
    }

    /// Displacement since the previous tick.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Controller reading from the latest tick.
    pub fn controller(&self) -> &ControllerState {
        &self.controller
    }

    pub fn hovered(&self) -> &[EntityId] {
        &self.hovered
    }

    pub fn held(&self) -> Option<EntityId> {
        self.held
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    /// Grab point the hand model is attached to while holding.
    pub fn model_anchor(&self) -> Option<EntityId> {
        self.model_anchor
    }
}

impl World {
    /// Proximity notification: `other` entered the trigger volume `volume`.
    ///
    /// When the volume is a hand and `other` is a grabbable, it joins that
    /// hand's hover set.
    pub fn trigger_enter(&mut self, volume: EntityId, other: EntityId) {
        if !self.grabbables.contains_key(&other) {
            return;
        }
        let Some(hand) = self.hands.get_mut(&volume) else {
            return;
        };
        if hand.hovered.contains(&other) {
            return;
        }
        hand.hovered.push(other);
        self.log(WorldEvent::HoverEntered {
            hand: volume,
            grabbable: other,
        });
    }

    /// Proximity notification: `other` left the trigger volume `volume`.
    pub fn trigger_exit(&mut self, volume: EntityId, other: EntityId) {
        if self.config.hover_exit == HoverExitPolicy::Retain {
            return;
        }
        let Some(hand) = self.hands.get_mut(&volume) else {
            return;
        };
        let before = hand.hovered.len();
        hand.hovered.retain(|g| *g != other);
        if hand.hovered.len() != before {
            self.log(WorldEvent::HoverExited {
                hand: volume,
                grabbable: other,
            });
        }
    }

    /// Nearest hovered grabbable to the hand.
    ///
    /// Ties go to the grabbable that entered the hover set first.
    pub fn nearest_hovered(&self, hand: EntityId) -> Option<EntityId> {
        let h = self.hands.get(&hand)?;
        let origin = self.position(hand)?;
        let mut best: Option<(EntityId, f32)> = None;
        for id in &h.hovered {
            if !self.grabbables.contains_key(id) {
                continue;
            }
            let Some(pos) = self.position(*id) else {
                continue;
            };
            let d = pos.distance(origin);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((*id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Run one tick of a hand's acquisition logic.
    pub fn update_hand(&mut self, hand: EntityId, ctx: &TickContext, spatial: &dyn SpatialQuery) {
        let Some(h) = self.hands.get_mut(&hand) else {
            return;
        };
        let _span = tracing::trace_span!("hand", %hand, side = ?h.side).entered();
        let controller = *ctx.controller(h.side);
        h.controller = controller;
        let is_local = h.is_local;
        let pose = controller.pose.compose(&h.side_grip_offset());
        self.track_pose(hand, pose);

        if !is_local {
            return;
        }

        if self.hover_hold_out_of_reach(hand) {
            self.release_held(hand);
            return;
        }

        let candidate = self
            .hands
            .get(&hand)
            .and_then(|h| h.held)
            .filter(|g| self.grabbables.contains_key(g))
            .or_else(|| self.nearest_hovered(hand));

        let active = candidate
            .and_then(|g| self.input_mode(g))
            .is_some_and(|mode| controller.is_down(mode, self.config.deadzone));
        match candidate {
            Some(g) if active => {
                let outcome = self.attempt_acquire(g, hand);
                if outcome == GrabOutcome::Acquired {
                    tracing::debug!(%hand, grabbable = %g, "acquired nearest candidate");
                }
            }
            _ => {
                self.release_held(hand);
            }
        }

        let holding = self.hands.get(&hand).is_some_and(Hand::is_holding);
        if controller.is_trigger_down(self.config.deadzone) && !holding {
            self.pointer_pickup(hand, spatial);
        }
    }

    fn track_pose(&mut self, hand: EntityId, pose: Transform) {
        let previous = self.position(hand).unwrap_or(pose.position);
        self.set_transform(hand, pose);
        if let Some(h) = self.hands.get_mut(&hand) {
            h.velocity = pose.position - previous;
        }
    }

    /// A hover-mode hold drops once the object is beyond reach, whatever the
    /// buttons say.
    fn hover_hold_out_of_reach(&self, hand: EntityId) -> bool {
        let Some(held) = self.hands.get(&hand).and_then(|h| h.held) else {
            return false;
        };
        if self.input_mode(held) != Some(GrabInputMode::Hover) {
            return false;
        }
        self.distance(held, hand)
            .is_some_and(|d| d > self.config.hover_release_distance)
    }

    /// Long-range acquisition: cast forward from the pointer attachment and
    /// try the first grab point of whatever interactable the ray lands on.
    fn pointer_pickup(&mut self, hand: EntityId, spatial: &dyn SpatialQuery) -> Option<GrabOutcome> {
        let pointer = self.transform(hand)?.compose(&self.config.pointer_offset);
        let hit = spatial.ray_cast(
            self,
            pointer.position,
            pointer.forward(),
            self.config.pointer_range,
            self.root_of(hand),
        )?;
        let interactable = self.interactable_of_root(hit.entity)?;
        let grabbable = *self.interactables.get(&interactable)?.grab_points.first()?;
        let outcome = self.attempt_acquire(grabbable, hand);
        tracing::trace!(%hand, target = %hit.entity, ?outcome, "pointer pickup");
        Some(outcome)
    }
}
