//! Slide action and the slide release button.
//!
//! Both hang off one interactable's completion value: 0 is slide forward, 1
//! is slide locked back.

use handworks_common::{EntityId, almost_eq};
use handworks_input::{Button, TickContext};
use handworks_kernel::{CompletionListener, System, World};
use serde::{Deserialize, Serialize};

use crate::breech::Breech;

/// Tolerance used when asking whether the slide is fully back or home.
pub const DEFAULT_TOLERANCE: f32 = 1e-4;

/// Feeds when the slide closes and ejects when it locks back.
///
/// Reacts only to crossings: a completion change that starts and ends at the
/// same end of travel does nothing, and an unchanged value never reaches a
/// listener in the first place.
#[derive(Debug)]
pub struct SlideAction<B: Breech> {
    breech: B,
    tolerance: f32,
    feeds: u32,
    ejects: u32,
}

impl<B: Breech> SlideAction<B> {
    pub fn new(breech: B) -> Self {
        Self {
            breech,
            tolerance: DEFAULT_TOLERANCE,
            feeds: 0,
            ejects: 0,
        }
    }

    pub fn breech(&self) -> &B {
        &self.breech
    }

    /// Feed events seen so far, whether or not a round was chambered.
    pub fn feeds(&self) -> u32 {
        self.feeds
    }

    /// Eject events seen so far.
    pub fn ejects(&self) -> u32 {
        self.ejects
    }
}

impl<B: Breech> CompletionListener for SlideAction<B> {
    fn on_completion_changed(
        &mut self,
        _world: &mut World,
        interactable: EntityId,
        before: f32,
        after: f32,
    ) {
        let home = |v: f32| almost_eq(v, 0.0, self.tolerance);
        let back = |v: f32| almost_eq(v, 1.0, self.tolerance);

        if home(after) && !home(before) {
            self.feeds += 1;
            let chambered = self.breech.try_feed_from_magazine();
            tracing::info!(%interactable, chambered, "slide home: feed");
        }
        if back(after) && !back(before) {
            self.ejects += 1;
            let ejected = self.breech.try_eject_from_chamber();
            tracing::info!(%interactable, ejected, "slide back: eject");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideReleaseConfig {
    pub button: Button,
    pub tolerance: f32,
}

impl Default for SlideReleaseConfig {
    fn default() -> Self {
        Self {
            button: Button::Primary,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Slide release lever: while the slide is locked back, pressing the release
/// button on the hand holding the weapon sends it home.
#[derive(Debug, Clone)]
pub struct SlideRelease {
    interactable: EntityId,
    /// The grab point whose holder works the lever (usually the pistol grip).
    input_grab_point: EntityId,
    config: SlideReleaseConfig,
}

impl SlideRelease {
    pub fn new(interactable: EntityId, input_grab_point: EntityId) -> Self {
        Self::with_config(interactable, input_grab_point, SlideReleaseConfig::default())
    }

    pub fn with_config(
        interactable: EntityId,
        input_grab_point: EntityId,
        config: SlideReleaseConfig,
    ) -> Self {
        Self {
            interactable,
            input_grab_point,
            config,
        }
    }

    pub fn is_pulled(&self, world: &World) -> bool {
        world
            .completion(self.interactable)
            .is_some_and(|c| almost_eq(c, 1.0, self.config.tolerance))
    }

    /// The hand holding the input grab point, if any.
    pub fn hand(&self, world: &World) -> Option<EntityId> {
        world.held_by(self.input_grab_point)
    }

    /// Lock the slide back without going through the interactable's authority.
    pub fn pull_manually(&self, world: &mut World) -> bool {
        world.force_set_completion(self.interactable, 1.0)
    }
}

impl System for SlideRelease {
    fn update(&mut self, world: &mut World, _ctx: &TickContext) {
        let Some(hand) = self.hand(world) else {
            return;
        };
        let pressed = world
            .hand(hand)
            .is_some_and(|h| h.controller().is_pressed(self.config.button));
        if pressed && self.is_pulled(world) && world.request_completion(self.interactable, 0.0) {
            tracing::debug!(interactable = %self.interactable, %hand, "slide released");
        }
    }
}
