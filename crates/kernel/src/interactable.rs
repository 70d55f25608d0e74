use glam::Vec3;
use handworks_common::{EntityId, Transform};

use crate::listener::{CompletionListener, ListenerList};
use crate::world::{World, WorldEvent};

/// The grab being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabRequest {
    pub interactable: EntityId,
    pub grabbable: EntityId,
    pub hand: EntityId,
}

/// Policy deciding whether grabs, releases and guarded completion writes on
/// an interactable are honoured. Every method allows by default.
pub trait GrabAuthority: std::fmt::Debug {
    fn allow_grab(&mut self, _request: &GrabRequest) -> bool {
        true
    }

    fn allow_release(&mut self, _request: &GrabRequest) -> bool {
        true
    }

    fn allow_completion(&mut self, _before: f32, _after: f32) -> bool {
        true
    }
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl GrabAuthority for Permissive {}

/// Refuses every grab, release and guarded completion write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locked;

impl GrabAuthority for Locked {
    fn allow_grab(&mut self, _request: &GrabRequest) -> bool {
        false
    }

    fn allow_release(&mut self, _request: &GrabRequest) -> bool {
        false
    }

    fn allow_completion(&mut self, _before: f32, _after: f32) -> bool {
        false
    }
}

/// Grabs succeed but releases are always vetoed; only a forced release (or
/// teardown) frees the object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sticky;

impl GrabAuthority for Sticky {
    fn allow_release(&mut self, _request: &GrabRequest) -> bool {
        false
    }
}

/// Linear travel of a mechanism, in the interactable's local frame.
///
/// While one of the interactable's points is held, the completion value
/// follows the holding hand projected onto the segment `start..end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideTrack {
    pub start: Vec3,
    pub end: Vec3,
}

impl SlideTrack {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Fraction of travel for a world-space point, clamped to [0, 1].
    pub fn completion_at(&self, frame: &Transform, point: Vec3) -> f32 {
        let axis = self.end - self.start;
        let length_sq = axis.length_squared();
        if length_sq <= f32::EPSILON {
            return 0.0;
        }
        let local = frame.inverse_transform_point(point);
        ((local - self.start).dot(axis) / length_sq).clamp(0.0, 1.0)
    }
}

/// Authority over a world object's grab points, and owner of its completion
/// value.
#[derive(Debug)]
pub struct Interactable {
    pub(crate) enabled: bool,
    pub(crate) completion: f32,
    pub(crate) grab_points: Vec<EntityId>,
    pub(crate) authority: Box<dyn GrabAuthority>,
    pub(crate) track: Option<SlideTrack>,
    pub(crate) grab_listeners: ListenerList<dyn crate::listener::GrabListener>,
    pub(crate) completion_listeners: ListenerList<dyn CompletionListener>,
}

impl Default for Interactable {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactable {
    pub fn new() -> Self {
        Self::with_authority(Permissive)
    }

    pub fn with_authority(authority: impl GrabAuthority + 'static) -> Self {
        Self {
            enabled: true,
            completion: 0.0,
            grab_points: Vec::new(),
            authority: Box::new(authority),
            track: None,
            grab_listeners: ListenerList::default(),
            completion_listeners: ListenerList::default(),
        }
    }

    pub fn with_track(mut self, track: SlideTrack) -> Self {
        self.track = Some(track);
        self
    }

    pub fn with_completion(mut self, completion: f32) -> Self {
        self.completion = completion.clamp(0.0, 1.0);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn completion(&self) -> f32 {
        self.completion
    }

    /// Grab points in registration order.
    pub fn grab_points(&self) -> &[EntityId] {
        &self.grab_points
    }

    pub fn track(&self) -> Option<SlideTrack> {
        self.track
    }
}

impl World {
    pub fn set_interactable_enabled(&mut self, id: EntityId, enabled: bool) -> bool {
        match self.interactables.get_mut(&id) {
            Some(i) => {
                i.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn completion(&self, interactable: EntityId) -> Option<f32> {
        self.interactables.get(&interactable).map(|i| i.completion)
    }

    /// Write a completion value without consulting the authority.
    ///
    /// For scripted actions such as pulling a slide back programmatically.
    /// Returns whether the value changed.
    pub fn force_set_completion(&mut self, interactable: EntityId, value: f32) -> bool {
        self.write_completion(interactable, value)
    }

    /// Ask the interactable to move its completion value to `value`.
    ///
    /// Returns whether the value changed; a veto or an unchanged value both
    /// return `false`.
    pub fn request_completion(&mut self, interactable: EntityId, value: f32) -> bool {
        let Some(i) = self.interactables.get_mut(&interactable) else {
            return false;
        };
        let after = value.clamp(0.0, 1.0);
        if after == i.completion {
            return false;
        }
        if !i.authority.allow_completion(i.completion, after) {
            tracing::trace!(%interactable, after, "completion change vetoed");
            return false;
        }
        self.write_completion(interactable, after)
    }

    fn write_completion(&mut self, interactable: EntityId, value: f32) -> bool {
        if !value.is_finite() {
            tracing::warn!(%interactable, value, "ignoring non-finite completion value");
            return false;
        }
        let Some(i) = self.interactables.get_mut(&interactable) else {
            return false;
        };
        let before = i.completion;
        let after = value.clamp(0.0, 1.0);
        if before == after {
            return false;
        }
        i.completion = after;
        self.log(WorldEvent::CompletionChanged {
            interactable,
            before,
            after,
        });
        self.notify_completion(interactable, before, after);
        true
    }

    /// Drive every tracked interactable's completion from the hand holding
    /// one of its points.
    pub fn update_slide_tracks(&mut self) {
        let targets: Vec<(EntityId, f32)> = self
            .interactables
            .iter()
            .filter_map(|(id, i)| {
                let track = i.track?;
                let hand = i
                    .grab_points
                    .iter()
                    .find_map(|p| self.grabbables.get(p).and_then(|g| g.holder))?;
                let frame = self.transform(*id)?;
                let point = self.position(hand)?;
                Some((*id, track.completion_at(&frame, point)))
            })
            .collect();
        for (id, value) in targets {
            self.request_completion(id, value);
        }
    }
}
