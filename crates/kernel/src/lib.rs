//! Grab kernel: entity arena, hand controllers, the acquire/release protocol
//! and the listener fan-out that reports its outcomes.
//!
//! # Invariants
//! - A grabbable is held by at most one hand and a hand holds at most one
//!   grabbable; both sides of the link are written together by [`grab`].
//! - Refused grabs are expected outcomes, never errors, and never notify.
//! - Listeners observe state only after the transition they describe.
//! - Stale ids are no-ops.

pub mod config;
pub mod error;
pub mod grab;
pub mod hand;
pub mod interactable;
pub mod listener;
pub mod overlap;
pub mod simulation;
pub mod spatial;
pub mod world;

pub use config::{ConfigError, GrabConfig, HoverExitPolicy};
pub use error::WorldError;
pub use grab::{GrabOutcome, Grabbable};
pub use hand::Hand;
pub use interactable::{
    GrabAuthority, GrabRequest, Interactable, Locked, Permissive, SlideTrack, Sticky,
};
pub use listener::{CompletionListener, GrabListener, ListenerId, ListenerScope};
pub use overlap::{OverlapEvent, OverlapTracker};
pub use simulation::{Simulation, System};
pub use spatial::{Collider, RayHit, SpatialQuery, SphereCaster};
pub use world::{DEFAULT_EVENT_CAPACITY, EntityData, World, WorldEvent};
