//! Input contract: abstract per-hand controller readings and the per-tick context.
//!
//! # Invariants
//! - Analog readings count as pressed only strictly above the deadzone.
//! - No device polling happens here; callers fill in a `TickContext` each tick.

pub mod context;
pub mod controller;

pub use context::TickContext;
pub use controller::{Button, ControllerState, DEFAULT_DEADZONE, GrabInputMode};
