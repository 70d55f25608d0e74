//! Shared types for the handworks crates: entity ids, transforms, hand sides.

pub mod types;

pub use types::{EntityId, FORWARD, HandSide, RIGHT, Transform, almost_eq, exp_smoothing};
