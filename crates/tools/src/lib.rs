//! Developer tooling: read-only inspection of a grab world and an audit of
//! the single-ownership links between hands and grabbables.

pub mod inspector;

pub use inspector::{GrabInspector, HandInfo, OwnershipViolation, WorldSummary};
