use handworks_common::EntityId;

/// Errors from world setup operations.
///
/// Per-tick grab traffic never produces these; refused grabs are reported as
/// [`GrabOutcome`](crate::GrabOutcome) values instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("entity {0} is not an interactable")]
    NotInteractable(EntityId),
    #[error("entity {0} already has a {1} capability")]
    CapabilityExists(EntityId, &'static str),
}
