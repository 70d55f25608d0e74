use glam::Vec3;
use handworks_common::{EntityId, HandSide};
use handworks_kernel::{Hand, World};

/// Grab inspector for developer tooling.
///
/// Read-only queries against the world for debugging and test assertions.
pub struct GrabInspector;

impl GrabInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        WorldSummary {
            tick: world.tick(),
            entity_count: world.entity_count(),
            hands: world.hands().len(),
            grabbables: world.grabbables().len(),
            held: world.grabbables().values().filter(|g| g.is_held()).count(),
            interactables: world.interactables().len(),
            pending_events: world.events().len(),
        }
    }

    pub fn inspect_hand(world: &World, id: EntityId) -> Option<HandInfo> {
        let hand = world.hand(id)?;
        Some(HandInfo {
            id,
            side: hand.side,
            is_local: hand.is_local,
            position: world.position(id).unwrap_or(Vec3::ZERO),
            velocity: hand.velocity(),
            hovered: hand.hovered().to_vec(),
            held: hand.held(),
        })
    }

    pub fn list_hands(world: &World) -> Vec<HandInfo> {
        world
            .hand_ids()
            .into_iter()
            .filter_map(|id| Self::inspect_hand(world, id))
            .collect()
    }

    /// Walk both sides of every hold link and report anything that does not
    /// point back.
    pub fn check_ownership(world: &World) -> Vec<OwnershipViolation> {
        let mut out = Vec::new();
        for (hand_id, hand) in world.hands() {
            let Some(held) = hand.held() else {
                continue;
            };
            match world.grabbable(held) {
                None => out.push(OwnershipViolation::DanglingHold {
                    hand: *hand_id,
                    grabbable: held,
                }),
                Some(g) if g.holder() != Some(*hand_id) => {
                    out.push(OwnershipViolation::UnreturnedHold {
                        hand: *hand_id,
                        grabbable: held,
                        holder: g.holder(),
                    })
                }
                Some(_) => {}
            }
        }
        for (id, grabbable) in world.grabbables() {
            let Some(holder) = grabbable.holder() else {
                continue;
            };
            if world.hand(holder).and_then(Hand::held) != Some(*id) {
                out.push(OwnershipViolation::OrphanedHolder {
                    grabbable: *id,
                    hand: holder,
                });
            }
        }
        for violation in &out {
            tracing::warn!(%violation, "ownership audit");
        }
        out
    }
}

/// A broken hold link found by [`GrabInspector::check_ownership`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipViolation {
    #[error("hand {hand} holds missing grabbable {grabbable}")]
    DanglingHold { hand: EntityId, grabbable: EntityId },

    #[error("hand {hand} holds {grabbable}, which names {holder:?} as its holder")]
    UnreturnedHold {
        hand: EntityId,
        grabbable: EntityId,
        holder: Option<EntityId>,
    },

    #[error("grabbable {grabbable} names {hand} as holder, but that hand does not hold it")]
    OrphanedHolder { grabbable: EntityId, hand: EntityId },
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub tick: u64,
    pub entity_count: usize,
    pub hands: usize,
    pub grabbables: usize,
    pub held: usize,
    pub interactables: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: tick={} entities={} hands={} grabbables={} held={} interactables={} pending_events={}",
            self.tick,
            self.entity_count,
            self.hands,
            self.grabbables,
            self.held,
            self.interactables,
            self.pending_events
        )
    }
}

#[derive(Debug, Clone)]
pub struct HandInfo {
    pub id: EntityId,
    pub side: HandSide,
    pub is_local: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub hovered: Vec<EntityId>,
    pub held: Option<EntityId>,
}

impl std::fmt::Display for HandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let held = self
            .held
            .map_or_else(|| "-".to_owned(), |id| id.to_string());
        write!(
            f,
            "Hand {} {:?}{} pos=({:.2}, {:.2}, {:.2}) hovering={} held={}",
            self.id,
            self.side,
            if self.is_local { "" } else { " (remote)" },
            self.position.x,
            self.position.y,
            self.position.z,
            self.hovered.len(),
            held,
        )
    }
}
