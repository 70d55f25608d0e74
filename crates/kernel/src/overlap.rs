use std::collections::BTreeSet;

use handworks_common::EntityId;

use crate::world::World;

/// Proximity notification produced by [`OverlapTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEvent {
    Entered { volume: EntityId, other: EntityId },
    Exited { volume: EntityId, other: EntityId },
}

/// Derives enter/exit notifications from the world's sphere colliders.
///
/// Stands in for a physics provider's trigger callbacks. A pair is reported
/// when a trigger collider overlaps any collider outside its own hierarchy.
#[derive(Debug, Default)]
pub struct OverlapTracker {
    contacts: BTreeSet<(EntityId, EntityId)>,
}

impl OverlapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs currently overlapping, as `(volume, other)`.
    pub fn contacts(&self) -> &BTreeSet<(EntityId, EntityId)> {
        &self.contacts
    }

    /// Compare this tick's overlaps with the last and report the difference.
    /// Exits are reported before enters.
    pub fn update(&mut self, world: &World) -> Vec<OverlapEvent> {
        let spheres: Vec<_> = world
            .entities()
            .iter()
            .filter_map(|(id, data)| {
                let collider = data.collider?;
                Some((*id, world.position(*id)?, collider, world.root_of(*id)?))
            })
            .collect();

        let mut current = BTreeSet::new();
        for (volume, vpos, vcol, vroot) in &spheres {
            if !vcol.is_trigger {
                continue;
            }
            for (other, opos, ocol, oroot) in &spheres {
                if other == volume || oroot == vroot {
                    continue;
                }
                if vpos.distance(*opos) < vcol.radius + ocol.radius {
                    current.insert((*volume, *other));
                }
            }
        }

        let mut events: Vec<OverlapEvent> = self
            .contacts
            .difference(&current)
            .map(|(volume, other)| OverlapEvent::Exited {
                volume: *volume,
                other: *other,
            })
            .collect();
        events.extend(
            current
                .difference(&self.contacts)
                .map(|(volume, other)| OverlapEvent::Entered {
                    volume: *volume,
                    other: *other,
                }),
        );
        self.contacts = current;
        events
    }
}
