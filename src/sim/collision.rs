//! Collision resolver
//!
//! Hazards touch the actor by horizontal distance on the same lane; static
//! props touch it by sharing a cell. Both go through one generic scan that
//! stops at the first live entity in insertion order.

use super::state::{Actor, Hazard, PickupKind, Prop, PropKind, Slots};
use crate::Tuning;

/// What the actor ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    Hazard(usize),
    Obstacle(usize),
    Pickup { index: usize, kind: PickupKind },
}

/// Anything the actor can touch
pub trait Collider {
    fn touches(&self, actor: &Actor, tuning: &Tuning) -> bool;

    /// Contact reported for this entity at slot `index`
    fn contact(&self, index: usize) -> Contact;
}

impl Collider for Hazard {
    fn touches(&self, actor: &Actor, tuning: &Tuning) -> bool {
        self.lane == actor.cell.row && (actor.x() - self.x).abs() < tuning.hazard_contact_px
    }

    fn contact(&self, index: usize) -> Contact {
        Contact::Hazard(index)
    }
}

impl Collider for Prop {
    fn touches(&self, actor: &Actor, _tuning: &Tuning) -> bool {
        self.cell == actor.cell
    }

    fn contact(&self, index: usize) -> Contact {
        match self.kind {
            PropKind::Obstacle => Contact::Obstacle(index),
            PropKind::Pickup(kind) => Contact::Pickup { index, kind },
        }
    }
}

/// First live entity touching the actor. Slots marked for removal are skipped.
pub fn check_collision<T: Collider>(actor: &Actor, entities: &Slots<T>, tuning: &Tuning) -> Contact {
    entities
        .indexed()
        .find(|(_, entity)| entity.touches(actor, tuning))
        .map_or(Contact::None, |(index, entity)| entity.contact(index))
}
