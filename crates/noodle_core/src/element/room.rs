//! # Rooms
//!
//! A room holds a screen's worth of entities, e.g. a pause menu or a level.
//! Only one room is active at a time and its entities are the ones updated
//! and drawn. Coordinates are relative to the room's top-left corner, and
//! entities may leave that area.
//!
//! A room lists entity IDs; it never owns entities. The entity store does.

use super::{Element, ElementKind};
use crate::store::ElementId;

/// A room.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Room {
    /// Assigned by the room store on `add`.
    id: ElementId,
    /// Entities placed in this room, in update order.
    entity_ids: Vec<ElementId>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
}

impl Room {
    /// Creates an unregistered room.
    #[must_use]
    pub const fn new(entity_ids: Vec<ElementId>, width: u32, height: u32) -> Self {
        Self {
            id: ElementId::UNASSIGNED,
            entity_ids,
            width,
            height,
        }
    }

    /// Returns the room's ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Returns the width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Sets the width in pixels.
    #[inline]
    pub fn set_width(&mut self, width: u32) {
        self.width = width;
    }

    /// Sets the height in pixels.
    #[inline]
    pub fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    /// Returns the entity IDs placed in this room.
    #[inline]
    #[must_use]
    pub fn entity_ids(&self) -> &[ElementId] {
        &self.entity_ids
    }

    /// Checks whether an entity is placed in this room.
    #[inline]
    #[must_use]
    pub fn holds(&self, entity: ElementId) -> bool {
        self.entity_ids.contains(&entity)
    }

    /// Appends an entity to the end of the update order.
    pub fn place(&mut self, entity: ElementId) {
        self.entity_ids.push(entity);
    }

    /// Removes every occurrence of an entity, keeping the order of the rest.
    ///
    /// Returns true if anything was removed.
    pub fn evict(&mut self, entity: ElementId) -> bool {
        let before = self.entity_ids.len();
        self.entity_ids.retain(|id| *id != entity);
        self.entity_ids.len() != before
    }

    /// Replaces the membership list.
    ///
    /// Returns the IDs that were in the old list but not the new one. Those
    /// entities are only no longer members; they still exist.
    pub fn replace_entities(&mut self, entity_ids: Vec<ElementId>) -> Vec<ElementId> {
        let old = std::mem::replace(&mut self.entity_ids, entity_ids);
        old.into_iter()
            .filter(|id| !self.entity_ids.contains(id))
            .collect()
    }
}

impl Element for Room {
    const KIND: ElementKind = ElementKind::Room;

    #[inline]
    fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    fn assign_id(&mut self, id: ElementId) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId::new).collect()
    }

    #[test]
    fn test_evict_keeps_order() {
        let mut room = Room::new(ids(&[1, 2, 3, 2, 4]), 100, 100);
        assert!(room.evict(ElementId::new(2)));
        assert_eq!(room.entity_ids(), ids(&[1, 3, 4]).as_slice());
        assert!(!room.evict(ElementId::new(9)));
    }

    #[test]
    fn test_replace_entities_reports_departures() {
        let mut room = Room::new(ids(&[1, 2, 3]), 10, 10);
        let departed = room.replace_entities(ids(&[3, 4]));
        assert_eq!(departed, ids(&[1, 2]));
        assert_eq!(room.entity_ids(), ids(&[3, 4]).as_slice());
        assert!(room.holds(ElementId::new(4)));
        assert!(!room.holds(ElementId::new(1)));
    }

    #[test]
    fn test_place_appends() {
        let mut room = Room::new(Vec::new(), 1, 1);
        room.place(ElementId::new(5));
        room.place(ElementId::new(6));
        assert_eq!(room.entity_ids(), ids(&[5, 6]).as_slice());
    }
}
