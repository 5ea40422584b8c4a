//! # Entity — Lightweight Identifiers
//!
//! An [`Entity`] is just a number. It doesn't "contain" anything; the
//! [`Registry`](super::registry::Registry) maps entities to their components.
//!
//! ## Design: Sequential, Never Reused
//!
//! Many ECS implementations recycle slots and pair each index with a
//! generation counter so stale handles can be detected. We don't recycle at
//! all: ids start at `1` and grow by one per [`Registry::create_entity`]
//! call, for the whole lifetime of the registry.
//!
//! ```text
//! create → Entity(1)
//! create → Entity(2)
//! destroy Entity(1)
//! create → Entity(3)   ← 1 is never handed out again
//! ```
//!
//! A stale handle therefore can never alias a newer entity; lookups on it
//! simply fail. The cost is a `u32` id space per registry, which is plenty
//! for a single host session.
//!
//! Because ids only grow, ordering entities by id is the same as ordering them
//! by creation time. The registry relies on this for deterministic snapshots.
//!
//! [`Registry::create_entity`]: super::registry::Registry::create_entity

use std::fmt;
use std::num::NonZeroU32;

/// A lightweight handle to an entity in a [`Registry`](super::registry::Registry).
///
/// An `Entity` is only meaningful for the registry that created it. Handles
/// compare and order by id, which is creation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: NonZeroU32,
}

impl Entity {
    /// Returns the raw id. Always `>= 1`.
    pub fn id(self) -> u32 {
        self.id.get()
    }

    /// Build a handle from a raw id. Returns `None` for `0`, which no
    /// registry ever allocates.
    ///
    /// Handles built this way are not tied to a registry; operations on an id
    /// the registry doesn't track are no-ops.
    pub fn from_raw(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(|id| Self { id })
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Hands out entity ids.
///
/// ```text
/// next: 4      ← the id the next allocation returns
/// ```
///
/// There is no free list: ids are never recycled.
pub(crate) struct EntityAllocator {
    next: NonZeroU32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            next: NonZeroU32::MIN,
        }
    }

    /// Allocate a fresh [`Entity`].
    ///
    /// # Panics
    ///
    /// Panics if the `u32` id space is exhausted. Reusing an id would break
    /// the "never reused" guarantee, so there is no graceful fallback.
    pub fn allocate(&mut self) -> Entity {
        let id = self.next;
        self.next = id
            .checked_add(1)
            .unwrap_or_else(|| panic!("Entity id space exhausted after {}", id));
        Entity { id }
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek_next(&self) -> u32 {
        self.next.get()
    }

    /// Returns `true` if `entity` was handed out by this allocator at some
    /// point. Says nothing about whether it is still live.
    pub fn was_allocated(&self, entity: Entity) -> bool {
        entity.id < self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential_from_one() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        assert_eq!(e1.id(), 1);
        assert_eq!(e2.id(), 2);
        assert_eq!(alloc.peek_next(), 3);
    }

    #[test]
    fn ids_order_by_creation() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        let mut v = vec![c, a, b];
        v.sort();
        assert_eq!(v, vec![a, b, c]);
    }

    #[test]
    fn was_allocated_tracks_handed_out_ids() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        assert!(alloc.was_allocated(e1));
        assert!(!alloc.was_allocated(Entity::from_raw(2).unwrap()));
    }

    #[test]
    fn zero_is_not_an_entity() {
        assert!(Entity::from_raw(0).is_none());
        assert_eq!(Entity::from_raw(7).map(Entity::id), Some(7));
    }

    #[test]
    fn debug_and_display() {
        let e = Entity::from_raw(5).unwrap();
        assert_eq!(format!("{:?}", e), "Entity(5)");
        assert_eq!(format!("{}", e), "#5");
    }
}
