//! # Identifier Registry
//!
//! Every element of every kind draws its ID from one shared counter, so no
//! two elements ever share an ID and an ID is never handed out twice while
//! the process runs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an element (entity, room, sprite or sound).
///
/// IDs start at 1. The zero value means "not yet registered".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Placeholder ID carried by elements that have not been added to a store.
    pub const UNASSIGNED: Self = Self(0);

    /// Wraps a raw ID value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw ID value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Checks whether this ID was assigned by a registry.
    #[inline]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Shared ID counter.
///
/// `next_id` is a single atomic increment, independent of any bucket lock,
/// so concurrent `add` calls on any of the four stores serialize only here.
#[derive(Debug, Default)]
pub struct IdRegistry {
    /// Largest ID handed out so far.
    max_id: AtomicU64,
}

impl IdRegistry {
    /// Creates a registry whose first ID will be 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_id: AtomicU64::new(0),
        }
    }

    /// Returns the previous maximum plus one and records it as the new maximum.
    #[inline]
    pub fn next_id(&self) -> ElementId {
        ElementId(self.max_id.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns the largest ID handed out so far (0 if none).
    #[inline]
    #[must_use]
    pub fn max_id(&self) -> ElementId {
        ElementId(self.max_id.load(Ordering::Acquire))
    }

    /// Returns the ID the next call to `next_id` would produce, assuming no
    /// other thread gets there first.
    #[inline]
    #[must_use]
    pub fn peek_next(&self) -> ElementId {
        ElementId(self.max_id.load(Ordering::Acquire) + 1)
    }
}
