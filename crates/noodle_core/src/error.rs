//! # Store Error Types
//!
//! All errors that can occur while reading or mutating a store.

use thiserror::Error;

use crate::element::ElementKind;
use crate::store::ElementId;

/// Errors that can occur in a store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No element with this ID lives in the store.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of element that was looked up.
        kind: ElementKind,
        /// The missing ID.
        id: ElementId,
    },

    /// A bucket chain could not grow to hold a new element.
    #[error("allocation failed while inserting {kind} {id}")]
    AllocationFailure {
        /// Kind of element being inserted.
        kind: ElementKind,
        /// ID already assigned to the element.
        id: ElementId,
    },
}

impl StoreError {
    /// Returns true for errors the process cannot recover from.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AllocationFailure { .. })
    }

    /// Returns true if this is a `NotFound` error.
    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
