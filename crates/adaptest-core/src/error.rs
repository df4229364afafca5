//! Error types shared across the adaptest crates.
//!
//! Store implementations return [`StoreError`] so the orchestration layer can
//! tell a missing record apart from a backend failure without string matching.

use std::fmt;

use thiserror::Error;

/// The kind of record a store lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Item,
    Profile,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Item => write!(f, "item"),
            RecordKind::Profile => write!(f, "ability profile"),
        }
    }
}

/// Errors raised at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// The store could not be reached or is shutting down.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other failure reported by the backing store.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a missing item.
    pub fn item_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind: RecordKind::Item,
            id: id.into(),
        }
    }

    /// Shorthand for a missing ability profile.
    pub fn profile_not_found(examinee_id: &str, scale_id: &str) -> Self {
        StoreError::NotFound {
            kind: RecordKind::Profile,
            id: format!("{examinee_id}/{scale_id}"),
        }
    }

    /// Returns `true` if this error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Item parameters that violate the 3PL constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("discrimination must be positive and finite, got {0}")]
    Discrimination(f64),

    #[error("difficulty must be finite, got {0}")]
    Difficulty(f64),

    #[error("guessing must lie in [0, 1), got {0}")]
    Guessing(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_record() {
        let err = StoreError::profile_not_found("alice", "algebra");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "ability profile not found: alice/algebra");

        let err = StoreError::item_not_found("q-17");
        assert_eq!(err.to_string(), "item not found: q-17");
    }

    #[test]
    fn backend_errors_are_not_lookup_misses() {
        assert!(!StoreError::Backend("disk full".into()).is_not_found());
        assert!(!StoreError::Unavailable("closed".into()).is_not_found());
    }
}
