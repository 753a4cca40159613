//! Core error types for CAPFLOW.
//!
//! The evaluation engine itself has no fatal error path; these errors
//! only arise when constructing or mutating a graph model.

use thiserror::Error;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Entity not found
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind
        kind: String,
        /// Entity id
        id: String,
    },

    /// Entity already exists
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Entity kind
        kind: String,
        /// Entity id
        id: String,
    },

    /// Validation error
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Why it failed
        reason: String,
    },
}
