//! Error taxonomy shared by every engine component.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Error taxonomy of the tree engine.
///
/// `Configuration` and `Conflict` are raised at plan time, before any
/// boundary shift executes. `Storage` errors surfacing mid-mutation abort
/// the enclosing transaction; the engine never retries a partially applied
/// shift sequence.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The forest configuration cannot support the requested operation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The operation is not valid in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The operation would violate a structural precondition.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Propagated failure from the backing store.
    #[error("storage error: {0}")]
    Storage(String),
    /// A required row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A row field is missing or carries an unexpected type.
    #[error("field `{field}` is missing or not {expected}")]
    FieldType {
        /// Name of the offending field.
        field: String,
        /// Expected scalar type.
        expected: &'static str,
    },
}
