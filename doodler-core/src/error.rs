//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// History item not found in the log.
    #[error("History item not found: {0}")]
    ItemNotFound(String),

    /// Invalid operation for the current tool or state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A color string could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required resource (surface, renderer, storage) is unavailable.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),
}
