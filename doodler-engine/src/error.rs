//! Engine error types.

use doodler_core::{CanvasError, StoreError};
use doodler_renderer::RenderError;
use thiserror::Error;

use crate::bridge::BridgeError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the editing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid input, settings or state.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// Rasterization or image coding failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The history store failed where the failure cannot be swallowed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The generative edit failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A history entry's image could not be decoded.
    #[error("History item {id} could not be decoded: {source}")]
    Decode {
        /// Id of the corrupt entry.
        id: String,
        /// Underlying decode error.
        #[source]
        source: RenderError,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
