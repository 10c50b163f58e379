//! Renderer error types.

use doodler_core::CanvasError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rasterization and image coding.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A pixel buffer could not be allocated (zero or oversized dimensions).
    #[error("Cannot allocate {width}x{height} raster")]
    Allocation {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Image bytes or a data URL could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A raster could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Resource loading failed (fonts, files).
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Invalid settings passed to a drawing primitive.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}
