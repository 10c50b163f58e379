//! # Doodler Renderer
//!
//! CPU rasterization for the Doodler canvas, built on tiny-skia.
//!
//! ## Primitives
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Raster                    │
//! ├──────────────┬──────────────┬───────────────┤
//! │ Brush/Eraser │ Shapes       │ Flood Fill    │
//! │ (segments)   │ (replayed)   │ (4-connected) │
//! ├──────────────┴──────────────┴───────────────┤
//! │ Text (ab_glyph)  │  PNG data URLs / export  │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod brush;
pub mod error;
pub mod export;
pub mod fill;
pub mod image;
pub mod raster;
pub mod shape;
pub mod text;

pub use brush::{BrushKind, FreehandStroke, GAP_THRESHOLD};
pub use error::{RenderError, RenderResult};
pub use export::{download_filename, export_history_item, write_png};
pub use fill::flood_fill;
pub use image::{
    composite_fitted, decode_data_url, decode_image_bytes, downscale_to_max, encode_png_data_url,
    FitPolicy, Placement,
};
pub use raster::Raster;
pub use shape::{draw_shape, ShapeKind, ShapeStyle};
#[cfg(feature = "text")]
pub use text::GlyphTextRenderer;
pub use text::TextRenderer;
