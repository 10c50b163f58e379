//! Text rasterization.
//!
//! Drawing text needs a font, which a headless engine may not have. The
//! engine therefore holds an optional [`TextRenderer`]; committing text
//! without one is a resource error rather than a silent no-op.

use doodler_core::text::LINE_SPACING;
use doodler_core::Point;

use crate::error::RenderResult;
use crate::Raster;

/// Draws text runs onto a raster.
pub trait TextRenderer: Send + Sync {
    /// Draw a single line with its baseline starting at `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be shaped or drawn.
    fn draw_line(
        &self,
        raster: &mut Raster,
        line: &str,
        origin: Point,
        font_size: f32,
        font_family: &str,
        color: [u8; 4],
    ) -> RenderResult<()>;

    /// Draw multi-line text, one line per `\n`, spaced by
    /// [`LINE_SPACING`] times the font size.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`draw_line`](Self::draw_line).
    #[allow(clippy::cast_precision_loss)]
    fn draw_block(
        &self,
        raster: &mut Raster,
        text: &str,
        origin: Point,
        font_size: f32,
        font_family: &str,
        color: [u8; 4],
    ) -> RenderResult<()> {
        for (index, line) in text.split('\n').enumerate() {
            let y = (index as f32).mul_add(font_size * LINE_SPACING, origin.y);
            self.draw_line(
                raster,
                line,
                Point::new(origin.x, y),
                font_size,
                font_family,
                color,
            )?;
        }
        Ok(())
    }
}

#[cfg(feature = "text")]
pub use glyph::GlyphTextRenderer;

#[cfg(feature = "text")]
mod glyph {
    use std::path::Path;

    use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
    use doodler_core::Point;

    use crate::error::{RenderError, RenderResult};
    use crate::Raster;

    use super::TextRenderer;

    /// Outline-font text renderer backed by `ab_glyph`.
    ///
    /// One font face is loaded up front; the requested family name is only
    /// logged, since there is no system font lookup.
    #[derive(Clone)]
    pub struct GlyphTextRenderer {
        font: FontArc,
    }

    impl std::fmt::Debug for GlyphTextRenderer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("GlyphTextRenderer").finish_non_exhaustive()
        }
    }

    impl GlyphTextRenderer {
        /// Load a TrueType/OpenType font from bytes.
        ///
        /// # Errors
        ///
        /// Returns [`RenderError::Resource`] if the bytes are not a font.
        pub fn from_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
            let font = FontArc::try_from_vec(bytes)
                .map_err(|e| RenderError::Resource(format!("Invalid font: {e}")))?;
            Ok(Self { font })
        }

        /// Load a font file.
        ///
        /// # Errors
        ///
        /// Returns [`RenderError::Resource`] if the file cannot be read or parsed.
        pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
            let path = path.as_ref();
            let bytes = std::fs::read(path).map_err(|e| {
                RenderError::Resource(format!("Failed to read font {}: {e}", path.display()))
            })?;
            tracing::debug!("Loaded font from {}", path.display());
            Self::from_bytes(bytes)
        }
    }

    impl TextRenderer for GlyphTextRenderer {
        #[allow(clippy::cast_possible_truncation)]
        fn draw_line(
            &self,
            raster: &mut Raster,
            line: &str,
            origin: Point,
            font_size: f32,
            font_family: &str,
            color: [u8; 4],
        ) -> RenderResult<()> {
            tracing::trace!("Drawing {} chars at {font_size}px ({font_family})", line.len());
            let scale = PxScale::from(font_size);
            let scaled = self.font.as_scaled(scale);

            let mut caret = origin.x;
            let mut previous: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(prev) = previous {
                    caret += scaled.kern(prev, id);
                }
                let glyph = id.with_scale_and_position(scale, point(caret, origin.y));
                caret += scaled.h_advance(id);
                previous = Some(id);

                if let Some(outlined) = self.font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    let left = bounds.min.x.floor() as i32;
                    let top = bounds.min.y.floor() as i32;
                    outlined.draw(|gx, gy, coverage| {
                        #[allow(clippy::cast_possible_wrap)]
                        raster.blend_pixel(left + gx as i32, top + gy as i32, color, coverage);
                    });
                }
            }
            Ok(())
        }
    }
}
