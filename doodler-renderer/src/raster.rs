//! Owned RGBA pixel buffer.
//!
//! [`Raster`] wraps a tiny-skia [`Pixmap`]. Pixels are stored premultiplied;
//! the accessors that take or return straight RGBA say so.

use std::fmt;

use tiny_skia::{
    Color, ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, PremultipliedColorU8, Transform,
};

use crate::error::{RenderError, RenderResult};

/// A fixed-size RGBA raster.
#[derive(Clone)]
pub struct Raster {
    pixmap: Pixmap,
}

impl Raster {
    /// Allocate a fully transparent raster.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Allocation`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })?;
        Ok(Self { pixmap })
    }

    /// Allocate a raster filled with one straight RGBA color.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Allocation`] if either dimension is zero.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> RenderResult<Self> {
        let mut raster = Self::new(width, height)?;
        raster.fill(rgba);
        Ok(raster)
    }

    /// Allocate an opaque white raster.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Allocation`] if either dimension is zero.
    pub fn white(width: u32, height: u32) -> RenderResult<Self> {
        Self::filled(width, height, doodler_core::color::WHITE)
    }

    /// Build a raster from straight (non-premultiplied) RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Allocation`] for zero dimensions and
    /// [`RenderError::Decode`] if `data` is not `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> RenderResult<Self> {
        let size =
            IntSize::from_wh(width, height).ok_or(RenderError::Allocation { width, height })?;
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(RenderError::Decode(format!(
                "expected {} bytes for {width}x{height}, got {}",
                (width as usize) * (height as usize) * 4,
                data.len()
            )));
        }
        for px in data.chunks_exact_mut(4) {
            let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            px.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let pixmap = Pixmap::from_vec(data, size).ok_or(RenderError::Allocation { width, height })?;
        Ok(Self { pixmap })
    }

    /// Straight (non-premultiplied) RGBA bytes, row-major.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Underlying pixmap.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Underlying pixmap, mutably.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Premultiplied bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Premultiplied bytes, row-major, mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_mut()
    }

    /// Overwrite every pixel with a straight RGBA color.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        self.pixmap
            .fill(Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    }

    /// Straight RGBA value of one pixel.
    ///
    /// Returns `None` outside the raster.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Overwrite one pixel with a straight RGBA color.
    ///
    /// Returns `false` if the coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        let c = ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
        let idx = (y as usize * self.width() as usize + x as usize) * 4;
        self.pixmap.data_mut()[idx..idx + 4].copy_from_slice(&[
            c.red(),
            c.green(),
            c.blue(),
            c.alpha(),
        ]);
        true
    }

    /// Source-over blend a straight RGBA color at partial coverage.
    ///
    /// Out-of-bounds coordinates are ignored.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn blend_pixel(&mut self, x: i32, y: i32, rgba: [u8; 4], coverage: f32) {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return;
        }
        let alpha = (f32::from(rgba[3]) / 255.0) * coverage.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let idx = (y as usize * self.width() as usize + x as usize) * 4;
        let px = &mut self.pixmap.data_mut()[idx..idx + 4];
        let inv = 1.0 - alpha;
        for c in 0..3 {
            let src = f32::from(rgba[c]) * alpha;
            px[c] = f32::from(px[c]).mul_add(inv, src).round().min(255.0) as u8;
        }
        px[3] = f32::from(px[3]).mul_add(inv, alpha * 255.0).round().min(255.0) as u8;
    }

    /// Replace this raster's pixels with `other`'s.
    ///
    /// Same-size rasters are copied byte for byte. Otherwise this raster is
    /// cleared and `other` is drawn at the origin, cropped or padded with
    /// transparency.
    pub fn copy_from(&mut self, other: &Raster) {
        if self.width() == other.width() && self.height() == other.height() {
            self.pixmap.data_mut().copy_from_slice(other.pixmap.data());
        } else {
            self.pixmap.fill(Color::TRANSPARENT);
            self.draw(other, 0, 0);
        }
    }

    /// Source-over composite `src` with its top-left at `(x, y)`.
    pub fn draw(&mut self, src: &Raster, x: i32, y: i32) {
        self.pixmap.draw_pixmap(
            x,
            y,
            src.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Source-over composite `src` scaled into the box `(x, y, width, height)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn draw_scaled(&mut self, src: &Raster, x: f32, y: f32, width: f32, height: f32) {
        if src.width() == 0 || src.height() == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }
        let sx = width / src.width() as f32;
        let sy = height / src.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            src.pixmap.as_ref(),
            &paint,
            Transform::from_row(sx, 0.0, 0.0, sy, x, y),
            None,
        );
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    /// Number of pixels whose premultiplied value differs from `other`'s.
    ///
    /// Rasters of different sizes compare as entirely different.
    #[must_use]
    pub fn diff_count(&self, other: &Raster) -> usize {
        if self.width() != other.width() || self.height() != other.height() {
            return self.pixmap.pixels().len().max(other.pixmap.pixels().len());
        }
        self.pixmap
            .pixels()
            .iter()
            .zip(other.pixmap.pixels())
            .filter(|(a, b)| a != b)
            .count()
    }

    pub(crate) fn premultiplied(rgba: [u8; 4]) -> PremultipliedColorU8 {
        ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply()
    }
}

impl PartialEq for Raster {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.pixmap.data() == other.pixmap.data()
    }
}

impl Eq for Raster {}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}
