//! Image codec and placement helpers.
//!
//! History entries and the generative endpoint exchange rasters as PNG data
//! URLs (`data:image/png;base64,...`). Imports and AI results arrive in any
//! format the `image` crate decodes.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::Raster;

/// How a raster is scaled into a differently shaped target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Scale to cover the whole target, cropping the overflow.
    #[default]
    Cover,
    /// Scale to fit entirely inside the target, leaving white margins.
    Contain,
}

/// A placement box in target coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

impl Placement {
    /// Center a `width`x`height` source in the target at `scale`.
    #[allow(clippy::cast_precision_loss)]
    fn centered(src_w: u32, src_h: u32, target_w: u32, target_h: u32, scale: f32) -> Self {
        let width = src_w as f32 * scale;
        let height = src_h as f32 * scale;
        Self {
            x: (target_w as f32 - width) / 2.0,
            y: (target_h as f32 - height) / 2.0,
            width,
            height,
        }
    }

    /// Placement of a source scaled by `policy` into the target, centered.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fit(src_w: u32, src_h: u32, target_w: u32, target_h: u32, policy: FitPolicy) -> Self {
        let sx = target_w as f32 / src_w.max(1) as f32;
        let sy = target_h as f32 / src_h.max(1) as f32;
        let scale = match policy {
            FitPolicy::Cover => sx.max(sy),
            FitPolicy::Contain => sx.min(sy),
        };
        Self::centered(src_w, src_h, target_w, target_h, scale)
    }

    /// Placement of an imported image: natural size when it fits, otherwise
    /// scaled down to fit. Always centered.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn import(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> Self {
        let scale = if src_w <= target_w && src_h <= target_h {
            1.0
        } else {
            (target_w as f32 / src_w.max(1) as f32).min(target_h as f32 / src_h.max(1) as f32)
        };
        Self::centered(src_w, src_h, target_w, target_h, scale)
    }
}

/// Decode image bytes in any supported format.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the image cannot be decoded.
pub fn decode_image_bytes(data: &[u8]) -> RenderResult<Raster> {
    let img =
        image::load_from_memory(data).map_err(|e| RenderError::Decode(format!("image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::trace!("Decoded {width}x{height} image ({} bytes)", data.len());
    Raster::from_rgba8(width, height, rgba.into_raw())
}

/// Extract the payload bytes of a data URL.
///
/// Supports base64 (`data:image/png;base64,...`) and percent-encoded payloads.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the URL is malformed.
pub fn data_url_bytes(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Decode("Not a data URI".to_string()))?;

    // Find the comma separating metadata from data
    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("Invalid data URI: missing comma".to_string()))?;

    if metadata.split(';').any(|part| part == "base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Decode(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded_data)
    }
}

/// Decode a data URL into a raster.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the URL is malformed or the image
/// cannot be decoded.
pub fn decode_data_url(uri: &str) -> RenderResult<Raster> {
    decode_image_bytes(&data_url_bytes(uri)?)
}

/// Encode a raster as a PNG data URL.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if PNG encoding fails.
pub fn encode_png_data_url(raster: &Raster) -> RenderResult<String> {
    let png = raster.encode_png()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    Ok(format!("data:image/png;base64,{encoded}"))
}

/// Simple URL decoding (percent-encoding).
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Decode("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Dimensions for a copy whose longer edge is at most `max_dimension`.
///
/// Aspect ratio is preserved and results are rounded; images already within
/// the limit keep their size.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn downscaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let (w, h) = (width as f32, height as f32);
    let max = max_dimension as f32;
    let (w, h) = if width > height {
        if width > max_dimension {
            (max, max / (w / h))
        } else {
            (w, h)
        }
    } else if height > max_dimension {
        (max / (h / w), max)
    } else {
        (w, h)
    };
    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Resize a raster so its longer edge is at most `max_dimension`.
///
/// Returns a plain copy when no resize is needed.
///
/// # Errors
///
/// Returns an error if the resized buffer cannot be allocated.
pub fn downscale_to_max(raster: &Raster, max_dimension: u32) -> RenderResult<Raster> {
    let (width, height) = downscaled_dimensions(raster.width(), raster.height(), max_dimension);
    if (width, height) == (raster.width(), raster.height()) {
        return Ok(raster.clone());
    }

    let img = image::RgbaImage::from_raw(raster.width(), raster.height(), raster.to_rgba8())
        .ok_or_else(|| RenderError::Decode("Invalid raster data".to_string()))?;
    let resized =
        image::imageops::resize(&img, width, height, image::imageops::FilterType::Lanczos3);
    tracing::debug!(
        "Downscaled {}x{} to {width}x{height}",
        raster.width(),
        raster.height()
    );
    Raster::from_rgba8(width, height, resized.into_raw())
}

/// Composite `src` onto a white `width`x`height` raster using `policy`.
///
/// # Errors
///
/// Returns [`RenderError::Allocation`] for zero target dimensions.
pub fn composite_fitted(
    src: &Raster,
    width: u32,
    height: u32,
    policy: FitPolicy,
) -> RenderResult<Raster> {
    let mut out = Raster::white(width, height)?;
    let p = Placement::fit(src.width(), src.height(), width, height, policy);
    out.draw_scaled(src, p.x, p.y, p.width, p.height);
    Ok(out)
}
