//! Color parsing for tool settings.

use crate::{CanvasError, CanvasResult};

/// Sentinel used by fill settings to mean "no fill".
pub const TRANSPARENT: &str = "transparent";

/// Opaque white, the canvas background and eraser color.
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Convert a hex color string to RGBA bytes.
///
/// `"transparent"` and the empty string map to fully transparent black.
/// Otherwise the leading `#` is optional and the first six hex digits are
/// read as `rrggbb`; alpha is always fully opaque.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidColor`] if fewer than six hex digits are present.
pub fn hex_to_rgba(hex: &str) -> CanvasResult<[u8; 4]> {
    let hex = hex.trim();
    if hex.is_empty() || hex.eq_ignore_ascii_case(TRANSPARENT) {
        return Ok([0, 0, 0, 0]);
    }

    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| CanvasError::InvalidColor(hex.to_string()))
    };

    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])
}

/// Whether a color string is the "no fill" sentinel.
#[must_use]
pub fn is_transparent(color: &str) -> bool {
    color.trim().eq_ignore_ascii_case(TRANSPARENT)
}
