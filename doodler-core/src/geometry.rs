//! Coordinate mapping between the host element and the canvas buffer.

use serde::{Deserialize, Serialize};

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Translate this point by `-offset`.
    #[must_use]
    pub fn minus(self, offset: Self) -> Self {
        Self::new(self.x - offset.x, self.y - offset.y)
    }
}

/// Bounding rectangle of the rendered canvas element, in viewport (CSS) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientRect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Rendered width.
    pub width: f32,
    /// Rendered height.
    pub height: f32,
}

impl ClientRect {
    /// Create a rect.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rect at the origin rendered at exactly the buffer size (no CSS scaling).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn unscaled(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }
}

/// Map a pointer's viewport coordinates into the canvas's logical pixel space.
///
/// The element may be rendered at a different size than its backing buffer
/// (CSS scaling, zoom), so the offset inside the element is scaled by
/// `buffer / rendered` on each axis. The rect must be re-read for every event
/// since scrolling and resizing move it.
///
/// Returns `None` when the rect has no rendered area.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn pointer_to_canvas_coords(
    rect: &ClientRect,
    canvas_width: u32,
    canvas_height: u32,
    client_x: f32,
    client_y: f32,
) -> Option<Point> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let scale_x = canvas_width as f32 / rect.width;
    let scale_y = canvas_height as f32 / rect.height;
    Some(Point::new(
        (client_x - rect.left) * scale_x,
        (client_y - rect.top) * scale_y,
    ))
}

/// Compute logical canvas dimensions for a viewport.
///
/// The padding is removed from both axes, then the canvas takes the viewport's
/// aspect ratio with neither edge exceeding `max_dimension`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn fit_canvas_to_viewport(
    viewport_width: u32,
    viewport_height: u32,
    padding: u32,
    max_dimension: u32,
) -> (u32, u32) {
    let vw = viewport_width.saturating_sub(padding).max(1) as f32;
    let vh = viewport_height.saturating_sub(padding).max(1) as f32;
    let max = max_dimension.max(1) as f32;

    let (width, height) = if vw / vh > 1.0 {
        let h = vh.min(max);
        (h * (vw / vh), h)
    } else {
        let w = vw.min(max);
        (w, (w * (vh / vw)).min(max))
    };

    (
        (width.min(max).round() as u32).max(1),
        (height.round() as u32).max(1),
    )
}
