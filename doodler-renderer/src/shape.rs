//! Line, rectangle and ellipse primitives.

use doodler_core::{Point, ToolSettings};
use tiny_skia::{FillRule, PathBuilder, Rect, Transform};

use crate::brush::{round_stroke, solid_paint, stroke_segment};
use crate::error::RenderResult;
use crate::Raster;

/// Shape drawn by a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Segment from start to end.
    Line,
    /// Axis-aligned box spanning start and end.
    Rectangle,
    /// Ellipse inscribed in the box spanning start and end.
    Ellipse,
}

/// Colors and width for a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    /// Outline color.
    pub stroke: [u8; 4],
    /// Interior color, `None` for no fill.
    pub fill: Option<[u8; 4]>,
    /// Outline width.
    pub line_width: f32,
}

impl ShapeStyle {
    /// Build a style from the current tool settings.
    ///
    /// # Errors
    ///
    /// Returns an error if either color is malformed.
    pub fn from_settings(settings: &ToolSettings) -> RenderResult<Self> {
        Ok(Self {
            stroke: settings.stroke_rgba()?,
            fill: settings.fill_rgba()?,
            line_width: if settings.line_width > 0.0 {
                settings.line_width
            } else {
                1.0
            },
        })
    }
}

/// Draw `kind` between `start` and `end`.
///
/// Rectangles and ellipses are stroked first and then filled when the style
/// has a fill, so the fill covers the inner half of the outline. A box that
/// is flat along one axis is stroked as a segment; a zero-length drag draws
/// nothing.
///
/// Returns whether anything was drawn.
pub fn draw_shape(
    raster: &mut Raster,
    kind: ShapeKind,
    start: Point,
    end: Point,
    style: &ShapeStyle,
) -> bool {
    match kind {
        ShapeKind::Line => {
            if start == end {
                return false;
            }
            stroke_segment(raster, start, end, style.stroke, style.line_width)
        }
        ShapeKind::Rectangle | ShapeKind::Ellipse => {
            let (left, top) = (start.x.min(end.x), start.y.min(end.y));
            let (right, bottom) = (start.x.max(end.x), start.y.max(end.y));
            if right <= left && bottom <= top {
                return false;
            }
            if right <= left || bottom <= top {
                // A flat box outlines as a single segment.
                return stroke_segment(
                    raster,
                    Point::new(left, top),
                    Point::new(right, bottom),
                    style.stroke,
                    style.line_width,
                );
            }
            let Some(bounds) = Rect::from_ltrb(left, top, right, bottom) else {
                return false;
            };
            let path = if kind == ShapeKind::Rectangle {
                Some(PathBuilder::from_rect(bounds))
            } else {
                PathBuilder::from_oval(bounds)
            };
            let Some(path) = path else {
                return false;
            };

            let pixmap = raster.pixmap_mut();
            pixmap.stroke_path(
                &path,
                &solid_paint(style.stroke),
                &round_stroke(style.line_width),
                Transform::identity(),
                None,
            );
            if let Some(fill) = style.fill {
                pixmap.fill_path(
                    &path,
                    &solid_paint(fill),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
            true
        }
    }
}
