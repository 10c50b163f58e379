//! Freehand brush and eraser strokes.

use doodler_core::color::WHITE;
use doodler_core::{Point, ToolSettings};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Stroke, Transform};

use crate::error::RenderResult;
use crate::Raster;

/// Distance in pixels above which a move restarts the stroke's sub-path.
///
/// Large jumps between samples (fast pointers, dropped events) would
/// otherwise join across the gap with one long segment from a stale anchor.
pub const GAP_THRESHOLD: f32 = 10.0;

/// Which freehand tool is drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushKind {
    /// Paints with the stroke color.
    Brush,
    /// Paints opaque white.
    Eraser,
}

/// An in-progress freehand stroke.
///
/// Beginning a stroke draws nothing; every [`extend`](Self::extend) strokes
/// the segment from the previous sample to the new one.
#[derive(Debug, Clone)]
pub struct FreehandStroke {
    kind: BrushKind,
    color: [u8; 4],
    width: f32,
    last: Point,
    restarts: usize,
}

impl FreehandStroke {
    /// Start a stroke at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the brush stroke color cannot be parsed.
    pub fn begin(kind: BrushKind, settings: &ToolSettings, start: Point) -> RenderResult<Self> {
        let color = match kind {
            BrushKind::Brush => settings.stroke_rgba()?,
            BrushKind::Eraser => WHITE,
        };
        let width = if settings.line_width > 0.0 {
            settings.line_width
        } else {
            1.0
        };
        Ok(Self {
            kind,
            color,
            width,
            last: start,
            restarts: 0,
        })
    }

    /// Which tool is drawing.
    #[must_use]
    pub const fn kind(&self) -> BrushKind {
        self.kind
    }

    /// Most recent sample.
    #[must_use]
    pub const fn last(&self) -> Point {
        self.last
    }

    /// How many times the sub-path was restarted after a gap.
    #[must_use]
    pub const fn restarts(&self) -> usize {
        self.restarts
    }

    /// Stroke from the last sample to `to` and advance.
    ///
    /// Returns `true` when the gap exceeded [`GAP_THRESHOLD`] and the
    /// sub-path was restarted at the last sample.
    pub fn extend(&mut self, raster: &mut Raster, to: Point) -> bool {
        let restarted = self.last.distance_to(to) > GAP_THRESHOLD;
        if restarted {
            self.restarts += 1;
            tracing::trace!(
                "Brush gap of {:.1}px, restarting sub-path at ({:.1}, {:.1})",
                self.last.distance_to(to),
                self.last.x,
                self.last.y
            );
        }
        stroke_segment(raster, self.last, to, self.color, self.width);
        self.last = to;
        restarted
    }
}

/// Anti-aliased solid paint.
pub(crate) fn solid_paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    paint
}

/// Stroke style with round caps and joins.
pub(crate) fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

/// Stroke one round-capped segment. Returns `false` if nothing was drawn.
pub(crate) fn stroke_segment(
    raster: &mut Raster,
    from: Point,
    to: Point,
    rgba: [u8; 4],
    width: f32,
) -> bool {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    let Some(path) = pb.finish() else {
        return false;
    };
    raster.pixmap_mut().stroke_path(
        &path,
        &solid_paint(rgba),
        &round_stroke(width),
        Transform::identity(),
        None,
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(color: &str, width: f32) -> ToolSettings {
        ToolSettings {
            stroke_color: color.to_string(),
            line_width: width,
            ..ToolSettings::default()
        }
    }

    #[test]
    fn test_begin_draws_nothing() {
        let raster = Raster::white(50, 50).expect("raster");
        let before = raster.clone();
        let stroke = FreehandStroke::begin(
            BrushKind::Brush,
            &settings("#000000", 5.0),
            Point::new(10.0, 10.0),
        )
        .expect("stroke");
        assert_eq!(stroke.last(), Point::new(10.0, 10.0));
        assert_eq!(raster, before);
    }

    #[test]
    fn test_extend_paints_segment() {
        let mut raster = Raster::white(50, 50).expect("raster");
        let mut stroke = FreehandStroke::begin(
            BrushKind::Brush,
            &settings("#ff0000", 4.0),
            Point::new(10.0, 10.0),
        )
        .expect("stroke");
        assert!(!stroke.extend(&mut raster, Point::new(15.0, 10.0)));
        let px = raster.pixel(12, 10).expect("pixel");
        assert_eq!(px, [255, 0, 0, 255]);
        assert_eq!(raster.pixel(40, 40), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_gap_restarts_subpath() {
        let mut raster = Raster::white(100, 100).expect("raster");
        let mut stroke = FreehandStroke::begin(
            BrushKind::Brush,
            &settings("#000000", 2.0),
            Point::new(0.0, 0.0),
        )
        .expect("stroke");
        assert!(stroke.extend(&mut raster, Point::new(30.0, 40.0)));
        assert!(!stroke.extend(&mut raster, Point::new(33.0, 44.0)));
        assert_eq!(stroke.restarts(), 1);
    }

    #[test]
    fn test_eraser_paints_white_regardless_of_color() {
        let mut raster = Raster::filled(20, 20, [0, 0, 0, 255]).expect("raster");
        let mut stroke = FreehandStroke::begin(
            BrushKind::Eraser,
            &settings("#ff0000", 6.0),
            Point::new(2.0, 10.0),
        )
        .expect("stroke");
        stroke.extend(&mut raster, Point::new(10.0, 10.0));
        assert_eq!(raster.pixel(6, 10), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_invalid_brush_color() {
        let result =
            FreehandStroke::begin(BrushKind::Brush, &settings("#zz", 5.0), Point::default());
        assert!(result.is_err());
    }
}
