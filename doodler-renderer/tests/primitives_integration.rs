//! # Primitive Integration Tests
//!
//! Drawing primitives combined the way the interaction engine drives them.

use doodler_core::{Point, ToolSettings};
use doodler_renderer::{
    decode_data_url, draw_shape, encode_png_data_url, flood_fill, BrushKind, FreehandStroke,
    Raster, ShapeKind, ShapeStyle,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

// ============================================================================
// Brush
// ============================================================================

/// A vertical stroke sampled in small steps leaves no gaps along its axis.
#[test]
fn test_brush_stroke_is_continuous() {
    let mut raster = Raster::white(64, 64).expect("raster");
    let settings = ToolSettings::default();
    let mut stroke = FreehandStroke::begin(BrushKind::Brush, &settings, Point::new(10.0, 10.0))
        .expect("stroke");

    for step in 1..=5u8 {
        let y = 10.0 + f32::from(step) * 8.0;
        assert!(!stroke.extend(&mut raster, Point::new(10.0, y)));
    }
    assert_eq!(stroke.restarts(), 0);

    for y in 10..=50 {
        let px = raster.pixel(10, y).expect("pixel");
        assert_eq!(px, BLACK, "gap at y={y}");
    }
    assert_eq!(raster.pixel(30, 30), Some(WHITE));
}

// ============================================================================
// Shapes
// ============================================================================

/// Replaying the preview from a pristine snapshot on every move leaves only
/// the final shape in the working raster.
#[test]
fn test_shape_preview_replay_leaves_only_final_shape() {
    let snapshot = Raster::white(120, 120).expect("raster");
    let mut working = snapshot.clone();
    let style = ShapeStyle::from_settings(&ToolSettings {
        line_width: 2.0,
        fill_color: "transparent".to_string(),
        ..ToolSettings::default()
    })
    .expect("style");

    let start = Point::new(0.0, 0.0);
    for end in [Point::new(40.0, 40.0), Point::new(70.0, 20.0), Point::new(100.0, 100.0)] {
        working.copy_from(&snapshot);
        draw_shape(&mut working, ShapeKind::Rectangle, start, end, &style);
    }

    // Right edge of an intermediate preview (x = 40) is gone.
    assert_eq!(working.pixel(40, 30), Some(WHITE));
    // Final right edge (x = 100) is present.
    assert_eq!(working.pixel(100, 50), Some(BLACK));
    assert_eq!(snapshot, Raster::white(120, 120).expect("raster"));
}

// ============================================================================
// Flood fill
// ============================================================================

/// Filling inside an outlined rectangle stays within the outline.
#[test]
fn test_fill_contained_by_rectangle_outline() {
    let mut raster = Raster::white(60, 60).expect("raster");
    let style = ShapeStyle {
        stroke: BLACK,
        fill: None,
        line_width: 4.0,
    };
    draw_shape(
        &mut raster,
        ShapeKind::Rectangle,
        Point::new(10.0, 10.0),
        Point::new(50.0, 50.0),
        &style,
    );

    let filled = flood_fill(&mut raster, Point::new(30.0, 30.0), GREEN);
    assert!(filled > 0);
    assert_eq!(raster.pixel(30, 30), Some(GREEN));
    assert_eq!(raster.pixel(2, 2), Some(WHITE));
    assert_eq!(raster.pixel(55, 30), Some(WHITE));
    assert_eq!(raster.pixel(10, 30), Some(BLACK));
}

// ============================================================================
// Codec
// ============================================================================

/// A drawn raster survives the PNG data URL used by history entries.
#[test]
fn test_drawn_raster_survives_data_url() {
    let mut raster = Raster::white(32, 32).expect("raster");
    let style = ShapeStyle {
        stroke: BLACK,
        fill: Some(GREEN),
        line_width: 2.0,
    };
    draw_shape(
        &mut raster,
        ShapeKind::Ellipse,
        Point::new(4.0, 4.0),
        Point::new(28.0, 28.0),
        &style,
    );
    let url = encode_png_data_url(&raster).expect("encode");
    let decoded = decode_data_url(&url).expect("decode");
    assert_eq!(decoded, raster);
}
