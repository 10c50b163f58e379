//! # Interaction Scenarios
//!
//! End-to-end gestures through the session: strokes, shape previews, fills,
//! panning and the text overlay.

use std::sync::{Arc, Mutex};

use doodler_core::{
    ClientRect, HistoryKind, InputEvent, KeyModifiers, MemoryHistoryStore, Point, PointerEvent,
    PointerPhase, SettingsPatch, ToolId,
};
use doodler_engine::{Doodler, DoodlerConfig, InteractionState, Outcome, ResizeTrigger};
use doodler_renderer::{decode_data_url, Raster, RenderResult, TextRenderer};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn session(viewport: u32) -> Doodler {
    let mut doodler = Doodler::new(
        DoodlerConfig::default(),
        Box::new(MemoryHistoryStore::new()),
        None,
    )
    .expect("session");
    doodler
        .resize(viewport, viewport, ResizeTrigger::Initial)
        .expect("resize");
    doodler
}

fn pointer(doodler: &mut Doodler, phase: PointerPhase, x: f32, y: f32) -> Outcome {
    doodler
        .handle_event(&InputEvent::Pointer(PointerEvent::new(phase, x, y)))
        .expect("pointer event")
}

fn escape(doodler: &mut Doodler) -> Outcome {
    doodler
        .handle_event(&InputEvent::Key {
            key: "Escape".to_string(),
            pressed: true,
            modifiers: KeyModifiers::default(),
        })
        .expect("escape")
}

// ============================================================================
// No-op click
// ============================================================================

/// Press and release on the same spot commits nothing, for every drag tool.
#[test]
fn test_click_without_drag_records_nothing() {
    let mut doodler = session(96);
    for tool in [
        ToolId::Brush,
        ToolId::Eraser,
        ToolId::Line,
        ToolId::Rectangle,
        ToolId::Ellipse,
    ] {
        doodler.select_tool(tool).expect("tool");
        pointer(&mut doodler, PointerPhase::Down, 20.0, 20.0);
        assert_eq!(
            pointer(&mut doodler, PointerPhase::Up, 20.0, 20.0),
            Outcome::Nothing
        );
    }
    assert_eq!(doodler.history().len(), 1);
    assert_eq!(doodler.canvas().snapshot(), &Raster::white(64, 64).expect("raster"));
}

// ============================================================================
// Brush stroke
// ============================================================================

/// (10,10) to (10,50) in five steps: one user edit, continuous pixels.
#[test]
fn test_brush_stroke_scenario() {
    let mut doodler = session(96);
    pointer(&mut doodler, PointerPhase::Down, 10.0, 10.0);
    for step in 1..=5u8 {
        let y = 10.0 + f32::from(step) * 8.0;
        pointer(&mut doodler, PointerPhase::Move, 10.0, y);
    }
    assert_eq!(
        pointer(&mut doodler, PointerPhase::Up, 10.0, 50.0),
        Outcome::Committed
    );

    let history = doodler.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history.current().map(|item| item.kind), Some(HistoryKind::UserEdit));

    let snapshot = doodler.canvas().snapshot();
    for y in 10..=50 {
        assert_eq!(snapshot.pixel(10, y), Some(BLACK), "gap at y={y}");
    }
    assert_eq!(snapshot.pixel(30, 30), Some(WHITE));
}

/// Eraser paints white over earlier strokes.
#[test]
fn test_eraser_restores_white() {
    let mut doodler = session(96);
    pointer(&mut doodler, PointerPhase::Down, 10.0, 30.0);
    pointer(&mut doodler, PointerPhase::Move, 50.0, 30.0);
    pointer(&mut doodler, PointerPhase::Up, 50.0, 30.0);
    assert_eq!(doodler.canvas().snapshot().pixel(30, 30), Some(BLACK));

    doodler.select_tool(ToolId::Eraser).expect("tool");
    pointer(&mut doodler, PointerPhase::Down, 30.0, 10.0);
    pointer(&mut doodler, PointerPhase::Move, 30.0, 50.0);
    pointer(&mut doodler, PointerPhase::Up, 30.0, 50.0);
    assert_eq!(doodler.canvas().snapshot().pixel(30, 30), Some(WHITE));
    assert_eq!(doodler.history().len(), 3);
}

// ============================================================================
// Shape preview
// ============================================================================

/// The live preview is visible while dragging; only the final rectangle is
/// ever recorded.
#[test]
fn test_shape_preview_is_never_recorded() {
    // 232 - 32 = 200x200 canvas.
    let mut doodler = session(232);
    doodler.select_tool(ToolId::Rectangle).expect("tool");

    pointer(&mut doodler, PointerPhase::Down, 0.0, 0.0);
    pointer(&mut doodler, PointerPhase::Move, 50.0, 50.0);
    assert_eq!(doodler.canvas().working().pixel(50, 25), Some(BLACK));
    assert_eq!(doodler.history().len(), 1);

    pointer(&mut doodler, PointerPhase::Move, 100.0, 100.0);
    assert_eq!(
        doodler.canvas().working().pixel(50, 25),
        Some(WHITE),
        "stale preview edge survived"
    );
    assert_eq!(
        pointer(&mut doodler, PointerPhase::Up, 100.0, 100.0),
        Outcome::Committed
    );

    let history = doodler.history();
    assert_eq!(history.len(), 2);
    let recorded = decode_data_url(&history.items()[1].image_data).expect("decode");
    assert_eq!(recorded.pixel(100, 50), Some(BLACK));
    assert_eq!(recorded.pixel(50, 100), Some(BLACK));
    assert_eq!(recorded.pixel(50, 25), Some(WHITE));
    assert_eq!(recorded.pixel(50, 50), Some(WHITE));
}

/// Escape mid-drag restores the pre-gesture canvas.
#[test]
fn test_escape_cancels_shape() {
    let mut doodler = session(232);
    doodler.select_tool(ToolId::Ellipse).expect("tool");
    pointer(&mut doodler, PointerPhase::Down, 20.0, 20.0);
    pointer(&mut doodler, PointerPhase::Move, 120.0, 80.0);
    assert_eq!(escape(&mut doodler), Outcome::Nothing);
    assert_eq!(doodler.state(), InteractionState::Idle);
    assert_eq!(doodler.canvas().working(), doodler.canvas().snapshot());
    assert_eq!(
        pointer(&mut doodler, PointerPhase::Up, 120.0, 80.0),
        Outcome::Nothing
    );
    assert_eq!(doodler.history().len(), 1);
}

/// A rectangle dragged along one axis still leaves a visible edge.
#[test]
fn test_flat_rectangle_drag_draws_a_line() {
    let mut doodler = session(232);
    doodler.select_tool(ToolId::Rectangle).expect("tool");
    let blank = doodler.canvas().snapshot().clone();

    pointer(&mut doodler, PointerPhase::Down, 20.0, 50.0);
    pointer(&mut doodler, PointerPhase::Move, 120.0, 50.0);
    assert_eq!(
        pointer(&mut doodler, PointerPhase::Up, 120.0, 50.0),
        Outcome::Committed
    );

    let snapshot = doodler.canvas().snapshot();
    assert!(snapshot.diff_count(&blank) > 0);
    assert_eq!(snapshot.pixel(70, 50), Some(BLACK));
    assert_eq!(doodler.history().len(), 2);
}

// ============================================================================
// Flood fill
// ============================================================================

fn outlined_square(doodler: &mut Doodler) {
    doodler.select_tool(ToolId::Rectangle).expect("tool");
    pointer(doodler, PointerPhase::Down, 10.0, 10.0);
    pointer(doodler, PointerPhase::Move, 50.0, 50.0);
    pointer(doodler, PointerPhase::Up, 50.0, 50.0);
}

/// A fill inside a closed outline colors exactly the enclosed pixels.
#[test]
fn test_fill_is_contained() {
    let mut doodler = session(96);
    outlined_square(&mut doodler);
    let before = doodler.canvas().snapshot().clone();

    doodler.select_tool(ToolId::Fill).expect("tool");
    doodler
        .update_settings(SettingsPatch {
            stroke_color: Some("#00ff00".to_string()),
            ..SettingsPatch::default()
        })
        .expect("settings");
    assert_eq!(
        pointer(&mut doodler, PointerPhase::Down, 30.0, 30.0),
        Outcome::Committed
    );
    pointer(&mut doodler, PointerPhase::Up, 30.0, 30.0);

    let after = doodler.canvas().snapshot();
    let mut changed = 0;
    for y in 0..64 {
        for x in 0..64 {
            let was = before.pixel(x, y).expect("pixel");
            let now = after.pixel(x, y).expect("pixel");
            if was == now {
                continue;
            }
            changed += 1;
            assert_eq!(now, GREEN);
            assert_eq!(was, WHITE);
            assert!((11..=48).contains(&x) && (11..=48).contains(&y), "leak at {x},{y}");
        }
    }
    assert_eq!(changed, 38 * 38);
    assert_eq!(after.pixel(5, 5), Some(WHITE));
    assert_eq!(doodler.history().len(), 3);
}

/// Filling a region that already has the fill color changes nothing and
/// records nothing.
#[test]
fn test_fill_is_idempotent() {
    let mut doodler = session(96);
    doodler.select_tool(ToolId::Fill).expect("tool");
    doodler
        .update_settings(SettingsPatch {
            stroke_color: Some("#00ff00".to_string()),
            ..SettingsPatch::default()
        })
        .expect("settings");
    pointer(&mut doodler, PointerPhase::Down, 30.0, 30.0);
    let once = doodler.canvas().snapshot().clone();
    assert_eq!(doodler.history().len(), 2);

    assert_eq!(
        pointer(&mut doodler, PointerPhase::Down, 30.0, 30.0),
        Outcome::Nothing
    );
    assert_eq!(doodler.canvas().snapshot(), &once);
    assert_eq!(doodler.history().len(), 2);
}

// ============================================================================
// Coordinates and panning
// ============================================================================

/// A CSS-scaled element maps pointer positions back to buffer pixels.
#[test]
fn test_scaled_element_coordinates() {
    let mut doodler = session(96);
    // Canvas is 64x64 but rendered at 128x128 starting at (100, 50).
    let rect = ClientRect::new(100.0, 50.0, 128.0, 128.0);
    let event = |phase, x, y| InputEvent::Pointer(PointerEvent::new(phase, x, y).with_rect(rect));

    doodler
        .handle_event(&event(PointerPhase::Down, 120.0, 70.0))
        .expect("down");
    doodler
        .handle_event(&event(PointerPhase::Move, 120.0, 150.0))
        .expect("move");
    doodler
        .handle_event(&event(PointerPhase::Up, 120.0, 150.0))
        .expect("up");

    // (120,70)->(10,10) and (120,150)->(10,50) in buffer pixels.
    assert_eq!(doodler.canvas().snapshot().pixel(10, 30), Some(BLACK));
}

/// Panning shifts where later strokes land and never records history.
#[test]
fn test_pan_then_draw() {
    let mut doodler = session(96);
    doodler.select_tool(ToolId::Hand).expect("tool");
    pointer(&mut doodler, PointerPhase::Down, 30.0, 30.0);
    pointer(&mut doodler, PointerPhase::Move, 40.0, 30.0);
    pointer(&mut doodler, PointerPhase::Up, 40.0, 30.0);
    assert_eq!(doodler.canvas().pan_offset(), Point::new(10.0, 0.0));
    assert_eq!(doodler.history().len(), 1);

    doodler.select_tool(ToolId::Brush).expect("tool");
    pointer(&mut doodler, PointerPhase::Down, 30.0, 10.0);
    pointer(&mut doodler, PointerPhase::Move, 30.0, 40.0);
    pointer(&mut doodler, PointerPhase::Up, 30.0, 40.0);

    let snapshot = doodler.canvas().snapshot();
    assert_eq!(snapshot.pixel(20, 25), Some(BLACK));
    assert_eq!(snapshot.pixel(30, 25), Some(WHITE));
}

/// Escape mid-pan stops panning where it is.
#[test]
fn test_escape_stops_pan_and_keeps_offset() {
    let mut doodler = session(96);
    doodler.select_tool(ToolId::Hand).expect("tool");
    pointer(&mut doodler, PointerPhase::Down, 30.0, 30.0);
    pointer(&mut doodler, PointerPhase::Move, 42.0, 25.0);
    assert_eq!(doodler.state(), InteractionState::Panning);

    escape(&mut doodler);
    assert_eq!(doodler.state(), InteractionState::Idle);
    assert_eq!(doodler.canvas().pan_offset(), Point::new(12.0, -5.0));

    // Further movement no longer pans.
    pointer(&mut doodler, PointerPhase::Move, 60.0, 60.0);
    assert_eq!(doodler.canvas().pan_offset(), Point::new(12.0, -5.0));
    assert_eq!(doodler.history().len(), 1);
}

// ============================================================================
// Text overlay
// ============================================================================

/// Records each line it is asked to draw and marks its origin pixel.
#[derive(Default)]
struct MarkingRenderer {
    lines: Mutex<Vec<(String, Point)>>,
}

impl TextRenderer for MarkingRenderer {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw_line(
        &self,
        raster: &mut Raster,
        line: &str,
        origin: Point,
        _font_size: f32,
        _font_family: &str,
        color: [u8; 4],
    ) -> RenderResult<()> {
        raster.set_pixel(origin.x as u32, origin.y as u32, color);
        self.lines
            .lock()
            .expect("lock")
            .push((line.to_string(), origin));
        Ok(())
    }
}

#[test]
fn test_text_commit_draws_each_line() {
    let renderer = Arc::new(MarkingRenderer::default());
    let mut doodler = session(96);
    doodler.set_text_renderer(Some(renderer.clone()));
    doodler.select_tool(ToolId::Text).expect("tool");

    pointer(&mut doodler, PointerPhase::Down, 5.0, 20.0);
    assert_eq!(doodler.state(), InteractionState::TextEditing);
    doodler
        .handle_event(&InputEvent::TextInput {
            value: "hi\nthere".to_string(),
        })
        .expect("input");
    assert_eq!(
        doodler.handle_event(&InputEvent::TextBlur).expect("blur"),
        Outcome::Committed
    );

    let lines = renderer.lines.lock().expect("lock").clone();
    // Text tool default font size is 16, so lines are 19.2px apart.
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], ("hi".to_string(), Point::new(5.0, 20.0)));
    assert_eq!(lines[1].0, "there");
    assert!((lines[1].1.y - 39.2).abs() < 1e-3);
    assert_eq!(doodler.canvas().snapshot().pixel(5, 20), Some(BLACK));
    assert_eq!(doodler.history().len(), 2);
}

/// Clicking elsewhere while editing commits the draft and opens a new one.
#[test]
fn test_click_while_editing_commits_first() {
    let renderer = Arc::new(MarkingRenderer::default());
    let mut doodler = session(96);
    doodler.set_text_renderer(Some(renderer));
    doodler.select_tool(ToolId::Text).expect("tool");

    pointer(&mut doodler, PointerPhase::Down, 5.0, 20.0);
    doodler
        .handle_event(&InputEvent::TextInput {
            value: "first".to_string(),
        })
        .expect("input");
    assert_eq!(
        pointer(&mut doodler, PointerPhase::Down, 30.0, 40.0),
        Outcome::Committed
    );
    assert_eq!(doodler.state(), InteractionState::TextEditing);
    assert_eq!(doodler.text().value, "");
    assert_eq!(doodler.history().len(), 2);
}

#[test]
fn test_text_without_renderer_is_reported() {
    let mut doodler = session(96);
    doodler.select_tool(ToolId::Text).expect("tool");
    pointer(&mut doodler, PointerPhase::Down, 5.0, 20.0);
    doodler
        .handle_event(&InputEvent::TextInput {
            value: "lost".to_string(),
        })
        .expect("input");
    assert!(doodler.handle_event(&InputEvent::TextBlur).is_err());
    assert_eq!(doodler.state(), InteractionState::Idle);
    assert_eq!(doodler.history().len(), 1);
}

/// Escape drops a non-empty draft without drawing it.
#[test]
fn test_escape_discards_text_draft() {
    let renderer = Arc::new(MarkingRenderer::default());
    let mut doodler = session(96);
    doodler.set_text_renderer(Some(renderer.clone()));
    doodler.select_tool(ToolId::Text).expect("tool");
    let blank = doodler.canvas().snapshot().clone();

    pointer(&mut doodler, PointerPhase::Down, 5.0, 20.0);
    doodler
        .handle_event(&InputEvent::TextInput {
            value: "never drawn".to_string(),
        })
        .expect("input");

    escape(&mut doodler);
    assert_eq!(doodler.state(), InteractionState::Idle);
    assert!(!doodler.text().active);
    assert_eq!(
        doodler.handle_event(&InputEvent::TextBlur).expect("blur"),
        Outcome::Nothing
    );

    assert!(renderer.lines.lock().expect("lock").is_empty());
    assert!(!doodler.canvas().is_dirty());
    assert_eq!(doodler.canvas().snapshot(), &blank);
    assert_eq!(doodler.history().len(), 1);
}
