//! The editing session.
//!
//! [`Doodler`] owns the canvas and wires the interaction engine, history and
//! generative bridge together: committed gestures become history entries,
//! keyboard shortcuts drive undo/redo, and every content change bumps the
//! bridge's edit generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use doodler_core::{
    CanvasError, Confirm, DestructiveAction, HistoryKind, HistoryLog, HistoryStore, InputEvent,
    SettingsPatch, TextEditState, ToolId, ToolSettings,
};
use doodler_renderer::{decode_image_bytes, export_history_item, Placement, Raster, TextRenderer};

use crate::bridge::{
    BridgeError, GenerateResponse, GenerativeBridge, ImageGenerator, PendingEdit,
};
use crate::canvas::{CanvasModel, ResizeOutcome, ResizeTrigger};
use crate::config::DoodlerConfig;
use crate::error::EngineResult;
use crate::history::HistoryEngine;
use crate::interaction::{InteractionEngine, InteractionState, Outcome};

/// A single editing session.
#[derive(Debug)]
pub struct Doodler {
    config: DoodlerConfig,
    canvas: CanvasModel,
    interaction: InteractionEngine,
    history: HistoryEngine,
    bridge: GenerativeBridge,
    bootstrapped: bool,
}

impl Doodler {
    /// Create a session with a white canvas and an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) for an
    /// invalid configuration and a render error if the canvas cannot be
    /// allocated.
    pub fn new(
        config: DoodlerConfig,
        store: Box<dyn HistoryStore>,
        text_renderer: Option<Arc<dyn TextRenderer>>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let canvas = CanvasModel::new(&config)?;
        let bridge = GenerativeBridge::new(&config);
        tracing::info!(
            "Doodler session created ({}x{}, text {})",
            canvas.width(),
            canvas.height(),
            if text_renderer.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self {
            config,
            canvas,
            interaction: InteractionEngine::new(text_renderer),
            history: HistoryEngine::new(store),
            bridge,
            bootstrapped: false,
        })
    }

    /// Load persisted history. Call before the first resize so it restores
    /// the newest entry instead of starting blank.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`](crate::EngineError::Store) if the store
    /// cannot be read.
    pub fn hydrate(&mut self) -> EngineResult<usize> {
        self.history.hydrate()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &DoodlerConfig {
        &self.config
    }

    /// The canvas.
    #[must_use]
    pub const fn canvas(&self) -> &CanvasModel {
        &self.canvas
    }

    /// The history log.
    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        self.history.log()
    }

    /// Interaction state.
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.interaction.state()
    }

    /// Selected tool.
    #[must_use]
    pub const fn tool(&self) -> ToolId {
        self.interaction.tool()
    }

    /// Current tool settings.
    #[must_use]
    pub const fn settings(&self) -> &ToolSettings {
        self.interaction.settings()
    }

    /// Text draft.
    #[must_use]
    pub const fn text(&self) -> &TextEditState {
        self.interaction.text()
    }

    /// Current prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.bridge.prompt()
    }

    /// Whether a generative edit is in flight.
    #[must_use]
    pub const fn is_generating(&self) -> bool {
        self.bridge.is_loading()
    }

    /// Install or remove the text renderer.
    pub fn set_text_renderer(&mut self, renderer: Option<Arc<dyn TextRenderer>>) {
        self.interaction.set_text_renderer(renderer);
    }

    // ------------------------------------------------------------------
    // Layout and input
    // ------------------------------------------------------------------

    /// Fit the canvas to the viewport.
    ///
    /// The resize that first creates the canvas records a blank bootstrap
    /// entry when history is empty, or restores the newest hydrated entry.
    /// Which trigger caused it does not matter.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be reallocated or the bootstrap
    /// entry cannot be encoded.
    pub fn resize(
        &mut self,
        viewport_width: u32,
        viewport_height: u32,
        trigger: ResizeTrigger,
    ) -> EngineResult<ResizeOutcome> {
        if trigger != ResizeTrigger::Keyboard {
            self.interaction.reset(&mut self.canvas);
        }
        let outcome = self.canvas.resize(viewport_width, viewport_height, trigger)?;

        match outcome {
            ResizeOutcome::Created if !self.bootstrapped => {
                self.bootstrapped = true;
                if self.history.log().is_empty() {
                    self.record(HistoryKind::UserEdit, None)?;
                } else if let Err(e) = self.history.restore_current(&mut self.canvas) {
                    tracing::warn!("Could not restore newest history entry: {e}");
                } else {
                    self.bridge.note_local_edit();
                }
            }
            ResizeOutcome::Rescaled => self.bridge.note_local_edit(),
            ResizeOutcome::Created | ResizeOutcome::Skipped => {}
        }
        Ok(outcome)
    }

    /// Dispatch one input event, recording history for committed edits and
    /// running undo/redo shortcuts.
    ///
    /// # Errors
    ///
    /// Returns interaction, encoding or history errors. The session stays
    /// usable after any of them.
    pub fn handle_event(&mut self, event: &InputEvent) -> EngineResult<Outcome> {
        let outcome = self.interaction.handle_event(&mut self.canvas, event)?;
        match outcome {
            Outcome::Committed => self.record(HistoryKind::UserEdit, None)?,
            Outcome::UndoRequested => {
                self.undo()?;
            }
            Outcome::RedoRequested => {
                self.redo()?;
            }
            Outcome::Nothing => {}
        }
        Ok(outcome)
    }

    /// Select a tool. An open text draft is committed first.
    ///
    /// # Errors
    ///
    /// Returns an error for action tools, mid-gesture switches, or when the
    /// pending text cannot be drawn.
    pub fn select_tool(&mut self, tool: ToolId) -> EngineResult<()> {
        self.blur_text()?;
        self.interaction.select_tool(tool)
    }

    /// Apply an explicit settings change.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid values or mid-gesture changes.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> EngineResult<()> {
        self.interaction.update_settings(patch)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Step back one entry. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`](crate::EngineError::Decode) for a
    /// corrupt entry.
    pub fn undo(&mut self) -> EngineResult<bool> {
        self.interaction.reset(&mut self.canvas);
        let moved = self.history.undo(&mut self.canvas)?;
        self.after_navigation(moved);
        Ok(moved)
    }

    /// Step forward one entry. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`](crate::EngineError::Decode) for a
    /// corrupt entry.
    pub fn redo(&mut self) -> EngineResult<bool> {
        self.interaction.reset(&mut self.canvas);
        let moved = self.history.redo(&mut self.canvas)?;
        self.after_navigation(moved);
        Ok(moved)
    }

    /// Jump to the oldest entry without discarding newer ones.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`](crate::EngineError::Decode) for a
    /// corrupt entry.
    pub fn reset(&mut self) -> EngineResult<bool> {
        self.interaction.reset(&mut self.canvas);
        let moved = self.history.reset(&mut self.canvas)?;
        self.after_navigation(moved);
        Ok(moved)
    }

    /// Jump to an entry by id without discarding newer ones.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a corrupt entry.
    pub fn go_to(&mut self, id: &str) -> EngineResult<()> {
        self.interaction.reset(&mut self.canvas);
        self.history.go_to(&mut self.canvas, id)?;
        self.after_navigation(true);
        Ok(())
    }

    /// Delete a history entry after confirmation. Returns whether it was
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ItemNotFound`] for an unknown id.
    pub fn delete_item(&mut self, id: &str, confirm: &mut dyn Confirm) -> EngineResult<bool> {
        if !confirm.confirm(DestructiveAction::DeleteHistoryItem(id)) {
            return Ok(false);
        }
        self.history.delete_item(id)?;
        Ok(true)
    }

    /// Delete every history entry after confirmation. The canvas keeps its
    /// content.
    pub fn clear_history(&mut self, confirm: &mut dyn Confirm) -> bool {
        if !confirm.confirm(DestructiveAction::ClearHistory) {
            return false;
        }
        self.history.clear();
        true
    }

    // ------------------------------------------------------------------
    // Atomic edits
    // ------------------------------------------------------------------

    /// Fill the canvas with white after confirmation and record it.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be recorded.
    pub fn clear_canvas(&mut self, confirm: &mut dyn Confirm) -> EngineResult<bool> {
        if !confirm.confirm(DestructiveAction::ClearCanvas) {
            return Ok(false);
        }
        self.interaction.reset(&mut self.canvas);
        self.canvas.working_mut().fill([255, 255, 255, 255]);
        self.canvas.commit();
        self.record(HistoryKind::UserEdit, None)?;
        tracing::info!("Canvas cleared");
        Ok(true)
    }

    /// Draw an encoded image centered on the canvas and record it.
    ///
    /// Images larger than the canvas are scaled down to fit; smaller ones
    /// keep their natural size.
    ///
    /// # Errors
    ///
    /// Returns a render error if the bytes cannot be decoded; the canvas is
    /// unchanged in that case.
    pub fn import_image(&mut self, bytes: &[u8]) -> EngineResult<()> {
        let image = decode_image_bytes(bytes)?;
        self.interaction.reset(&mut self.canvas);
        let p = Placement::import(
            image.width(),
            image.height(),
            self.canvas.width(),
            self.canvas.height(),
        );
        self.canvas
            .working_mut()
            .draw_scaled(&image, p.x, p.y, p.width, p.height);
        self.canvas.commit();
        self.record(HistoryKind::UserEdit, None)?;
        tracing::info!(
            "Imported {}x{} image at {:?}",
            image.width(),
            image.height(),
            p
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Generative edits
    // ------------------------------------------------------------------

    /// Replace the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.bridge.set_prompt(prompt);
    }

    /// Capture the canvas for a generative edit.
    ///
    /// # Errors
    ///
    /// See [`GenerativeBridge::begin`].
    pub fn begin_generative_edit(&mut self) -> EngineResult<PendingEdit> {
        self.bridge.begin(&self.canvas)
    }

    /// Install a generation result and record it. Returns the new entry id.
    ///
    /// # Errors
    ///
    /// See [`GenerativeBridge::complete`]. Nothing is recorded on error.
    pub fn complete_generative_edit(
        &mut self,
        pending: PendingEdit,
        outcome: Result<GenerateResponse, BridgeError>,
    ) -> EngineResult<String> {
        let prompt = self.bridge.complete(&mut self.canvas, pending, outcome)?;
        self.interaction.reset(&mut self.canvas);
        self.history
            .append(&self.canvas, HistoryKind::AiGenerated, Some(prompt))
    }

    /// Run a full generative edit against `generator`. Returns the new entry
    /// id.
    ///
    /// # Errors
    ///
    /// Returns the first failure from [`begin_generative_edit`],
    /// the generator, or [`complete_generative_edit`].
    ///
    /// [`begin_generative_edit`]: Self::begin_generative_edit
    /// [`complete_generative_edit`]: Self::complete_generative_edit
    pub async fn submit_prompt(&mut self, generator: &dyn ImageGenerator) -> EngineResult<String> {
        let pending = self.begin_generative_edit()?;
        let outcome = generator.generate(&pending.request).await;
        self.complete_generative_edit(pending, outcome)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// The visible view: working raster over white, panned.
    ///
    /// # Errors
    ///
    /// Returns an error if the view buffer cannot be allocated.
    pub fn render_view(&self) -> EngineResult<Raster> {
        self.canvas.render_view()
    }

    /// Write a history entry as a PNG into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or when the file cannot be written.
    pub fn export_item(&self, id: &str, dir: impl AsRef<Path>) -> EngineResult<PathBuf> {
        let item = self
            .history
            .log()
            .get(id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        Ok(export_history_item(item, dir)?)
    }

    fn blur_text(&mut self) -> EngineResult<()> {
        if self.interaction.text_blur(&mut self.canvas)? == Outcome::Committed {
            self.record(HistoryKind::UserEdit, None)?;
        }
        Ok(())
    }

    fn record(&mut self, kind: HistoryKind, prompt: Option<String>) -> EngineResult<()> {
        self.history.append(&self.canvas, kind, prompt)?;
        self.bridge.note_local_edit();
        Ok(())
    }

    fn after_navigation(&mut self, moved: bool) {
        if moved {
            self.bridge.note_local_edit();
        }
    }
}

#[cfg(test)]
mod tests {
    use doodler_core::{
        AlwaysConfirm, MemoryHistoryStore, NeverConfirm, Point, PointerEvent, PointerPhase,
    };

    use super::*;

    fn session() -> Doodler {
        let config = DoodlerConfig {
            initial_width: 64,
            initial_height: 64,
            ..DoodlerConfig::default()
        };
        let mut doodler =
            Doodler::new(config, Box::new(MemoryHistoryStore::new()), None).expect("session");
        doodler.resize(96, 96, ResizeTrigger::Initial).expect("resize");
        doodler
    }

    fn pointer(doodler: &mut Doodler, phase: PointerPhase, p: Point) -> Outcome {
        doodler
            .handle_event(&InputEvent::Pointer(PointerEvent::new(phase, p.x, p.y)))
            .expect("event")
    }

    #[test]
    fn test_initial_resize_bootstraps_once() {
        let mut doodler = session();
        assert_eq!(doodler.history().len(), 1);
        doodler.resize(96, 96, ResizeTrigger::Viewport).expect("resize");
        doodler.resize(80, 96, ResizeTrigger::Keyboard).expect("resize");
        assert_eq!(doodler.history().len(), 1);
    }

    #[test]
    fn test_first_viewport_resize_still_bootstraps() {
        let mut doodler = Doodler::new(
            DoodlerConfig::default(),
            Box::new(MemoryHistoryStore::new()),
            None,
        )
        .expect("session");
        assert_eq!(
            doodler.resize(96, 96, ResizeTrigger::Keyboard).expect("resize"),
            ResizeOutcome::Skipped
        );
        assert!(doodler.history().is_empty());

        assert_eq!(
            doodler.resize(96, 96, ResizeTrigger::Viewport).expect("resize"),
            ResizeOutcome::Created
        );
        assert_eq!(doodler.history().len(), 1);
        assert_eq!(doodler.history().cursor(), Some(0));

        assert_eq!(
            doodler.resize(120, 96, ResizeTrigger::Initial).expect("resize"),
            ResizeOutcome::Rescaled
        );
        assert_eq!(doodler.history().len(), 1);
    }

    #[test]
    fn test_stroke_records_history() {
        let mut doodler = session();
        pointer(&mut doodler, PointerPhase::Down, Point::new(5.0, 5.0));
        pointer(&mut doodler, PointerPhase::Move, Point::new(30.0, 5.0));
        assert_eq!(
            pointer(&mut doodler, PointerPhase::Up, Point::new(30.0, 5.0)),
            Outcome::Committed
        );
        assert_eq!(doodler.history().len(), 2);
        assert_eq!(doodler.history().cursor(), Some(1));
    }

    #[test]
    fn test_clear_canvas_requires_confirmation() {
        let mut doodler = session();
        assert!(!doodler.clear_canvas(&mut NeverConfirm).expect("clear"));
        assert_eq!(doodler.history().len(), 1);
        assert!(doodler.clear_canvas(&mut AlwaysConfirm).expect("clear"));
        assert_eq!(doodler.history().len(), 2);
    }

    #[test]
    fn test_delete_and_clear_history_confirmation() {
        let mut doodler = session();
        let id = doodler.history().items()[0].id.clone();
        let mut asked = Vec::new();
        let mut recorder = |action: DestructiveAction<'_>| {
            asked.push(action.message());
            false
        };
        assert!(!doodler.delete_item(&id, &mut recorder).expect("delete"));
        assert_eq!(asked, vec!["Are you sure you want to delete this item?"]);
        assert!(!doodler.clear_history(&mut NeverConfirm));
        assert_eq!(doodler.history().len(), 1);

        assert!(doodler.delete_item(&id, &mut AlwaysConfirm).expect("delete"));
        assert!(doodler.history().is_empty());
        assert_eq!(doodler.history().cursor(), None);
    }

    #[test]
    fn test_import_rejects_garbage_without_mutation() {
        let mut doodler = session();
        let before = doodler.canvas().snapshot().clone();
        assert!(doodler.import_image(b"not an image").is_err());
        assert_eq!(doodler.canvas().snapshot(), &before);
        assert_eq!(doodler.history().len(), 1);
    }

    #[test]
    fn test_import_centers_small_image() {
        let mut doodler = session();
        let red = Raster::filled(4, 4, [255, 0, 0, 255]).expect("raster");
        let png = red.encode_png().expect("png");
        doodler.import_image(&png).expect("import");
        let (w, h) = (doodler.canvas().width(), doodler.canvas().height());
        let center = doodler.canvas().snapshot().pixel(w / 2, h / 2).expect("pixel");
        assert!(center[0] > 250 && center[1] < 5, "expected red, got {center:?}");
        assert_eq!(doodler.canvas().snapshot().pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(doodler.history().len(), 2);
    }

    #[test]
    fn test_select_tool_commits_text_draft_first() {
        let mut doodler = session();
        doodler.select_tool(ToolId::Text).expect("tool");
        pointer(&mut doodler, PointerPhase::Down, Point::new(5.0, 5.0));
        assert_eq!(doodler.state(), InteractionState::TextEditing);
        // Empty draft: switching tools just closes it.
        doodler.select_tool(ToolId::Brush).expect("tool");
        assert_eq!(doodler.state(), InteractionState::Idle);
        assert_eq!(doodler.history().len(), 1);
    }

    #[test]
    fn test_export_unknown_item() {
        let doodler = session();
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(doodler.export_item("missing", dir.path()).is_err());
        let id = doodler.history().items()[0].id.clone();
        let path = doodler.export_item(&id, dir.path()).expect("export");
        assert!(path.exists());
    }
}
