//! Pointer, touch, keyboard and text-overlay handling.
//!
//! The engine is a small state machine:
//!
//! ```text
//!            down(hand)            down(text)
//!   Panning <────────── Idle ──────────────> TextEditing
//!      │  up/leave/Esc   ▲  ▲   blur/Esc           │
//!      └─────────────────┘  └──────────────────────┘
//!                        │ ▲
//!  down(brush, eraser,   │ │ up/leave (commit iff moved), Esc (restore)
//!  line, rect, ellipse)  ▼ │
//!                      Drawing
//! ```
//!
//! A fill click is handled entirely on pointer down and never leaves `Idle`.
//! The engine reports commits and history shortcuts through [`Outcome`];
//! recording history is the caller's job.

use std::sync::Arc;

use doodler_core::{
    pointer_to_canvas_coords, CanvasError, ClientRect, InputEvent, KeyModifiers, Point,
    PointerEvent, PointerPhase, SettingsPatch, TextEditState, Tool, ToolId, ToolSettings,
};
use doodler_renderer::{
    draw_shape, flood_fill, BrushKind, FreehandStroke, ShapeKind, ShapeStyle, TextRenderer,
};

use crate::canvas::CanvasModel;
use crate::error::EngineResult;

/// Interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Waiting for input.
    Idle,
    /// A drawing gesture with the given tool is in progress.
    Drawing(ToolId),
    /// The view is being dragged.
    Panning,
    /// A text draft is open.
    TextEditing,
}

/// What an input event asks of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to record.
    Nothing,
    /// The working raster was committed; record a user edit.
    Committed,
    /// The user asked to undo.
    UndoRequested,
    /// The user asked to redo.
    RedoRequested,
}

/// Per-gesture state owned by the active handler.
#[derive(Debug, Clone)]
pub enum GestureState {
    /// Freehand stroke in progress.
    Freehand(FreehandStroke),
    /// Shape preview anchored at `start`.
    Shape {
        /// Which shape.
        kind: ShapeKind,
        /// Drag origin.
        start: Point,
        /// Resolved colors and width.
        style: ShapeStyle,
    },
}

/// Tool behavior for a drag gesture.
pub trait GestureHandler: Sync {
    /// Begin a gesture at `start` (logical coordinates).
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be resolved.
    fn on_start(
        &self,
        canvas: &mut CanvasModel,
        settings: &ToolSettings,
        start: Point,
    ) -> EngineResult<GestureState>;

    /// Continue the gesture to `point` (logical coordinates).
    fn on_move(&self, canvas: &mut CanvasModel, state: &mut GestureState, point: Point);
}

struct FreehandHandler(BrushKind);

impl GestureHandler for FreehandHandler {
    fn on_start(
        &self,
        _canvas: &mut CanvasModel,
        settings: &ToolSettings,
        start: Point,
    ) -> EngineResult<GestureState> {
        Ok(GestureState::Freehand(FreehandStroke::begin(
            self.0, settings, start,
        )?))
    }

    fn on_move(&self, canvas: &mut CanvasModel, state: &mut GestureState, point: Point) {
        if let GestureState::Freehand(stroke) = state {
            stroke.extend(canvas.working_mut(), point);
        }
    }
}

struct ShapeHandler(ShapeKind);

impl GestureHandler for ShapeHandler {
    fn on_start(
        &self,
        _canvas: &mut CanvasModel,
        settings: &ToolSettings,
        start: Point,
    ) -> EngineResult<GestureState> {
        Ok(GestureState::Shape {
            kind: self.0,
            start,
            style: ShapeStyle::from_settings(settings)?,
        })
    }

    fn on_move(&self, canvas: &mut CanvasModel, state: &mut GestureState, point: Point) {
        if let GestureState::Shape { kind, start, style } = state {
            // Replay from the committed snapshot so only the latest preview shows.
            canvas.discard();
            draw_shape(canvas.working_mut(), *kind, *start, point, style);
        }
    }
}

static BRUSH: FreehandHandler = FreehandHandler(BrushKind::Brush);
static ERASER: FreehandHandler = FreehandHandler(BrushKind::Eraser);
static LINE: ShapeHandler = ShapeHandler(ShapeKind::Line);
static RECTANGLE: ShapeHandler = ShapeHandler(ShapeKind::Rectangle);
static ELLIPSE: ShapeHandler = ShapeHandler(ShapeKind::Ellipse);

/// Drag handler for a tool, if the tool draws by dragging.
#[must_use]
pub fn gesture_handler(tool: ToolId) -> Option<&'static dyn GestureHandler> {
    match tool {
        ToolId::Brush => Some(&BRUSH),
        ToolId::Eraser => Some(&ERASER),
        ToolId::Line => Some(&LINE),
        ToolId::Rectangle => Some(&RECTANGLE),
        ToolId::Ellipse => Some(&ELLIPSE),
        ToolId::Fill | ToolId::Text | ToolId::Hand | ToolId::Image | ToolId::Clear => None,
    }
}

struct ActiveGesture {
    tool: ToolId,
    handler: &'static dyn GestureHandler,
    state: GestureState,
    start: Point,
    has_moved: bool,
}

/// Translates input events into canvas mutations.
pub struct InteractionEngine {
    state: InteractionState,
    tool: ToolId,
    settings: ToolSettings,
    text: TextEditState,
    gesture: Option<ActiveGesture>,
    pan_last: Option<Point>,
    text_renderer: Option<Arc<dyn TextRenderer>>,
}

impl std::fmt::Debug for InteractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("state", &self.state)
            .field("tool", &self.tool)
            .field("settings", &self.settings)
            .field("text", &self.text)
            .field("has_text_renderer", &self.text_renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl InteractionEngine {
    /// Create an idle engine with the brush selected.
    #[must_use]
    pub fn new(text_renderer: Option<Arc<dyn TextRenderer>>) -> Self {
        let mut settings = ToolSettings::default();
        settings.apply_tool_defaults(Tool::get(ToolId::Brush));
        Self {
            state: InteractionState::Idle,
            tool: ToolId::Brush,
            settings,
            text: TextEditState::default(),
            gesture: None,
            pan_last: None,
            text_renderer,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    /// Selected tool.
    #[must_use]
    pub const fn tool(&self) -> ToolId {
        self.tool
    }

    /// Current tool settings.
    #[must_use]
    pub const fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Text draft.
    #[must_use]
    pub const fn text(&self) -> &TextEditState {
        &self.text
    }

    /// Install or remove the text renderer.
    pub fn set_text_renderer(&mut self, renderer: Option<Arc<dyn TextRenderer>>) {
        self.text_renderer = renderer;
    }

    /// Select a tool, merging its defaults into the settings.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] for one-shot actions and
    /// while a drag is in progress.
    pub fn select_tool(&mut self, tool: ToolId) -> EngineResult<()> {
        if tool.is_action() {
            return Err(CanvasError::InvalidOperation(format!(
                "{tool} is an action, not a tool"
            ))
            .into());
        }
        if matches!(
            self.state,
            InteractionState::Drawing(_) | InteractionState::Panning
        ) {
            return Err(CanvasError::InvalidOperation(format!(
                "cannot switch tools while {:?}",
                self.state
            ))
            .into());
        }
        self.settings.apply_tool_defaults(Tool::get(tool));
        self.tool = tool;
        tracing::debug!("Selected tool {tool}");
        Ok(())
    }

    /// Apply an explicit settings change.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is invalid or a drag is in progress.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> EngineResult<()> {
        if matches!(self.state, InteractionState::Drawing(_)) {
            return Err(CanvasError::InvalidOperation(
                "cannot change settings mid-stroke".to_string(),
            )
            .into());
        }
        self.settings.update(patch)?;
        Ok(())
    }

    /// Dispatch one input event.
    ///
    /// Pointer and touch positions are mapped through the element rect the
    /// event carries. Events whose rect has no rendered area are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a drawing primitive fails; the engine is left idle.
    pub fn handle_event(
        &mut self,
        canvas: &mut CanvasModel,
        event: &InputEvent,
    ) -> EngineResult<Outcome> {
        match event {
            InputEvent::Pointer(pointer) => self.handle_pointer(canvas, pointer),
            InputEvent::Touch(touch) => match touch.as_pointer() {
                Some(pointer) => self.handle_pointer(canvas, &pointer),
                None => Ok(Outcome::Nothing),
            },
            InputEvent::Key {
                key,
                pressed,
                modifiers,
            } => {
                if *pressed {
                    Ok(self.key_down(canvas, key, *modifiers))
                } else {
                    Ok(Outcome::Nothing)
                }
            }
            InputEvent::TextInput { value } => {
                self.text_input(value);
                Ok(Outcome::Nothing)
            }
            InputEvent::TextBlur => self.text_blur(canvas),
        }
    }

    fn handle_pointer(
        &mut self,
        canvas: &mut CanvasModel,
        pointer: &PointerEvent,
    ) -> EngineResult<Outcome> {
        match pointer.phase {
            PointerPhase::Up | PointerPhase::Leave => return Ok(self.pointer_up(canvas)),
            PointerPhase::Down | PointerPhase::Move => {}
        }

        let rect = pointer
            .rect
            .unwrap_or_else(|| ClientRect::unscaled(canvas.width(), canvas.height()));
        let Some(point) = pointer_to_canvas_coords(
            &rect,
            canvas.width(),
            canvas.height(),
            pointer.client_x,
            pointer.client_y,
        ) else {
            tracing::warn!("Dropping pointer event: canvas element has no rendered area");
            return Ok(Outcome::Nothing);
        };

        if pointer.phase == PointerPhase::Down {
            self.pointer_down(canvas, point)
        } else {
            self.pointer_move(canvas, point);
            Ok(Outcome::Nothing)
        }
    }

    /// Handle a press at `point` (canvas coordinates, before pan).
    ///
    /// # Errors
    ///
    /// Returns an error if the tool's settings cannot be resolved or text
    /// cannot be committed. The engine is left idle.
    pub fn pointer_down(
        &mut self,
        canvas: &mut CanvasModel,
        point: Point,
    ) -> EngineResult<Outcome> {
        let mut outcome = Outcome::Nothing;
        match self.state {
            InteractionState::TextEditing => outcome = self.text_blur(canvas)?,
            InteractionState::Idle => {}
            // A second press without a release; finish the first gesture.
            InteractionState::Drawing(_) | InteractionState::Panning => {
                outcome = self.pointer_up(canvas);
            }
        }

        let logical = canvas.to_logical(point);
        match self.tool {
            ToolId::Hand => {
                self.pan_last = Some(point);
                self.state = InteractionState::Panning;
            }
            ToolId::Text => {
                self.text.activate(logical);
                self.state = InteractionState::TextEditing;
            }
            ToolId::Fill => {
                let color = self.settings.stroke_rgba()?;
                if flood_fill(canvas.working_mut(), logical, color) > 0 {
                    canvas.commit();
                    outcome = Outcome::Committed;
                }
            }
            tool => {
                if let Some(handler) = gesture_handler(tool) {
                    let state = handler.on_start(canvas, &self.settings, logical)?;
                    self.gesture = Some(ActiveGesture {
                        tool,
                        handler,
                        state,
                        start: logical,
                        has_moved: false,
                    });
                    self.state = InteractionState::Drawing(tool);
                }
            }
        }
        tracing::trace!("Pointer down at {point:?} -> {:?}", self.state);
        Ok(outcome)
    }

    /// Handle pointer motion to `point` (canvas coordinates, before pan).
    pub fn pointer_move(&mut self, canvas: &mut CanvasModel, point: Point) {
        match self.state {
            InteractionState::Panning => {
                if let Some(last) = self.pan_last {
                    canvas.pan(point.x - last.x, point.y - last.y);
                }
                self.pan_last = Some(point);
            }
            InteractionState::Drawing(_) => {
                let logical = canvas.to_logical(point);
                if let Some(gesture) = self.gesture.as_mut() {
                    if logical != gesture.start {
                        gesture.has_moved = true;
                    }
                    gesture.handler.on_move(canvas, &mut gesture.state, logical);
                }
            }
            InteractionState::Idle | InteractionState::TextEditing => {}
        }
    }

    /// Handle release or the pointer leaving the canvas.
    pub fn pointer_up(&mut self, canvas: &mut CanvasModel) -> Outcome {
        match self.state {
            InteractionState::Panning => {
                self.pan_last = None;
                self.state = InteractionState::Idle;
                tracing::debug!("Pan ended at offset {:?}", canvas.pan_offset());
                Outcome::Nothing
            }
            InteractionState::Drawing(_) => {
                self.state = InteractionState::Idle;
                match self.gesture.take() {
                    Some(gesture) if gesture.has_moved => {
                        canvas.commit();
                        tracing::debug!("Committed {} gesture", gesture.tool);
                        Outcome::Committed
                    }
                    _ => {
                        canvas.discard();
                        Outcome::Nothing
                    }
                }
            }
            InteractionState::Idle | InteractionState::TextEditing => Outcome::Nothing,
        }
    }

    /// Handle a key press.
    pub fn key_down(
        &mut self,
        canvas: &mut CanvasModel,
        key: &str,
        modifiers: KeyModifiers,
    ) -> Outcome {
        if key == "Escape" {
            self.cancel(canvas);
            return Outcome::Nothing;
        }
        if self.state != InteractionState::Idle || !modifiers.command() {
            return Outcome::Nothing;
        }
        match key.to_ascii_lowercase().as_str() {
            "z" if modifiers.shift => Outcome::RedoRequested,
            "z" => Outcome::UndoRequested,
            "y" => Outcome::RedoRequested,
            _ => Outcome::Nothing,
        }
    }

    /// Abort whatever is in progress without committing.
    ///
    /// A drag restores the pre-gesture snapshot, a text draft is dropped and
    /// panning stops where it is.
    pub fn cancel(&mut self, canvas: &mut CanvasModel) {
        match self.state {
            InteractionState::Drawing(_) => {
                self.gesture = None;
                canvas.discard();
            }
            InteractionState::TextEditing => self.text.deactivate(),
            InteractionState::Panning => self.pan_last = None,
            InteractionState::Idle => return,
        }
        tracing::debug!("Cancelled {:?}", self.state);
        self.state = InteractionState::Idle;
    }

    /// Replace the text draft.
    pub fn text_input(&mut self, value: &str) {
        if self.state == InteractionState::TextEditing {
            self.text.set_value(value);
        }
    }

    /// Close the text draft, drawing it if it has content.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ResourceUnavailable`] when text must be drawn
    /// but no text renderer is installed. The draft is dropped either way.
    pub fn text_blur(&mut self, canvas: &mut CanvasModel) -> EngineResult<Outcome> {
        if self.state != InteractionState::TextEditing {
            return Ok(Outcome::Nothing);
        }
        self.state = InteractionState::Idle;

        if !self.text.has_content() {
            self.text.deactivate();
            return Ok(Outcome::Nothing);
        }
        let Some((origin, value)) = self.text.take() else {
            return Ok(Outcome::Nothing);
        };
        let Some(renderer) = self.text_renderer.as_ref() else {
            tracing::warn!("Dropping text draft: no text renderer available");
            return Err(CanvasError::ResourceUnavailable("text renderer".to_string()).into());
        };

        let color = self.settings.stroke_rgba()?;
        if let Err(e) = renderer.draw_block(
            canvas.working_mut(),
            &value,
            origin,
            self.settings.font_size,
            &self.settings.font_family,
            color,
        ) {
            canvas.discard();
            return Err(e.into());
        }
        canvas.commit();
        tracing::debug!("Committed {} chars of text at {origin:?}", value.len());
        Ok(Outcome::Committed)
    }

    /// Reset to idle, dropping any gesture or draft. Used when the canvas is
    /// replaced underneath the engine.
    pub fn reset(&mut self, canvas: &mut CanvasModel) {
        self.cancel(canvas);
    }
}
