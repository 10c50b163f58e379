//! Input events for canvas interaction.

use serde::{Deserialize, Serialize};

use crate::ClientRect;

/// Phase of a pointer (mouse/pen) event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Pointer left the canvas element.
    Leave,
}

/// A pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in viewport pixels.
    pub client_x: f32,
    /// Y position in viewport pixels.
    pub client_y: f32,
    /// Bounding rect of the canvas element at the time of the event.
    ///
    /// `None` means the element is rendered unscaled at the origin.
    #[serde(default)]
    pub rect: Option<ClientRect>,
}

impl PointerEvent {
    /// Create a pointer event without an explicit element rect.
    #[must_use]
    pub const fn new(phase: PointerPhase, client_x: f32, client_y: f32) -> Self {
        Self {
            phase,
            client_x,
            client_y,
            rect: None,
        }
    }

    /// Attach the element rect.
    #[must_use]
    pub const fn with_rect(mut self, rect: ClientRect) -> Self {
        self.rect = Some(rect);
        self
    }
}

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch cancelled (e.g., palm rejection).
    Cancel,
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in viewport pixels.
    pub client_x: f32,
    /// Y position in viewport pixels.
    pub client_y: f32,
}

/// A touch event with one or more touch points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// All current touch points.
    #[serde(default)]
    pub touches: Vec<TouchPoint>,
    /// Bounding rect of the canvas element.
    #[serde(default)]
    pub rect: Option<ClientRect>,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self {
            phase,
            touches,
            rect: None,
        }
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Translate into the equivalent pointer event.
    ///
    /// Start and move need a primary touch and are dropped without one. End
    /// and cancel carry no position, which pointer up/leave never read.
    #[must_use]
    pub fn as_pointer(&self) -> Option<PointerEvent> {
        let phase = match self.phase {
            TouchPhase::Start => PointerPhase::Down,
            TouchPhase::Move => PointerPhase::Move,
            TouchPhase::End => PointerPhase::Up,
            TouchPhase::Cancel => PointerPhase::Leave,
        };
        let (client_x, client_y) = match (self.phase, self.primary_touch()) {
            (_, Some(t)) => (t.client_x, t.client_y),
            (TouchPhase::End | TouchPhase::Cancel, None) => (0.0, 0.0),
            _ => return None,
        };
        Some(PointerEvent {
            phase,
            client_x,
            client_y,
            rect: self.rect,
        })
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    #[serde(default)]
    pub shift: bool,
    /// Control key pressed.
    #[serde(default)]
    pub ctrl: bool,
    /// Alt/Option key pressed.
    #[serde(default)]
    pub alt: bool,
    /// Meta/Command key pressed.
    #[serde(default)]
    pub meta: bool,
}

impl KeyModifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub const fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// All input events the canvas can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Pointer (mouse) event.
    Pointer(PointerEvent),

    /// Raw touch event.
    Touch(TouchEvent),

    /// Keyboard event.
    Key {
        /// Key name (`"Escape"`, `"z"`, ...).
        key: String,
        /// Whether the key is pressed.
        #[serde(default = "default_pressed")]
        pressed: bool,
        /// Active modifier keys.
        #[serde(default)]
        modifiers: KeyModifiers,
    },

    /// The text overlay's value changed.
    TextInput {
        /// Full current draft.
        value: String,
    },

    /// The text overlay lost focus.
    TextBlur,
}

const fn default_pressed() -> bool {
    true
}
