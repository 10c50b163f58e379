//! In-progress text placement.

use serde::{Deserialize, Serialize};

use crate::Point;

/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

/// Draft text being typed onto the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextEditState {
    /// Whether a draft is open.
    pub active: bool,
    /// Anchor in canvas-logical coordinates (pan offset already removed).
    pub position: Option<Point>,
    /// Current draft.
    pub value: String,
}

impl TextEditState {
    /// Open a draft at `position` with an empty value.
    pub fn activate(&mut self, position: Point) {
        self.active = true;
        self.position = Some(position);
        self.value.clear();
    }

    /// Replace the draft value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Whether the draft contains anything worth committing.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.value.trim().is_empty()
    }

    /// Close the draft, returning its anchor and text.
    pub fn take(&mut self) -> Option<(Point, String)> {
        self.active = false;
        let value = std::mem::take(&mut self.value);
        self.position.map(|p| (p, value))
    }

    /// Close the draft without returning anything.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.value.clear();
    }
}
