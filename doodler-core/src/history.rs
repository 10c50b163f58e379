//! History items and the cursor-tracked log they live in.
//!
//! The log is pure bookkeeping: it never touches rasters or storage. The
//! engine decides what to install on the canvas and what to mirror to a
//! [`HistoryStore`](crate::store::HistoryStore).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::current_timestamp_ms;
use crate::{CanvasError, CanvasResult};

/// Where a history entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryKind {
    /// Produced by a local drawing action.
    #[serde(rename = "user-edit")]
    UserEdit,
    /// Produced by the generative edit service.
    #[serde(rename = "ai-generated")]
    AiGenerated,
}

impl HistoryKind {
    /// Short tag used in download file names.
    #[must_use]
    pub const fn file_tag(self) -> &'static str {
        match self {
            Self::UserEdit => "user",
            Self::AiGenerated => "ai",
        }
    }
}

/// An immutable snapshot of the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// PNG data URL of the committed raster.
    pub image_data: String,
    /// Prompt that produced this entry, for generated edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Origin of the entry.
    #[serde(rename = "type")]
    pub kind: HistoryKind,
}

impl HistoryItem {
    /// Create an item stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(image_data: String, kind: HistoryKind, prompt: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: current_timestamp_ms(),
            image_data,
            prompt,
            kind,
        }
    }

    /// A locally drawn entry.
    #[must_use]
    pub fn user_edit(image_data: String) -> Self {
        Self::new(image_data, HistoryKind::UserEdit, None)
    }

    /// A generated entry with the prompt that produced it.
    #[must_use]
    pub fn ai_generated(image_data: String, prompt: impl Into<String>) -> Self {
        Self::new(image_data, HistoryKind::AiGenerated, Some(prompt.into()))
    }
}

/// Ordered history with a cursor.
///
/// The cursor is `None` when the log is empty (or every item before the
/// cursor was deleted) and otherwise indexes the entry currently shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    items: Vec<HistoryItem>,
    cursor: Option<usize>,
}

impl HistoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from persisted items with the cursor on the newest one.
    #[must_use]
    pub fn from_items(mut items: Vec<HistoryItem>) -> Self {
        items.sort_by_key(|item| item.timestamp);
        let cursor = items.len().checked_sub(1);
        Self { items, cursor }
    }

    /// All items, oldest first.
    #[must_use]
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Current cursor position.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryItem> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Index of an item by id.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Whether there is an older entry to step back to.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Whether there is a newer entry to step forward to.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        match self.cursor {
            Some(c) => c + 1 < self.items.len(),
            None => !self.items.is_empty(),
        }
    }

    /// Append an item after the cursor.
    ///
    /// Anything after the cursor (the redo branch) is discarded and returned
    /// so callers can drop it from storage too.
    pub fn append(&mut self, item: HistoryItem) -> Vec<HistoryItem> {
        let keep = self.cursor.map_or(0, |c| c + 1);
        let truncated = if keep < self.items.len() {
            self.items.split_off(keep)
        } else {
            Vec::new()
        };
        self.items.push(item);
        self.cursor = Some(self.items.len() - 1);
        truncated
    }

    /// Index the cursor would move to on undo, if any.
    #[must_use]
    pub fn undo_target(&self) -> Option<usize> {
        self.can_undo()
            .then(|| self.cursor.map_or(0, |c| c - 1))
    }

    /// Index the cursor would move to on redo, if any.
    #[must_use]
    pub fn redo_target(&self) -> Option<usize> {
        self.can_redo()
            .then(|| self.cursor.map_or(0, |c| c + 1))
    }

    /// Move the cursor to `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] if `index` is out of range.
    pub fn set_cursor(&mut self, index: usize) -> CanvasResult<()> {
        if index >= self.items.len() {
            return Err(CanvasError::InvalidOperation(format!(
                "history index {index} out of range (len {})",
                self.items.len()
            )));
        }
        self.cursor = Some(index);
        Ok(())
    }

    /// Remove an item by id, keeping the cursor on the same visible entry
    /// where possible.
    ///
    /// When the removed index is at or before the cursor the cursor steps
    /// back by one, stopping at `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ItemNotFound`] if no item has this id.
    pub fn remove(&mut self, id: &str) -> CanvasResult<HistoryItem> {
        let index = self
            .position(id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        let removed = self.items.remove(index);
        if let Some(c) = self.cursor {
            if index <= c {
                self.cursor = c.checked_sub(1);
            }
        }
        Ok(removed)
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }
}
