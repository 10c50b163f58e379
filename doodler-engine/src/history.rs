//! Undo/redo history over canvas snapshots.
//!
//! The in-memory [`HistoryLog`] is authoritative. Every mutation is mirrored
//! to a [`HistoryStore`]; store failures are logged and never roll back the
//! log, so a session keeps working when persistence does not.

use doodler_core::{CanvasError, HistoryItem, HistoryKind, HistoryLog, HistoryStore};
use doodler_renderer::{decode_data_url, encode_png_data_url};

use crate::canvas::CanvasModel;
use crate::error::{EngineError, EngineResult};

/// History log plus its persistent mirror.
pub struct HistoryEngine {
    log: HistoryLog,
    store: Box<dyn HistoryStore>,
}

impl std::fmt::Debug for HistoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryEngine")
            .field("len", &self.log.len())
            .field("cursor", &self.log.cursor())
            .finish_non_exhaustive()
    }
}

impl HistoryEngine {
    /// Create an empty history backed by `store`.
    #[must_use]
    pub fn new(store: Box<dyn HistoryStore>) -> Self {
        Self {
            log: HistoryLog::new(),
            store,
        }
    }

    /// The underlying log.
    #[must_use]
    pub const fn log(&self) -> &HistoryLog {
        &self.log
    }

    /// Replace the log with what the store holds, cursor on the newest item.
    ///
    /// Returns the number of items loaded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read; the log is
    /// left unchanged.
    pub fn hydrate(&mut self) -> EngineResult<usize> {
        let items = self.store.get_all_ordered_by_timestamp()?;
        self.log = HistoryLog::from_items(items);
        tracing::info!("Hydrated {} history items", self.log.len());
        Ok(self.log.len())
    }

    /// Record the canvas snapshot as a new entry after the cursor and return
    /// its id.
    ///
    /// Entries past the cursor are discarded from the log and the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded. Nothing is
    /// recorded in that case.
    pub fn append(
        &mut self,
        canvas: &CanvasModel,
        kind: HistoryKind,
        prompt: Option<String>,
    ) -> EngineResult<String> {
        let image_data = encode_png_data_url(canvas.snapshot())?;
        Ok(self.push(HistoryItem::new(image_data, kind, prompt)))
    }

    /// Record an already-built entry after the cursor and return its id.
    ///
    /// Timestamps are kept strictly increasing so a hydrated log replays in
    /// append order.
    pub fn push(&mut self, mut item: HistoryItem) -> String {
        if let Some(last) = self.log.items().last() {
            if item.timestamp <= last.timestamp {
                item.timestamp = last.timestamp + 1;
            }
        }
        if let Err(e) = self.store.put(&item) {
            tracing::warn!("Failed to persist history item {}: {e}", item.id);
        }
        let id = item.id.clone();
        let kind = item.kind;
        let truncated = self.log.append(item);
        for stale in &truncated {
            if let Err(e) = self.store.delete(&stale.id) {
                tracing::warn!("Failed to delete truncated history item {}: {e}", stale.id);
            }
        }
        if !truncated.is_empty() {
            tracing::debug!("Discarded {} redo entries", truncated.len());
        }
        tracing::debug!(
            "Appended {} entry {id} at index {:?}",
            kind.file_tag(),
            self.log.cursor()
        );
        id
    }

    /// Step back one entry. Returns whether the cursor moved.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] if the target entry is corrupt; the
    /// cursor and canvas are unchanged.
    pub fn undo(&mut self, canvas: &mut CanvasModel) -> EngineResult<bool> {
        match self.log.undo_target() {
            Some(index) => self.install(canvas, index).map(|()| true),
            None => Ok(false),
        }
    }

    /// Step forward one entry. Returns whether the cursor moved.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] if the target entry is corrupt.
    pub fn redo(&mut self, canvas: &mut CanvasModel) -> EngineResult<bool> {
        match self.log.redo_target() {
            Some(index) => self.install(canvas, index).map(|()| true),
            None => Ok(false),
        }
    }

    /// Jump to the oldest entry without truncating. Returns whether there was
    /// anything to jump to.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] if the entry is corrupt.
    pub fn reset(&mut self, canvas: &mut CanvasModel) -> EngineResult<bool> {
        if self.log.is_empty() {
            return Ok(false);
        }
        self.install(canvas, 0).map(|()| true)
    }

    /// Jump to the entry with `id` without truncating.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ItemNotFound`] for an unknown id
    /// and [`EngineError::Decode`] for a corrupt entry.
    pub fn go_to(&mut self, canvas: &mut CanvasModel, id: &str) -> EngineResult<()> {
        let index = self
            .log
            .position(id)
            .ok_or_else(|| CanvasError::ItemNotFound(id.to_string()))?;
        self.install(canvas, index)
    }

    /// Restore the entry under the cursor, if any. Used after hydration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] if the entry is corrupt.
    pub fn restore_current(&mut self, canvas: &mut CanvasModel) -> EngineResult<bool> {
        match self.log.cursor() {
            Some(index) => self.install(canvas, index).map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove an entry. The canvas is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ItemNotFound`] for an unknown id;
    /// the cursor is unchanged.
    pub fn delete_item(&mut self, id: &str) -> EngineResult<HistoryItem> {
        let removed = self.log.remove(id)?;
        if let Err(e) = self.store.delete(id) {
            tracing::warn!("Failed to delete history item {id} from store: {e}");
        }
        tracing::debug!("Deleted history item {id}, cursor now {:?}", self.log.cursor());
        Ok(removed)
    }

    /// Remove every entry from the log and the store.
    pub fn clear(&mut self) {
        self.log.clear();
        if let Err(e) = self.store.clear_all() {
            tracing::warn!("Failed to clear history store: {e}");
        }
        tracing::info!("History cleared");
    }

    fn install(&mut self, canvas: &mut CanvasModel, index: usize) -> EngineResult<()> {
        let item = self
            .log
            .items()
            .get(index)
            .ok_or_else(|| CanvasError::InvalidOperation(format!("no history entry at {index}")))?;
        let raster = decode_data_url(&item.image_data).map_err(|source| {
            tracing::warn!("History item {} is not decodable: {source}", item.id);
            EngineError::Decode {
                id: item.id.clone(),
                source,
            }
        })?;
        canvas.apply_snapshot(raster)?;
        self.log.set_cursor(index)?;
        tracing::debug!("Installed history entry {index}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use doodler_core::{MemoryHistoryStore, StoreError};

    use super::*;
    use crate::config::DoodlerConfig;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn put(&self, _: &HistoryItem) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn get(&self, id: &str) -> Result<HistoryItem, StoreError> {
            Err(StoreError::ItemNotFound(id.to_string()))
        }
        fn get_all_ordered_by_timestamp(&self) -> Result<Vec<HistoryItem>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn delete(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn clear_all(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    fn canvas() -> CanvasModel {
        CanvasModel::new(&DoodlerConfig {
            initial_width: 8,
            initial_height: 8,
            ..DoodlerConfig::default()
        })
        .expect("canvas")
    }

    /// Paint pixel (0, n) red, commit and record it.
    fn edit(history: &mut HistoryEngine, canvas: &mut CanvasModel, n: u32) -> String {
        canvas.working_mut().set_pixel(0, n, RED);
        canvas.commit();
        history
            .append(canvas, HistoryKind::UserEdit, None)
            .expect("append")
    }

    #[test]
    fn test_undo_redo_restore_pixels() {
        let store = MemoryHistoryStore::new();
        let mut history = HistoryEngine::new(Box::new(store));
        let mut canvas = canvas();
        history
            .append(&canvas, HistoryKind::UserEdit, None)
            .expect("bootstrap");
        edit(&mut history, &mut canvas, 1);

        assert!(history.undo(&mut canvas).expect("undo"));
        assert_eq!(canvas.snapshot().pixel(0, 1), Some(WHITE));
        assert!(!history.undo(&mut canvas).expect("undo at start"));

        assert!(history.redo(&mut canvas).expect("redo"));
        assert_eq!(canvas.snapshot().pixel(0, 1), Some(RED));
        assert!(!history.redo(&mut canvas).expect("redo at end"));
    }

    #[test]
    fn test_append_after_undo_truncates_store_too() {
        let store = MemoryHistoryStore::new();
        let mut history = HistoryEngine::new(Box::new(store.clone()));
        let mut canvas = canvas();
        edit(&mut history, &mut canvas, 0);
        let dropped = edit(&mut history, &mut canvas, 1);
        history.undo(&mut canvas).expect("undo");
        edit(&mut history, &mut canvas, 2);

        assert_eq!(history.log().len(), 2);
        assert_eq!(history.log().cursor(), Some(1));
        assert!(history.log().get(&dropped).is_none());
        assert_eq!(store.len(), 2);
        assert!(store.get(&dropped).is_err());
    }

    #[test]
    fn test_reset_and_go_to_keep_entries() {
        let mut history = HistoryEngine::new(Box::new(MemoryHistoryStore::new()));
        let mut canvas = canvas();
        edit(&mut history, &mut canvas, 0);
        let second = edit(&mut history, &mut canvas, 1);
        edit(&mut history, &mut canvas, 2);

        assert!(history.reset(&mut canvas).expect("reset"));
        assert_eq!(history.log().cursor(), Some(0));
        assert_eq!(history.log().len(), 3);

        history.go_to(&mut canvas, &second).expect("go to");
        assert_eq!(history.log().cursor(), Some(1));
        assert_eq!(canvas.snapshot().pixel(0, 1), Some(RED));
        assert_eq!(canvas.snapshot().pixel(0, 2), Some(WHITE));
        assert!(history.go_to(&mut canvas, "missing").is_err());
    }

    #[test]
    fn test_corrupt_entry_leaves_cursor_and_canvas() {
        let mut history = HistoryEngine::new(Box::new(MemoryHistoryStore::new()));
        let mut canvas = canvas();
        history.push(HistoryItem::user_edit("data:image/png;base64,AAAA".to_string()));
        edit(&mut history, &mut canvas, 3);

        let result = history.undo(&mut canvas);
        assert!(matches!(result, Err(EngineError::Decode { .. })));
        assert_eq!(history.log().cursor(), Some(1));
        assert_eq!(canvas.snapshot().pixel(0, 3), Some(RED));
    }

    #[test]
    fn test_delete_adjusts_cursor_without_touching_canvas() {
        let mut history = HistoryEngine::new(Box::new(MemoryHistoryStore::new()));
        let mut canvas = canvas();
        let first = edit(&mut history, &mut canvas, 0);
        edit(&mut history, &mut canvas, 1);
        let before = canvas.snapshot().clone();

        history.delete_item(&first).expect("delete");
        assert_eq!(history.log().cursor(), Some(0));
        assert_eq!(canvas.snapshot(), &before);

        assert!(history.delete_item("missing").is_err());
        assert_eq!(history.log().cursor(), Some(0));
    }

    #[test]
    fn test_store_failures_do_not_roll_back() {
        let mut history = HistoryEngine::new(Box::new(BrokenStore));
        let mut canvas = canvas();
        let id = edit(&mut history, &mut canvas, 0);
        assert_eq!(history.log().len(), 1);
        history.delete_item(&id).expect("delete");
        assert!(history.log().is_empty());
        history.clear();
        assert!(history.hydrate().is_err());
    }

    #[test]
    fn test_hydrate_and_restore_current() {
        let store = MemoryHistoryStore::new();
        {
            let mut history = HistoryEngine::new(Box::new(store.clone()));
            let mut canvas = canvas();
            edit(&mut history, &mut canvas, 0);
            edit(&mut history, &mut canvas, 4);
        }

        let mut history = HistoryEngine::new(Box::new(store));
        let mut canvas = canvas();
        assert_eq!(history.hydrate().expect("hydrate"), 2);
        assert_eq!(history.log().cursor(), Some(1));
        assert!(history.restore_current(&mut canvas).expect("restore"));
        assert_eq!(canvas.snapshot().pixel(0, 4), Some(RED));
    }

    #[test]
    fn test_clear_empties_store() {
        let store = MemoryHistoryStore::new();
        let mut history = HistoryEngine::new(Box::new(store.clone()));
        let mut canvas = canvas();
        edit(&mut history, &mut canvas, 0);
        history.clear();
        assert!(history.log().is_empty());
        assert!(store.is_empty());
        assert!(!history.reset(&mut canvas).expect("reset"));
    }
}
