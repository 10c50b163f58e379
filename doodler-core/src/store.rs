//! Persistent history storage.
//!
//! The in-memory [`HistoryLog`](crate::HistoryLog) is authoritative; stores
//! are a mirror that lets history survive restarts. Two implementations are
//! provided: [`MemoryHistoryStore`] for tests and embedding, and
//! [`FileHistoryStore`] which keeps one JSON document per item.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::HistoryItem;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    /// The store is not usable (e.g. no data directory).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Contract for a persistent history mirror.
pub trait HistoryStore: Send + Sync {
    /// Insert or overwrite an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be written.
    fn put(&self, item: &HistoryItem) -> Result<(), StoreError>;

    /// Fetch a single item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if no item has this id.
    fn get(&self, id: &str) -> Result<HistoryItem, StoreError>;

    /// All items, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get_all_ordered_by_timestamp(&self) -> Result<Vec<HistoryItem>, StoreError>;

    /// Remove an item. Removing a missing item is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Remove every item.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn clear_all(&self) -> Result<(), StoreError>;
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    items: Arc<RwLock<HashMap<String, HistoryItem>>>,
}

impl MemoryHistoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn put(&self, item: &HistoryItem) -> Result<(), StoreError> {
        self.items
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<HistoryItem, StoreError> {
        self.items
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ItemNotFound(id.to_string()))
    }

    fn get_all_ordered_by_timestamp(&self) -> Result<Vec<HistoryItem>, StoreError> {
        let mut items: Vec<HistoryItem> = self
            .items
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        items.sort_by_key(|item| item.timestamp);
        Ok(items)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.items
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(id);
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        self.items
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

/// Filesystem store: one pretty-printed JSON file per item.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    data_dir: PathBuf,
}

impl FileHistoryStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!("Opened history store at {}", data_dir.display());
        Ok(Self { data_dir })
    }

    /// Directory holding the item files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn item_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_filename(id)))
    }

    fn read_item(path: &Path) -> Result<HistoryItem, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn item_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl HistoryStore for FileHistoryStore {
    fn put(&self, item: &HistoryItem) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(item)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(self.item_path(&item.id), json)?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<HistoryItem, StoreError> {
        let path = self.item_path(id);
        if !path.exists() {
            return Err(StoreError::ItemNotFound(id.to_string()));
        }
        Self::read_item(&path)
    }

    fn get_all_ordered_by_timestamp(&self) -> Result<Vec<HistoryItem>, StoreError> {
        let mut items = Vec::new();
        for path in self.item_files()? {
            // One corrupt file should not hide the rest of the history.
            match Self::read_item(&path) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Skipping unreadable history file {}: {e}", path.display());
                }
            }
        }
        items.sort_by_key(|item| item.timestamp);
        Ok(items)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.item_path(id);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        for path in self.item_files()? {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Sanitize an item id for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get the current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HistoryKind;

    fn item(id: &str, timestamp: u64) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            timestamp,
            image_data: "data:image/png;base64,AAAA".to_string(),
            prompt: None,
            kind: HistoryKind::UserEdit,
        }
    }

    #[test]
    fn test_memory_put_and_get() {
        let store = MemoryHistoryStore::new();
        store.put(&item("a", 1)).expect("put");
        assert_eq!(store.get("a").expect("get").timestamp, 1);
        assert!(matches!(store.get("b"), Err(StoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_memory_ordered_by_timestamp() {
        let store = MemoryHistoryStore::new();
        store.put(&item("late", 30)).expect("put");
        store.put(&item("early", 10)).expect("put");
        store.put(&item("mid", 20)).expect("put");
        let ids: Vec<String> = store
            .get_all_ordered_by_timestamp()
            .expect("list")
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_memory_delete_and_clear() {
        let store = MemoryHistoryStore::new();
        store.put(&item("a", 1)).expect("put");
        store.put(&item("b", 2)).expect("put");
        store.delete("a").expect("delete");
        store.delete("missing").expect("delete missing");
        assert_eq!(store.len(), 1);
        store.clear_all().expect("clear");
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::open(dir.path()).expect("open");
        let mut original = item("abc-123", 42);
        original.prompt = Some("make it blue".to_string());
        original.kind = HistoryKind::AiGenerated;
        store.put(&original).expect("put");

        let reopened = FileHistoryStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.get("abc-123").expect("get"), original);
    }

    #[test]
    fn test_file_store_ordering_and_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::open(dir.path()).expect("open");
        store.put(&item("b", 2)).expect("put");
        store.put(&item("a", 1)).expect("put");
        store.put(&item("c", 3)).expect("put");
        store.delete("b").expect("delete");

        let items = store.get_all_ordered_by_timestamp().expect("list");
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_file_store_skips_corrupt_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::open(dir.path()).expect("open");
        store.put(&item("good", 1)).expect("put");
        std::fs::write(dir.path().join("bad.json"), "{ not json").expect("write");

        let items = store.get_all_ordered_by_timestamp().expect("list");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_file_store_clear_all() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::open(dir.path()).expect("open");
        store.put(&item("a", 1)).expect("put");
        store.put(&item("b", 2)).expect("put");
        std::fs::write(dir.path().join("notes.txt"), "keep").expect("write");
        store.clear_all().expect("clear");

        assert!(store.get_all_ordered_by_timestamp().expect("list").is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_file_store_get_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::open(dir.path()).expect("open");
        assert!(matches!(store.get("nope"), Err(StoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("abc-123_x"), "abc-123_x");
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // After 2020-01-01.
        assert!(current_timestamp_ms() > 1_577_836_800_000);
    }
}
