//! Key/value persistence adapter.
//!
//! Wraps local storage behind asynchronous string-keyed get/set operations.
//! The rest of the system treats the store as a full-snapshot cache: whole
//! values are written on mutation and only read back at startup.
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use log::{debug, error, trace};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::{PanelError, Result};

/// Storage key for the persisted note collection.
pub const NOTES_KEY: &str = "notes";

/// Storage key for the active note id pointer.
pub const ACTIVE_NOTE_KEY: &str = "active_note_id";

/// Asynchronous string-keyed JSON store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// File-backed store keeping one JSON document per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            debug!("Store directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create store directory: {}", e);
                PanelError::DirectoryError { path: dir.clone() }
            })?;
        }

        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            trace!("No stored value for key: {}", key);
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read stored key {}: {}", key, e);
            PanelError::Io(e)
        })?;

        let value = serde_json::from_str(&raw)?;
        Ok(Some(value))
    }

    /// Writes through a temporary file in the same directory so a crash
    /// mid-write never leaves a truncated value behind.
    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.key_path(key);
        debug!("Persisting key {} to {}", key, path.display());

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            PanelError::Io(e)
        })?;

        let json = serde_json::to_string_pretty(&value).map_err(|e| {
            error!("Failed to serialize value for key {}: {}", key, e);
            PanelError::Serialization(e)
        })?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            PanelError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            PanelError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            PanelError::Io(e.error)
        })?;

        trace!("Key {} persisted", key);
        Ok(())
    }
}

/// In-memory store used by tests and ephemeral sessions.
///
/// Tracks per-key write counts so tests can observe write coalescing.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
    writes: Mutex<HashMap<String, AtomicUsize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls seen for `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.writes
            .lock()
            .ok()
            .and_then(|writes| writes.get(key).map(|count| count.load(Ordering::SeqCst)))
            .unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PanelError::LockAcquisitionFailed {
                message: "Failed to acquire lock on memory store".to_string(),
            })?;

        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        {
            let mut entries =
                self.entries
                    .lock()
                    .map_err(|_| PanelError::LockAcquisitionFailed {
                        message: "Failed to acquire lock on memory store".to_string(),
                    })?;
            entries.insert(key.to_string(), value);
        }

        let mut writes = self
            .writes
            .lock()
            .map_err(|_| PanelError::LockAcquisitionFailed {
                message: "Failed to acquire lock on memory store".to_string(),
            })?;
        writes
            .entry(key.to_string())
            .or_default()
            .fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_store_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        assert!(store.get("missing").await.unwrap().is_none());

        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

        store.set("k", json!([1, 2])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn memory_store_counts_writes_per_key() {
        let store = MemoryStore::new();
        store.set("a", json!(1)).await.unwrap();
        store.set("a", json!(2)).await.unwrap();
        store.set("b", json!(3)).await.unwrap();

        assert_eq!(store.write_count("a"), 2);
        assert_eq!(store.write_count("b"), 1);
        assert_eq!(store.write_count("c"), 0);
        assert_eq!(store.get("a").await.unwrap(), Some(json!(2)));
    }
}
