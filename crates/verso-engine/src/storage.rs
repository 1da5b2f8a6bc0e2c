//! Persistent key/value storage for trial state and the transcript.
//!
//! The store is a flat string-to-string map, the same shape a browser's
//! origin-scoped local storage has. [`FileStore`] keeps it as a single JSON
//! object on disk with atomic writes; [`MemoryStore`] backs tests.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::warn;

/// Key holding the client-settable subscription flag.
pub const SUBSCRIPTION_KEY: &str = "suscripcionActiva";

/// Key holding the trial start time in epoch milliseconds.
pub const TRIAL_START_KEY: &str = "tiempoInicioPrueba";

/// Key holding the serialized transcript.
pub const TRANSCRIPT_KEY: &str = "chatHistorial";

/// File name used by [`FileStore::in_dir`].
pub const STORE_FILE_NAME: &str = "storage.json";

/// Appended to the backing file's name when it is moved aside.
const CORRUPT_SUFFIX: &str = ".corrupt";

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string-keyed, string-valued store that survives restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed store holding every key in one JSON object.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the given file.
    /// The file is created lazily on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store at `<dir>/storage.json`, creating `dir` if needed.
    pub fn in_dir(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        Ok(Self::new(dir.join(STORE_FILE_NAME)))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path a corrupted backing file is moved to.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(CORRUPT_SUFFIX);
        PathBuf::from(name)
    }

    /// Read the whole map. A file that is not a JSON object of strings is
    /// moved aside and the store starts over empty.
    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                let aside = self.corrupt_path();
                warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "Discarding corrupted store"
                );
                fs::rename(&self.path, &aside)?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(map)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given pairs.
    pub fn with_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Write content atomically using temp file + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let pid = std::process::id();

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("store");
    let tmp_path = path.with_file_name(format!("{file_name}.{timestamp}.{pid}.tmp"));

    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        // Best-effort cleanup
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp.path()).unwrap();
        assert_eq!(store.get(TRIAL_START_KEY).unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_set_and_get() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp.path()).unwrap();

        store.set(TRIAL_START_KEY, "1700000000000").unwrap();
        store.set(SUBSCRIPTION_KEY, "true").unwrap();

        assert_eq!(
            store.get(TRIAL_START_KEY).unwrap().as_deref(),
            Some("1700000000000")
        );
        assert_eq!(store.get(SUBSCRIPTION_KEY).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileStore::in_dir(temp.path()).unwrap();
            store.set(TRANSCRIPT_KEY, "[]").unwrap();
        }
        let reopened = FileStore::in_dir(temp.path()).unwrap();
        assert_eq!(reopened.get(TRANSCRIPT_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_remove() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp.path()).unwrap();
        store.set(SUBSCRIPTION_KEY, "true").unwrap();
        store.remove(SUBSCRIPTION_KEY).unwrap();
        store.remove("never-set").unwrap();
        assert_eq!(store.get(SUBSCRIPTION_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_is_moved_aside() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp.path()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert_eq!(store.get(TRIAL_START_KEY).unwrap(), None);
        assert!(!store.path().exists());
        assert_eq!(fs::read_to_string(store.corrupt_path()).unwrap(), "not json");

        store.set(TRIAL_START_KEY, "1").unwrap();
        assert_eq!(store.get(TRIAL_START_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp.path()).unwrap();
        store.set(TRIAL_START_KEY, "1").unwrap();
        store.set(TRIAL_START_KEY, "2").unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_memory_store_with_values() {
        let store = MemoryStore::with_values([(SUBSCRIPTION_KEY, "true")]);
        assert_eq!(store.get(SUBSCRIPTION_KEY).unwrap().as_deref(), Some("true"));
        store.remove(SUBSCRIPTION_KEY).unwrap();
        assert_eq!(store.get(SUBSCRIPTION_KEY).unwrap(), None);
    }
}
