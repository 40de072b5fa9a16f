//! JSON-file-backed storage.
//!
//! Used by the CLI so a login survives between invocations. Change events
//! are only delivered inside the current process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;

use super::{SharedStorage, StorageError, StorageEvent, StorageEvents};

/// Storage persisted as a flat JSON object.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
    events: StorageEvents,
}

impl FileStorage {
    /// Open storage at `path`, loading existing entries.
    ///
    /// A missing file is treated as empty storage and created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            path = %path.display(),
            entries = entries.len(),
            "Opened session storage file"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            events: StorageEvents::new(),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the map to a sibling temp file, then rename over the original.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a mutation under the lock, persist it, and return the event to
    /// broadcast once the lock is released.
    fn mutate<F>(&self, change: F) -> Result<Option<StorageEvent>, StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> Option<StorageEvent>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = entries.clone();
        let event = change(&mut updated);
        if event.is_some() {
            self.flush(&updated)?;
            *entries = updated;
        }
        Ok(event)
    }
}

impl SharedStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let event = self.mutate(|entries| {
            let old_value = entries.insert(key.to_string(), value.to_string());
            Some(StorageEvent {
                key: Some(key.to_string()),
                old_value,
                new_value: Some(value.to_string()),
            })
        })?;
        if let Some(event) = event {
            self.events.emit(event);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let event = self.mutate(|entries| {
            entries.remove(key).map(|old_value| StorageEvent {
                key: Some(key.to_string()),
                old_value: Some(old_value),
                new_value: None,
            })
        })?;
        if let Some(event) = event {
            self.events.emit(event);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let event = self.mutate(|entries| {
            entries.clear();
            Some(StorageEvent {
                key: None,
                old_value: None,
                new_value: None,
            })
        })?;
        if let Some(event) = event {
            self.events.emit(event);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::storage::keys;

    fn session_path() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        (dir, path)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, path) = session_path();
        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get(keys::TOKEN).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let (_dir, path) = session_path();
        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set(keys::TOKEN, "abc").unwrap();
            storage.set(keys::USER, "{}").unwrap();
            storage.remove(keys::USER).unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).as_deref(), Some("abc"));
        assert!(reopened.get(keys::USER).is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, path) = session_path();
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStorage::open(&path),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_remove_missing_key_emits_nothing() {
        let (_dir, path) = session_path();
        let storage = FileStorage::open(&path).unwrap();
        let mut events = storage.subscribe();
        storage.remove(keys::TOKEN).unwrap();
        assert!(events.try_recv().is_err());
        assert!(!path.exists());
    }
}
