//! In-process shared storage.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{SharedStorage, StorageError, StorageEvent, StorageEvents};

/// Storage held in memory and shared through an `Arc`.
///
/// Several session stores and guards pointing at the same `MemoryStorage`
/// behave like several tabs of the same origin.
#[derive(Debug)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    events: StorageEvents,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            events: StorageEvents::new(),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        self.events.emit(StorageEvent {
            key: Some(key.to_string()),
            old_value,
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        if old_value.is_some() {
            self.events.emit(StorageEvent {
                key: Some(key.to_string()),
                old_value,
                new_value: None,
            });
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        self.events.emit(StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
