//! Shared key/value storage with change notifications.
//!
//! The session record is persisted here as two entries ([`keys::TOKEN`] and
//! [`keys::USER`]). Every mutation is broadcast as a [`StorageEvent`] to all
//! subscribers, which is how another page sharing the same storage learns
//! that the user logged out.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Default change-notification buffer per subscriber.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Keys of the persisted session record.
pub mod keys {
    /// Bearer token. Its removal is the cross-tab logout signal.
    pub const TOKEN: &str = "token";

    /// Serialized [`UserProfile`](reseller_panel_core::UserProfile) JSON.
    pub const USER: &str = "user";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid record.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A change to shared storage.
///
/// `key` is `None` when the whole storage was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed, or `None` for a clear.
    pub key: Option<String>,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change (`None` = removed).
    pub new_value: Option<String>,
}

impl StorageEvent {
    /// Whether this event removed the session token.
    #[must_use]
    pub fn removes_token(&self) -> bool {
        match self.key.as_deref() {
            None => true,
            Some(key) => key == keys::TOKEN && self.new_value.is_none(),
        }
    }
}

/// Synchronous key/value storage shared between pages.
///
/// Mirrors the browser's `localStorage`: reads and writes are immediate,
/// and every mutation is delivered to every subscriber at least once.
pub trait SharedStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the change.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error and emits
    /// no event.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the change.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Delete everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the change.
    fn clear(&self) -> Result<(), StorageError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Broadcast fan-out shared by the storage backends.
#[derive(Debug)]
pub(crate) struct StorageEvents {
    sender: broadcast::Sender<StorageEvent>,
}

impl StorageEvents {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self { sender }
    }

    pub(crate) fn emit(&self, event: StorageEvent) {
        match self.sender.send(event) {
            Ok(count) => debug!(subscribers = count, "Storage change broadcast"),
            Err(_) => debug!("Storage change with no subscribers"),
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_token_on_token_delete() {
        let event = StorageEvent {
            key: Some(keys::TOKEN.to_string()),
            old_value: Some("abc".to_string()),
            new_value: None,
        };
        assert!(event.removes_token());
    }

    #[test]
    fn test_removes_token_on_clear() {
        let event = StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
        };
        assert!(event.removes_token());
    }

    #[test]
    fn test_other_changes_do_not_remove_token() {
        let replaced = StorageEvent {
            key: Some(keys::TOKEN.to_string()),
            old_value: Some("old".to_string()),
            new_value: Some("new".to_string()),
        };
        assert!(!replaced.removes_token());

        let user_removed = StorageEvent {
            key: Some(keys::USER.to_string()),
            old_value: Some("{}".to_string()),
            new_value: None,
        };
        assert!(!user_removed.removes_token());
    }
}
