//! Session errors.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors raised by [`SessionStore`](super::SessionStore) operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password was empty.
    #[error("Username and password are required")]
    MissingCredentials,

    /// The API rejected the credentials.
    #[error("Login failed: {0}")]
    InvalidCredentials(String),

    /// The persisted profile could not be read back.
    #[error("Stored session is corrupt: {0}")]
    StorageCorrupt(String),

    /// Any other API failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
