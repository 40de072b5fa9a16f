//! Reasons the admin guard denies access.

use thiserror::Error;

/// Why the guard moved to [`GuardState::Denied`](super::GuardState::Denied).
///
/// Never propagated to callers; recorded for logs and [`AdminGuard::denial`](super::AdminGuard::denial).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// No token/profile pair, or the token was rejected or removed.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The profile is not an admin, or the server disagreed with the cache.
    #[error("Not authorized: admin role required")]
    NotAuthorized,

    /// Remote re-validation errored or timed out.
    #[error("Admin verification failed: {0}")]
    VerificationFailed(String),

    /// The persisted profile could not be parsed.
    #[error("Stored session is corrupt: {0}")]
    StorageCorrupt(String),
}
