//! Unified error handling for panel clients.

use reseller_panel_core::{KeyImportError, UserProfile};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::storage::StorageError;

/// Application-level error type for panel tooling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Panel API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Login or session handling failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Shared storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Key file could not be parsed.
    #[error("Key import error: {0}")]
    KeyImport(#[from] KeyImportError),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The admin guard refused access.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Bad command-line input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the error points at a fault worth reporting, as opposed to
    /// user error or a denied session.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(e) => !matches!(e, ApiError::Unauthorized | ApiError::Forbidden(_)),
            Self::Storage(_) | Self::Io(_) => true,
            Self::Auth(AuthError::Api(_) | AuthError::Storage(_)) => true,
            _ => false,
        }
    }

    /// Log the error, sending reportable ones to Sentry.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command failed"
            );
        } else {
            tracing::error!(error = %self, "Command failed");
        }
    }
}

/// Set the Sentry user context from a panel profile.
pub fn set_sentry_user(user: &UserProfile) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            username: Some(user.username.clone()),
            email: Some(user.email.as_str().to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
