//! Panel API errors.

use thiserror::Error;

/// Errors that can occur when calling the panel API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("Panel API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The token is missing, expired or revoked (HTTP 401).
    #[error("Session is not authenticated")]
    Unauthorized,

    /// The token is valid but the account lacks access (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success status.
    #[error("Panel API returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the body, if any.
        message: String,
    },

    /// The API answered with `success: false`.
    #[error("Panel API error: {0}")]
    Api(String),

    /// The body did not match the expected envelope.
    #[error("Invalid panel API response: {0}")]
    InvalidResponse(String),

    /// An endpoint URL could not be built.
    #[error("Invalid panel API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether this error means the session itself is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
