//! Panel REST API.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "optional" }
//! ```
//!
//! [`PanelApi`] is the seam the session store and admin guard depend on;
//! [`HttpPanelApi`] is the reqwest implementation.

mod client;
mod error;

pub use client::HttpPanelApi;
pub use error::ApiError;

use std::future::Future;

use reseller_panel_core::{KeyBatch, SessionToken, Transaction, UserProfile};
use secrecy::SecretString;
use serde::Deserialize;

/// Login form input.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent calls.
    pub token: SessionToken,
    /// Profile of the logged-in account.
    pub user: UserProfile,
}

/// Result of a key import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ImportSummary {
    /// Keys added to inventory.
    pub imported: usize,
    /// Keys the server already had.
    #[serde(default)]
    pub duplicates: usize,
}

/// Operations the dashboard needs from the panel API.
pub trait PanelApi: Send + Sync {
    /// Exchange credentials for a token and profile.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// Fetch the profile the token belongs to.
    fn fetch_profile(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<UserProfile, ApiError>> + Send;

    /// Fetch the profile through the role-gated admin endpoint.
    fn verify_admin(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<UserProfile, ApiError>> + Send;

    /// List all credit transactions (admin only).
    fn list_transactions(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Vec<Transaction>, ApiError>> + Send;

    /// Add license keys to a product's inventory (admin only).
    fn import_keys(
        &self,
        token: &SessionToken,
        product: &str,
        batch: &KeyBatch,
    ) -> impl Future<Output = Result<ImportSummary, ApiError>> + Send;
}
