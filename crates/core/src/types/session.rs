//! Client session state.

use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Opaque bearer token issued by the panel API.
///
/// Implements `Debug` manually so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Expose the raw token (for the `Authorization` header or storage).
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// The client's current authentication state.
///
/// `authenticated` implies both a token and a profile are present; the
/// constructors are the only way to build a `Session`, so the invariant
/// cannot be broken from outside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<SessionToken>,
    user: Option<UserProfile>,
}

impl Session {
    /// An empty session (page load, after logout, after a 401).
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            token: None,
            user: None,
        }
    }

    /// A session backed by a token and the profile it resolved to.
    #[must_use]
    pub const fn authenticated(token: SessionToken, user: UserProfile) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    /// Whether the session holds both a token and a profile.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Authenticated with an admin profile.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(UserProfile::is_admin)
    }

    /// The bearer token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// The cached profile, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Replace the cached profile after a successful re-fetch.
    ///
    /// Has no effect on an anonymous session.
    pub fn replace_user(&mut self, user: UserProfile) {
        if self.token.is_some() {
            self.user = Some(user);
        }
    }
}
