//! Session store.
//!
//! Owns the in-memory [`Session`] and its persisted copy in
//! [`SharedStorage`]. The record is written user-first, token-last, and
//! removed token-first, so a present token always means a complete record.
//!
//! The store fires its ready signal once, after the first hydration (or the
//! first login, whichever comes first). Late subscribers see it as fired.

mod error;

pub use error::AuthError;

use std::sync::{Arc, PoisonError, RwLock};

use reseller_panel_core::{Session, SessionToken, UserProfile};
use secrecy::ExposeSecret;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, Credentials, PanelApi};
use crate::config::PanelConfig;
use crate::navigation::Navigator;
use crate::storage::{SharedStorage, StorageError, keys};

/// Client-side session state backed by shared storage.
pub struct SessionStore<A> {
    api: Arc<A>,
    storage: Arc<dyn SharedStorage>,
    navigator: Arc<dyn Navigator>,
    login_url: String,
    verify_on_startup: bool,
    session: RwLock<Session>,
    ready: watch::Sender<bool>,
}

impl<A> std::fmt::Debug for SessionStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("login_url", &self.login_url)
            .field("verify_on_startup", &self.verify_on_startup)
            .field("session", &self.session())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl<A: PanelApi> SessionStore<A> {
    /// Create an anonymous, not-yet-ready store.
    #[must_use]
    pub fn new(
        api: Arc<A>,
        storage: Arc<dyn SharedStorage>,
        navigator: Arc<dyn Navigator>,
        config: &PanelConfig,
    ) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            api,
            storage,
            navigator,
            login_url: config.login_url.clone(),
            verify_on_startup: config.verify_on_startup,
            session: RwLock::new(Session::anonymous()),
            ready,
        }
    }

    /// Hydrate the session from shared storage, then fire the ready signal.
    ///
    /// A corrupt record is cleared. With `verify_on_startup`, the hydrated
    /// token is checked against the profile endpoint: a 401 clears the
    /// session, a fresh profile replaces the cached one, and any other
    /// failure keeps the cached profile. Calling this again once ready is a
    /// no-op.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        if self.is_ready() {
            debug!("Session store already initialized");
            return;
        }

        match self.persisted_session() {
            Ok(session) => {
                let token = session.token().cloned();
                self.set_session(session);
                if let Some(token) = token.filter(|_| self.verify_on_startup) {
                    self.revalidate(&token).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Clearing unreadable session record");
                self.clear();
            }
        }

        info!(authenticated = self.is_authenticated(), "Session store ready");
        self.mark_ready();
    }

    async fn revalidate(&self, token: &SessionToken) {
        let result = self.api.fetch_profile(token).await;

        // Another tab may have logged out or in while we were waiting.
        if !self.holds_token(token) {
            debug!("Session changed during startup check; discarding result");
            return;
        }

        match result {
            Ok(profile) => {
                if let Err(e) = self.refresh_user(profile) {
                    warn!(error = %e, "Failed to persist refreshed profile");
                }
            }
            Err(ApiError::Unauthorized) => self.handle_unauthorized(),
            Err(e) => warn!(error = %e, "Startup session check failed; keeping cached profile"),
        }
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the API rejects the
    /// credentials, or another `AuthError` if the call or persistence fails.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, AuthError> {
        if credentials.username.trim().is_empty() || credentials.password.expose_secret().is_empty()
        {
            return Err(AuthError::MissingCredentials);
        }

        let response = self.api.login(credentials).await.map_err(|e| match e {
            ApiError::Unauthorized => {
                AuthError::InvalidCredentials("invalid username or password".to_string())
            }
            ApiError::Api(message) => AuthError::InvalidCredentials(message),
            other => AuthError::Api(other),
        })?;

        if response.token.is_blank() {
            return Err(ApiError::InvalidResponse("empty token".to_string()).into());
        }

        self.persist(&response.token, &response.user)?;
        self.set_session(Session::authenticated(
            response.token,
            response.user.clone(),
        ));
        self.mark_ready();

        info!(
            user_id = %response.user.id,
            role = %response.user.role,
            "Logged in"
        );
        Ok(response.user)
    }

    /// Clear the session and its persisted record, then go to the login view.
    pub fn logout(&self) {
        self.clear();
        info!("Logged out");
        self.navigator.redirect(&self.login_url);
    }

    /// React to a 401 from any call: drop the session without navigating.
    pub fn handle_unauthorized(&self) {
        warn!("Session token rejected; clearing session");
        self.clear();
    }

    /// Drop the in-memory session and remove the persisted record.
    pub fn clear(&self) {
        self.set_session(Session::anonymous());
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove session entry");
            }
        }
    }

    /// Drop the in-memory session if the persisted token is gone.
    pub fn sync_from_storage(&self) {
        if self.storage.get(keys::TOKEN).is_none() && self.is_authenticated() {
            debug!("Persisted token removed; dropping in-memory session");
            self.set_session(Session::anonymous());
        }
    }

    /// Replace the cached profile with a fresher copy and persist it.
    ///
    /// Ignored while anonymous.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be persisted.
    pub fn refresh_user(&self, user: UserProfile) -> Result<(), StorageError> {
        let json = {
            let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
            if !session.is_authenticated() {
                return Ok(());
            }
            let json = serde_json::to_string(&user)?;
            session.replace_user(user);
            json
        };
        self.storage.set(keys::USER, &json)
    }

    /// Load the persisted pair into an anonymous store without waiting for
    /// [`initialize`](Self::initialize).
    ///
    /// Ignored once a session is loaded or when storage holds no usable pair.
    pub fn adopt_persisted(&self) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.is_authenticated() {
            return;
        }
        match self.persisted_session() {
            Ok(persisted) if persisted.is_authenticated() => {
                debug!("Adopting persisted session before initialization");
                *session = persisted;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Cannot adopt persisted session"),
        }
    }

    /// Whether shared storage currently holds a token/profile pair.
    #[must_use]
    pub fn persisted_credentials_present(&self) -> bool {
        self.storage
            .get(keys::TOKEN)
            .is_some_and(|t| !t.trim().is_empty())
            && self.storage.get(keys::USER).is_some()
    }

    /// Read the session straight from shared storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StorageCorrupt` if a token is present but the
    /// profile does not parse.
    pub fn persisted_session(&self) -> Result<Session, AuthError> {
        let Some(token) = self
            .storage
            .get(keys::TOKEN)
            .map(SessionToken::new)
            .filter(|t| !t.is_blank())
        else {
            return Ok(Session::anonymous());
        };
        let Some(raw_user) = self.storage.get(keys::USER) else {
            return Ok(Session::anonymous());
        };
        let user: UserProfile = serde_json::from_str(&raw_user)
            .map_err(|e| AuthError::StorageCorrupt(e.to_string()))?;
        Ok(Session::authenticated(token, user))
    }

    fn persist(&self, token: &SessionToken, user: &UserProfile) -> Result<(), StorageError> {
        self.storage.set(keys::USER, &serde_json::to_string(user)?)?;
        self.storage.set(keys::TOKEN, token.expose())
    }

    fn holds_token(&self, token: &SessionToken) -> bool {
        self.storage.get(keys::TOKEN).as_deref() == Some(token.expose())
    }
}

impl<A> SessionStore<A> {
    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Whether a token and profile are loaded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated()
    }

    /// Whether the loaded profile is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_admin()
    }

    /// The cached profile, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user()
            .cloned()
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token()
            .cloned()
    }

    /// Whether the ready signal has fired.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Receiver for the ready signal. Already `true` if it has fired.
    #[must_use]
    pub fn ready_signal(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Wait until the ready signal has fired.
    pub async fn wait_ready(&self) {
        let mut ready = self.ready.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    fn mark_ready(&self) {
        let fired = self.ready.send_if_modified(|ready| {
            let first = !*ready;
            *ready = true;
            first
        });
        if fired {
            debug!("Ready signal fired");
        }
    }

    /// Shared storage backing this store.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn SharedStorage> {
        &self.storage
    }

    /// API client used by this store.
    #[must_use]
    pub const fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Where logout navigates.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}
