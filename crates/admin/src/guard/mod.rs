//! Admin guard.
//!
//! Decides whether admin-only views may render:
//!
//! ```text
//! Uninitialized ──ready / stored pair──▶ Verifying ──▶ Authorized
//!                                            │
//!       any state ──token removed──▶ Denied ◀┘
//! ```
//!
//! `Authorized` and `Denied` are terminal. Entering `Denied` clears the
//! session and redirects to the login view exactly once. Every denial reason
//! is folded into the state; nothing is returned as an error.

mod error;

pub use error::GuardError;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reseller_panel_core::UserProfile;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, PanelApi};
use crate::config::PanelConfig;
use crate::navigation::Navigator;
use crate::session::{AuthError, SessionStore};
use crate::storage::StorageEvent;

/// Guard decision state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GuardState {
    /// Waiting for the session store.
    #[default]
    Uninitialized,
    /// Checking the session (possibly remotely).
    Verifying,
    /// Admin access granted.
    Authorized,
    /// Access refused; the user was sent to the login view.
    Denied,
}

impl GuardState {
    /// Whether no further `check` can change this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Authorized | Self::Denied)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Verifying => "verifying",
            Self::Authorized => "authorized",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the guard confirms a cached admin role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationPolicy {
    /// Accept the cached profile's role as-is.
    TrustCachedRole,
    /// Confirm the role with the admin-verify endpoint on every check.
    #[default]
    AlwaysRevalidate,
}

impl VerificationPolicy {
    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TrustCachedRole => "trust_cached_role",
            Self::AlwaysRevalidate => "always_revalidate",
        }
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust_cached_role" => Ok(Self::TrustCachedRole),
            "always_revalidate" => Ok(Self::AlwaysRevalidate),
            other => Err(format!(
                "unknown verification policy '{other}' (expected always_revalidate or trust_cached_role)"
            )),
        }
    }
}

/// Gate for admin-only views.
pub struct AdminGuard<A> {
    store: Arc<SessionStore<A>>,
    api: Arc<A>,
    navigator: Arc<dyn Navigator>,
    login_url: String,
    policy: VerificationPolicy,
    timeout: Duration,
    state: watch::Sender<GuardState>,
    denial: Mutex<Option<GuardError>>,
}

impl<A> fmt::Debug for AdminGuard<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGuard")
            .field("state", &*self.state.borrow())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<A: PanelApi> AdminGuard<A> {
    /// Create a guard in the `Uninitialized` state.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore<A>>,
        api: Arc<A>,
        navigator: Arc<dyn Navigator>,
        config: &PanelConfig,
    ) -> Self {
        let (state, _) = watch::channel(GuardState::Uninitialized);
        Self {
            store,
            api,
            navigator,
            login_url: config.login_url.clone(),
            policy: config.verification_policy,
            timeout: config.request_timeout,
            state,
            denial: Mutex::new(None),
        }
    }

    /// Run the check and return the resulting state.
    ///
    /// Terminal states are returned unchanged. A check while another is
    /// `Verifying` returns `Verifying` without a second request. Before the
    /// store is ready, and with nothing persisted, stays `Uninitialized`.
    #[instrument(skip(self), fields(policy = %self.policy))]
    pub async fn check(&self) -> GuardState {
        if self.state() != GuardState::Uninitialized {
            return self.state();
        }
        if !self.store.is_ready() && !self.store.persisted_credentials_present() {
            debug!("Session store not ready; deferring admin check");
            return GuardState::Uninitialized;
        }
        if !self.transition(GuardState::Uninitialized, GuardState::Verifying) {
            return self.state();
        }

        match self.evaluate().await {
            Ok(fresh) => {
                if self.transition(GuardState::Verifying, GuardState::Authorized) {
                    info!("Admin access granted");
                    self.store.adopt_persisted();
                    if let Some(profile) = fresh {
                        if let Err(e) = self.store.refresh_user(profile) {
                            warn!(error = %e, "Failed to persist verified profile");
                        }
                    }
                } else {
                    debug!(state = %self.state(), "Discarding stale admin verification");
                }
            }
            Err(reason) => {
                self.deny(reason, true);
            }
        }

        self.state()
    }

    /// Decide for the current session. Returns the verified profile when
    /// the server was asked.
    async fn evaluate(&self) -> Result<Option<UserProfile>, GuardError> {
        let session = if self.store.is_ready() {
            self.store.session()
        } else {
            self.store.persisted_session().map_err(|e| match e {
                AuthError::StorageCorrupt(message) => GuardError::StorageCorrupt(message),
                other => GuardError::StorageCorrupt(other.to_string()),
            })?
        };

        let (Some(token), Some(cached)) = (session.token(), session.user()) else {
            return Err(GuardError::NotAuthenticated);
        };
        if !cached.is_admin() {
            return Err(GuardError::NotAuthorized);
        }
        if self.policy == VerificationPolicy::TrustCachedRole {
            return Ok(None);
        }

        match tokio::time::timeout(self.timeout, self.api.verify_admin(token)).await {
            Err(_) => Err(GuardError::VerificationFailed(format!(
                "no answer within {:?}",
                self.timeout
            ))),
            Ok(Ok(profile)) if profile.is_admin() && profile.id == cached.id => Ok(Some(profile)),
            Ok(Ok(profile)) => {
                warn!(
                    cached_id = %cached.id,
                    verified_id = %profile.id,
                    verified_role = %profile.role,
                    "Server disagrees with cached admin profile"
                );
                Err(GuardError::NotAuthorized)
            }
            Ok(Err(ApiError::Forbidden(_))) => Err(GuardError::NotAuthorized),
            Ok(Err(ApiError::Unauthorized)) => Err(GuardError::NotAuthenticated),
            Ok(Err(e)) => Err(GuardError::VerificationFailed(e.to_string())),
        }
    }

    /// React to a shared-storage change. Removal of the token denies from
    /// any state.
    pub fn handle_storage_event(&self, event: &StorageEvent) {
        if !event.removes_token() {
            return;
        }
        self.store.sync_from_storage();
        if self.deny(GuardError::NotAuthenticated, false) {
            info!("Session ended elsewhere");
        }
    }

    /// Move to `Denied`, clear the session and redirect, once.
    ///
    /// With `only_from_verifying`, a guard that has already left
    /// `Verifying` is left alone. Returns whether the transition happened.
    fn deny(&self, reason: GuardError, only_from_verifying: bool) -> bool {
        let denied = self.state.send_if_modified(|state| {
            let allowed = if only_from_verifying {
                *state == GuardState::Verifying
            } else {
                *state != GuardState::Denied
            };
            if allowed {
                *state = GuardState::Denied;
                *self.denial.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.clone());
            }
            allowed
        });
        if !denied {
            debug!(reason = %reason, state = %self.state(), "Ignoring denial");
            return false;
        }

        warn!(reason = %reason, "Admin access denied");
        self.store.clear();
        self.navigator.redirect(&self.login_url);
        true
    }

    /// Spawn the background task that drives the guard.
    ///
    /// Runs an eager check immediately, another when the store becomes
    /// ready, and applies every shared-storage change. Stops once the guard
    /// is `Denied`; abort the handle to stop it earlier.
    pub fn spawn_watcher(self: &Arc<Self>) -> JoinHandle<()>
    where
        A: 'static,
    {
        let guard = Arc::clone(self);
        let mut events = self.store.storage().subscribe();
        let mut ready = self.store.ready_signal();

        tokio::spawn(async move {
            guard.spawn_check();
            let mut ready_open = true;

            while guard.state() != GuardState::Denied {
                tokio::select! {
                    changed = ready.changed(), if ready_open => {
                        if changed.is_err() {
                            ready_open = false;
                        } else if *ready.borrow_and_update() {
                            guard.spawn_check();
                        }
                    }
                    event = events.recv() => match event {
                        Ok(event) => guard.handle_storage_event(&event),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Storage notifications lagged");
                            if !guard.store.persisted_credentials_present() {
                                guard.store.sync_from_storage();
                                guard.deny(GuardError::NotAuthenticated, false);
                            }
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!(state = %guard.state(), "Admin guard watcher stopped");
        })
    }

    fn spawn_check(self: &Arc<Self>)
    where
        A: 'static,
    {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            guard.check().await;
        });
    }
}

impl<A> AdminGuard<A> {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    /// Receiver for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Wait for a terminal state.
    pub async fn decided(&self) -> GuardState {
        let mut state = self.state.subscribe();
        match state.wait_for(|s| s.is_terminal()).await {
            Ok(decided) => *decided,
            Err(_) => self.state(),
        }
    }

    /// Why access was denied, if it was.
    #[must_use]
    pub fn denial(&self) -> Option<GuardError> {
        self.denial
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether admin access is granted.
    ///
    /// Follows the guard state alone; losing the session always moves the
    /// guard to `Denied`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state() == GuardState::Authorized
    }

    /// Same as [`is_admin`](Self::is_admin).
    #[must_use]
    pub fn can_manage_users(&self) -> bool {
        self.is_admin()
    }

    /// Same as [`is_admin`](Self::is_admin).
    #[must_use]
    pub fn can_view_stats(&self) -> bool {
        self.is_admin()
    }

    /// Same as [`is_admin`](Self::is_admin).
    #[must_use]
    pub fn can_manage_system(&self) -> bool {
        self.is_admin()
    }

    fn transition(&self, from: GuardState, to: GuardState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }
}
