//! CLI command implementations.

pub mod guard;
pub mod keys;
pub mod session;
pub mod transactions;

use std::sync::Arc;

use reseller_panel_admin::{
    AdminGuard, AppError, FileStorage, GuardState, HttpPanelApi, LogNavigator, Navigator,
    PanelConfig, SessionStore, SharedStorage,
};
use reseller_panel_core::SessionToken;

/// Everything a command needs, wired from configuration.
///
/// The session lives in the file at `RP_SESSION_FILE`, so a login carries
/// over to later invocations.
pub struct Panel {
    pub config: PanelConfig,
    pub api: Arc<HttpPanelApi>,
    pub navigator: Arc<dyn Navigator>,
    pub store: Arc<SessionStore<HttpPanelApi>>,
}

impl Panel {
    /// Build the API client, file storage and session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file is unreadable or the HTTP
    /// client cannot be built.
    pub fn open(config: PanelConfig) -> Result<Self, AppError> {
        let storage: Arc<dyn SharedStorage> = Arc::new(FileStorage::open(&config.session_file)?);
        let api = Arc::new(HttpPanelApi::new(&config)?);
        let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);
        let store = Arc::new(SessionStore::new(
            Arc::clone(&api),
            storage,
            Arc::clone(&navigator),
            &config,
        ));

        Ok(Self {
            config,
            api,
            navigator,
            store,
        })
    }

    /// A fresh guard over this panel's session.
    #[must_use]
    pub fn guard(&self) -> AdminGuard<HttpPanelApi> {
        AdminGuard::new(
            Arc::clone(&self.store),
            Arc::clone(&self.api),
            Arc::clone(&self.navigator),
            &self.config,
        )
    }

    /// Hydrate the session and run the admin guard to a decision.
    ///
    /// Returns the token of the authorized session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AccessDenied` unless the guard authorizes.
    pub async fn require_admin(&self) -> Result<SessionToken, AppError> {
        self.store.initialize().await;
        let guard = self.guard();

        match guard.check().await {
            GuardState::Authorized => self
                .store
                .token()
                .ok_or_else(|| AppError::AccessDenied("session ended".to_string())),
            state => Err(AppError::AccessDenied(
                guard
                    .denial()
                    .map_or_else(|| state.to_string(), |reason| reason.to_string()),
            )),
        }
    }
}
