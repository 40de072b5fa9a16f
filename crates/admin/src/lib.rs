//! Reseller Panel Admin library.
//!
//! Client-side building blocks for the reseller dashboard:
//!
//! - [`storage`] - Shared, change-notifying key/value storage (the session
//!   record lives here, and its change events double as the cross-tab
//!   logout signal)
//! - [`api`] - Panel REST API client
//! - [`session`] - Session store: login, logout, hydration, ready signal
//! - [`guard`] - Admin guard: decides whether admin-only views may render
//! - [`navigation`] - Page navigation side effects
//! - [`export`] - Transaction CSV export
//!
//! # Wiring
//!
//! Nothing here is a global. Build the pieces explicitly and pass them to
//! whatever needs them:
//!
//! ```rust,ignore
//! let config = PanelConfig::from_env()?;
//! let storage: Arc<dyn SharedStorage> = Arc::new(MemoryStorage::new());
//! let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);
//! let api = Arc::new(HttpPanelApi::new(&config)?);
//!
//! let store = Arc::new(SessionStore::new(api.clone(), storage, navigator.clone(), &config));
//! let guard = Arc::new(AdminGuard::new(store.clone(), api, navigator, &config));
//! let _watcher = guard.spawn_watcher();
//!
//! store.initialize().await;
//! if guard.decided().await == GuardState::Authorized {
//!     // render the dashboard
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod guard;
pub mod navigation;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;

pub use api::{ApiError, Credentials, HttpPanelApi, ImportSummary, LoginResponse, PanelApi};
pub use config::{ConfigError, PanelConfig};
pub use error::AppError;
pub use guard::{AdminGuard, GuardError, GuardState, VerificationPolicy};
pub use navigation::{LogNavigator, Navigator, RecordingNavigator};
pub use session::{AuthError, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, StorageError, StorageEvent};
