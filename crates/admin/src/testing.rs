//! Test doubles shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reseller_panel_core::{
    Email, KeyBatch, Role, SessionToken, Transaction, UserId, UserProfile,
};
use rust_decimal::Decimal;
use tokio::sync::Notify;
use url::Url;

use crate::api::{ApiError, Credentials, ImportSummary, LoginResponse, PanelApi};
use crate::config::PanelConfig;
use crate::storage::{SharedStorage, keys};

/// Canned answer for a stubbed endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    User(UserProfile),
    /// Answer with the profile once `StubApi::release` is called.
    Gated(UserProfile),
    Unauthorized,
    Forbidden,
    Fail,
    Hang,
}

/// In-process `PanelApi` with call counters.
#[derive(Debug)]
pub struct StubApi {
    login: Mutex<Reply>,
    profile: Mutex<Reply>,
    verify: Mutex<Reply>,
    gate: Notify,
    pub login_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
}

impl Default for StubApi {
    fn default() -> Self {
        let admin = profile("u1", Role::Admin);
        Self {
            login: Mutex::new(Reply::User(admin.clone())),
            profile: Mutex::new(Reply::User(admin.clone())),
            verify: Mutex::new(Reply::User(admin)),
            gate: Notify::new(),
            login_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }
}

impl StubApi {
    pub fn with_login(reply: Reply) -> Self {
        let stub = Self::default();
        *stub.login.lock().unwrap() = reply;
        stub
    }

    pub fn with_profile(reply: Reply) -> Self {
        let stub = Self::default();
        *stub.profile.lock().unwrap() = reply;
        stub
    }

    pub fn with_verify(reply: Reply) -> Self {
        let stub = Self::default();
        *stub.verify.lock().unwrap() = reply;
        stub
    }

    /// Let one gated call answer.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    async fn answer(&self, reply: &Mutex<Reply>) -> Result<UserProfile, ApiError> {
        let reply = reply.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match reply {
            Reply::User(user) => Ok(user),
            Reply::Gated(user) => {
                self.gate.notified().await;
                Ok(user)
            }
            Reply::Unauthorized => Err(ApiError::Unauthorized),
            Reply::Forbidden => Err(ApiError::Forbidden("admin only".to_string())),
            Reply::Fail => Err(ApiError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

impl PanelApi for StubApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let user = self.answer(&self.login).await.map_err(|e| match e {
            ApiError::Unauthorized => ApiError::Api("Invalid credentials".to_string()),
            other => other,
        })?;
        Ok(LoginResponse {
            token: SessionToken::new(format!("tok-{}", credentials.username)),
            user,
        })
    }

    async fn fetch_profile(&self, _token: &SessionToken) -> Result<UserProfile, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.profile).await
    }

    async fn verify_admin(&self, _token: &SessionToken) -> Result<UserProfile, ApiError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.verify).await
    }

    async fn list_transactions(&self, _token: &SessionToken) -> Result<Vec<Transaction>, ApiError> {
        Ok(Vec::new())
    }

    async fn import_keys(
        &self,
        _token: &SessionToken,
        _product: &str,
        batch: &KeyBatch,
    ) -> Result<ImportSummary, ApiError> {
        Ok(ImportSummary {
            imported: batch.len(),
            duplicates: 0,
        })
    }
}

pub fn profile(id: &str, role: Role) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        username: format!("user-{id}"),
        email: Email::parse(&format!("{id}@example.com")).unwrap(),
        role,
        credits: Decimal::ZERO,
        created_at: None,
    }
}

/// Write a complete session record the way a login would.
pub fn seed(storage: &dyn SharedStorage, token: &str, user: &UserProfile) {
    storage
        .set(keys::USER, &serde_json::to_string(user).unwrap())
        .unwrap();
    storage.set(keys::TOKEN, token).unwrap();
}

pub fn test_config() -> PanelConfig {
    let mut config = PanelConfig::new(Url::parse("http://panel.test/api/").unwrap());
    config.request_timeout = Duration::from_millis(200);
    config.verify_on_startup = false;
    config
}
