//! End-to-end tests for the session store and admin guard.
//!
//! Two "tabs" are modelled as two session stores sharing one
//! `MemoryStorage`, each with its own guard and navigator.

use std::sync::Arc;

use mockito::{Mock, Server, ServerGuard};
use reseller_panel_admin::{
    AdminGuard, Credentials, GuardError, GuardState, HttpPanelApi, MemoryStorage, Navigator,
    PanelConfig, RecordingNavigator, SessionStore, SharedStorage, VerificationPolicy,
};
use reseller_panel_integration_tests::{config_for, profile_json, success};
use serde_json::json;

struct Tab {
    navigator: Arc<RecordingNavigator>,
    store: Arc<SessionStore<HttpPanelApi>>,
    guard: Arc<AdminGuard<HttpPanelApi>>,
}

fn open_tab(storage: &Arc<MemoryStorage>, config: &PanelConfig) -> Tab {
    let api = Arc::new(HttpPanelApi::new(config).expect("client"));
    let navigator = Arc::new(RecordingNavigator::new());
    let store = Arc::new(SessionStore::new(
        Arc::clone(&api),
        Arc::clone(storage) as Arc<dyn SharedStorage>,
        navigator.clone() as Arc<dyn Navigator>,
        config,
    ));
    let guard = Arc::new(AdminGuard::new(
        Arc::clone(&store),
        api,
        navigator.clone() as Arc<dyn Navigator>,
        config,
    ));
    Tab {
        navigator,
        store,
        guard,
    }
}

async fn mock_login(server: &mut ServerGuard, role: &str) -> Mock {
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(success(&json!({
            "token": "tok",
            "user": profile_json("u1", role)
        })))
        .create_async()
        .await
}

async fn mock_verify(server: &mut ServerGuard, role: &str, hits: usize) -> Mock {
    server
        .mock("GET", "/api/admin/verify")
        .match_header("authorization", "Bearer tok")
        .expect(hits)
        .with_status(200)
        .with_body(success(&json!({ "user": profile_json("u1", role) })))
        .create_async()
        .await
}

// =============================================================================
// Guard decisions
// =============================================================================

#[tokio::test]
async fn test_admin_login_is_authorized() {
    let mut server = Server::new_async().await;
    mock_login(&mut server, "admin").await;
    let verify = mock_verify(&mut server, "admin", 1).await;

    let storage = Arc::new(MemoryStorage::new());
    let tab = open_tab(&storage, &config_for(&server.url()));

    tab.store
        .login(&Credentials::new("alice", "secret"))
        .await
        .expect("login");

    assert_eq!(tab.guard.check().await, GuardState::Authorized);
    assert_eq!(tab.guard.check().await, GuardState::Authorized);
    assert!(tab.guard.can_manage_users());
    assert_eq!(tab.navigator.redirect_count(), 0);
    verify.assert_async().await;
}

#[tokio::test]
async fn test_non_admin_is_denied_without_verification() {
    let mut server = Server::new_async().await;
    mock_login(&mut server, "user").await;
    let verify = mock_verify(&mut server, "admin", 0).await;

    let storage = Arc::new(MemoryStorage::new());
    let tab = open_tab(&storage, &config_for(&server.url()));
    tab.store
        .login(&Credentials::new("bob", "secret"))
        .await
        .expect("login");

    assert_eq!(tab.guard.check().await, GuardState::Denied);
    assert_eq!(tab.guard.denial(), Some(GuardError::NotAuthorized));
    assert_eq!(tab.navigator.visits(), vec!["login.html".to_string()]);
    assert!(storage.get("token").is_none());
    verify.assert_async().await;
}

#[tokio::test]
async fn test_verification_failure_fails_closed() {
    let mut server = Server::new_async().await;
    mock_login(&mut server, "admin").await;
    server
        .mock("GET", "/api/admin/verify")
        .with_status(500)
        .with_body("{}")
        .create_async()
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let tab = open_tab(&storage, &config_for(&server.url()));
    tab.store
        .login(&Credentials::new("alice", "secret"))
        .await
        .expect("login");

    assert_eq!(tab.guard.check().await, GuardState::Denied);
    assert!(matches!(
        tab.guard.denial(),
        Some(GuardError::VerificationFailed(_))
    ));
    assert_eq!(tab.navigator.redirect_count(), 1);
}

#[tokio::test]
async fn test_trust_cached_role_never_calls_verify() {
    let mut server = Server::new_async().await;
    mock_login(&mut server, "admin").await;
    let verify = mock_verify(&mut server, "admin", 0).await;

    let mut config = config_for(&server.url());
    config.verification_policy = VerificationPolicy::TrustCachedRole;
    let storage = Arc::new(MemoryStorage::new());
    let tab = open_tab(&storage, &config);
    tab.store
        .login(&Credentials::new("alice", "secret"))
        .await
        .expect("login");

    assert_eq!(tab.guard.check().await, GuardState::Authorized);
    verify.assert_async().await;
}

// =============================================================================
// Hydration and cross-tab logout
// =============================================================================

#[tokio::test]
async fn test_second_tab_hydrates_from_shared_storage() {
    let mut server = Server::new_async().await;
    mock_login(&mut server, "admin").await;
    mock_verify(&mut server, "admin", 1).await;

    let storage = Arc::new(MemoryStorage::new());
    let config = config_for(&server.url());
    let first = open_tab(&storage, &config);
    first
        .store
        .login(&Credentials::new("alice", "secret"))
        .await
        .expect("login");

    let second = open_tab(&storage, &config);
    let watcher = second.guard.spawn_watcher();
    second.store.initialize().await;

    assert_eq!(second.guard.decided().await, GuardState::Authorized);
    assert_eq!(
        second.store.current_user().map(|u| u.username),
        Some("user-u1".to_string())
    );
    watcher.abort();
}

#[tokio::test]
async fn test_logout_in_one_tab_denies_the_other() {
    let mut server = Server::new_async().await;
    mock_login(&mut server, "admin").await;
    mock_verify(&mut server, "admin", 1).await;

    let storage = Arc::new(MemoryStorage::new());
    let config = config_for(&server.url());
    let first = open_tab(&storage, &config);
    first
        .store
        .login(&Credentials::new("alice", "secret"))
        .await
        .expect("login");

    let second = open_tab(&storage, &config);
    let watcher = second.guard.spawn_watcher();
    second.store.initialize().await;
    assert_eq!(second.guard.decided().await, GuardState::Authorized);

    first.store.logout();

    let mut state = second.guard.subscribe();
    state
        .wait_for(|s| *s == GuardState::Denied)
        .await
        .expect("guard state channel");
    watcher.await.expect("watcher");

    assert!(!second.store.is_authenticated());
    assert!(!second.guard.is_admin());
    assert_eq!(second.navigator.visits(), vec!["login.html".to_string()]);
    assert_eq!(first.navigator.visits(), vec!["login.html".to_string()]);
}

#[tokio::test]
async fn test_expired_token_is_cleared_on_startup() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/auth/profile")
        .with_status(401)
        .with_body("{}")
        .create_async()
        .await;

    let storage = Arc::new(MemoryStorage::new());
    storage
        .set("user", &profile_json("u1", "admin").to_string())
        .expect("seed user");
    storage.set("token", "expired").expect("seed token");

    let mut config = config_for(&server.url());
    config.verify_on_startup = true;
    let tab = open_tab(&storage, &config);
    tab.store.initialize().await;

    assert!(!tab.store.is_authenticated());
    assert!(storage.get("token").is_none());
    assert_eq!(tab.guard.check().await, GuardState::Denied);
    assert_eq!(tab.guard.denial(), Some(GuardError::NotAuthenticated));
}
