//! Integration tests for the panel API client.
//!
//! Each test runs the real `HttpPanelApi` against a `mockito` server.

use mockito::{Matcher, Server};
use reseller_panel_admin::{ApiError, Credentials, HttpPanelApi, PanelApi};
use reseller_panel_core::{KeyBatch, Role, SessionToken, TransactionKind};
use reseller_panel_integration_tests::{config_for, failure, profile_json, success};
use serde_json::json;

fn client(server: &Server) -> HttpPanelApi {
    HttpPanelApi::new(&config_for(&server.url())).expect("client")
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_token_and_profile() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({
            "username": "alice",
            "password": "hunter2"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(&json!({
            "token": "tok-123",
            "user": profile_json("u1", "admin")
        })))
        .create_async()
        .await;

    let response = client(&server)
        .login(&Credentials::new("alice", "hunter2"))
        .await
        .expect("login");

    assert_eq!(response.token.expose(), "tok-123");
    assert_eq!(response.user.role, Role::Admin);
    assert_eq!(response.user.credits.to_string(), "25.00");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_login_failure_message_is_kept() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(failure("Invalid credentials"))
        .create_async()
        .await;

    let err = client(&server)
        .login(&Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api(ref m) if m == "Invalid credentials"));
}

// =============================================================================
// Profile and admin verification
// =============================================================================

#[tokio::test]
async fn test_verify_admin_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/admin/verify")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body(success(&json!({ "user": profile_json("u1", "admin") })))
        .create_async()
        .await;

    let user = client(&server)
        .verify_admin(&SessionToken::new("tok"))
        .await
        .expect("verify");

    assert!(user.is_admin());
    assert_eq!(user.id.as_str(), "u1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_profile_unauthorized() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/auth/profile")
        .with_status(401)
        .with_body(failure("Token expired"))
        .create_async()
        .await;

    let err = client(&server)
        .fetch_profile(&SessionToken::new("old"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_verify_admin_forbidden() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/admin/verify")
        .with_status(403)
        .with_body(failure("Admin access required"))
        .create_async()
        .await;

    let err = client(&server)
        .verify_admin(&SessionToken::new("tok"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Forbidden(ref m) if m == "Admin access required"));
}

#[tokio::test]
async fn test_server_error_and_malformed_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/auth/profile")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;
    server
        .mock("GET", "/api/admin/verify")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let api = client(&server);
    let token = SessionToken::new("tok");

    let err = api.fetch_profile(&token).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));

    let err = api.verify_admin(&token).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

// =============================================================================
// Transactions and key import
// =============================================================================

#[tokio::test]
async fn test_list_transactions() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/admin/transactions")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body(success(&json!({
            "transactions": [
                {
                    "_id": "t1",
                    "userId": "u2",
                    "username": "bob",
                    "type": "purchase",
                    "amount": "-9.99",
                    "description": "Windows 11 Pro",
                    "createdAt": "2024-05-01T10:00:00Z"
                },
                {
                    "_id": "t2",
                    "userId": "u2",
                    "username": "bob",
                    "type": "credit",
                    "amount": "50",
                    "createdAt": "2024-05-02T10:00:00Z"
                }
            ]
        })))
        .create_async()
        .await;

    let transactions = client(&server)
        .list_transactions(&SessionToken::new("tok"))
        .await
        .expect("transactions");

    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].kind, TransactionKind::Purchase);
    assert_eq!(transactions[1].kind, TransactionKind::Credit);
    assert!(transactions[1].description.is_empty());
}

#[tokio::test]
async fn test_import_keys_posts_batch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/admin/keys/import")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Json(json!({
            "product": "office-2021",
            "keys": ["AAAA-BBBB", "CCCC-DDDD"]
        })))
        .with_status(200)
        .with_body(success(&json!({ "imported": 1, "duplicates": 1 })))
        .create_async()
        .await;

    let batch = KeyBatch::parse("AAAA-BBBB\n# comment\n\nCCCC-DDDD\nAAAA-BBBB\n").expect("batch");
    let summary = client(&server)
        .import_keys(&SessionToken::new("tok"), "office-2021", &batch)
        .await
        .expect("import");

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.duplicates, 1);
    mock.assert_async().await;
}
