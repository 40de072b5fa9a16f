//! Integration tests for the reseller panel client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p reseller-panel-integration-tests
//! ```
//!
//! Every test starts its own `mockito` server standing in for the panel
//! API; nothing external is needed.
//!
//! # Test Categories
//!
//! - `panel_api` - HTTP client envelope and status handling
//! - `admin_guard` - Session store and admin guard end to end

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use reseller_panel_admin::PanelConfig;
use serde_json::{Value, json};
use url::Url;

/// Configuration pointing at a mock server, with a short timeout.
///
/// # Panics
///
/// Panics if `server_url` is not a valid URL.
#[must_use]
#[allow(clippy::expect_used)]
pub fn config_for(server_url: &str) -> PanelConfig {
    let url = Url::parse(&format!("{server_url}/api")).expect("mock server URL");
    let mut config = PanelConfig::new(url);
    config.request_timeout = Duration::from_secs(2);
    config.verify_on_startup = false;
    config
}

/// Profile JSON as the API returns it.
#[must_use]
pub fn profile_json(id: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "username": format!("user-{id}"),
        "email": format!("{id}@example.com"),
        "role": role,
        "credits": "25.00",
        "createdAt": "2024-01-15T09:30:00Z"
    })
}

/// Successful envelope around `data`.
#[must_use]
pub fn success(data: &Value) -> String {
    json!({ "success": true, "data": data }).to_string()
}

/// Failed envelope with a message.
#[must_use]
pub fn failure(message: &str) -> String {
    json!({ "success": false, "message": message }).to_string()
}
