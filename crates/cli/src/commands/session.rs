//! Session commands: login, logout, whoami.
//!
//! # Usage
//!
//! ```bash
//! RP_PASSWORD=... rp-cli login -u alice
//! rp-cli whoami
//! rp-cli logout
//! ```

use reseller_panel_admin::error::{clear_sentry_user, set_sentry_user};
use reseller_panel_admin::{AppError, Credentials};

use super::Panel;

/// Log in and persist the session.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or the session cannot
/// be stored.
#[allow(clippy::print_stdout)]
pub async fn login(panel: &Panel, username: &str, password: &str) -> Result<(), AppError> {
    let user = panel
        .store
        .login(&Credentials::new(username, password))
        .await?;
    set_sentry_user(&user);

    println!("Logged in as {} ({})", user.username, user.role);
    Ok(())
}

/// Clear the persisted session.
#[allow(clippy::print_stdout)]
pub async fn logout(panel: &Panel) {
    panel.store.initialize().await;
    let was_authenticated = panel.store.is_authenticated();
    panel.store.logout();
    clear_sentry_user();

    if was_authenticated {
        println!("Logged out");
    } else {
        println!("No active session");
    }
}

/// Print the logged-in account.
///
/// # Errors
///
/// Returns `AppError::AccessDenied` when no session is stored.
#[allow(clippy::print_stdout)]
pub async fn whoami(panel: &Panel) -> Result<(), AppError> {
    panel.store.initialize().await;
    let user = panel
        .store
        .current_user()
        .ok_or_else(|| AppError::AccessDenied("not logged in".to_string()))?;
    set_sentry_user(&user);

    println!("{} <{}>", user.username, user.email);
    println!("  id:      {}", user.id);
    println!("  role:    {}", user.role);
    println!("  credits: {}", user.credits);
    if let Some(created_at) = user.created_at {
        println!("  since:   {}", created_at.format("%Y-%m-%d"));
    }
    Ok(())
}
