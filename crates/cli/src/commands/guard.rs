//! Admin guard command.

use reseller_panel_admin::{AppError, GuardState};

use super::Panel;

/// Run the admin guard against the stored session and print its decision.
///
/// # Errors
///
/// Returns `AppError::AccessDenied` if the guard denies access.
#[allow(clippy::print_stdout)]
pub async fn check(panel: &Panel) -> Result<(), AppError> {
    panel.store.initialize().await;
    let guard = panel.guard();
    let state = guard.check().await;

    println!("{state}");
    if state == GuardState::Authorized {
        return Ok(());
    }

    let reason = guard
        .denial()
        .map_or_else(|| state.to_string(), |reason| reason.to_string());
    println!("  reason: {reason}");
    Err(AppError::AccessDenied(reason))
}
