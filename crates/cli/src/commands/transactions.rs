//! Transaction export command.
//!
//! # Usage
//!
//! ```bash
//! rp-cli transactions export --user alice --from 2024-05-01 --to 2024-05-31
//! rp-cli transactions export --search "office" -o office.csv
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use reseller_panel_admin::export::{export_filename, transactions_csv};
use reseller_panel_admin::{AppError, PanelApi};
use reseller_panel_core::{TransactionFilter, TransactionKind};
use tracing::info;

use super::Panel;

/// Assemble a filter from command-line options.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if `from` is after `to`.
pub fn build_filter(
    kind: Option<TransactionKind>,
    user: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    search: Option<String>,
) -> Result<TransactionFilter, AppError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::BadRequest(format!(
                "--from {from} is after --to {to}"
            )));
        }
    }

    Ok(TransactionFilter {
        kind,
        user,
        from,
        to,
        search,
    })
}

/// Fetch all transactions, filter them, and write the CSV.
///
/// # Errors
///
/// Returns an error if the guard denies access, the API call fails, or the
/// file cannot be written.
#[allow(clippy::print_stdout)]
pub async fn export(
    panel: &Panel,
    filter: &TransactionFilter,
    output: Option<PathBuf>,
) -> Result<(), AppError> {
    let token = panel.require_admin().await?;

    let transactions = panel.api.list_transactions(&token).await.inspect_err(|e| {
        if e.is_unauthorized() {
            panel.store.handle_unauthorized();
        }
    })?;
    let selected = filter.apply(&transactions);

    let path = output.unwrap_or_else(|| PathBuf::from(export_filename(filter)));
    std::fs::write(&path, transactions_csv(&selected))?;

    info!(
        total = transactions.len(),
        exported = selected.len(),
        path = %path.display(),
        "Exported transactions"
    );
    println!(
        "Exported {} of {} transactions to {}",
        selected.len(),
        transactions.len(),
        path.display()
    );
    Ok(())
}
