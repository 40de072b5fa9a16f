//! License key import command.
//!
//! # Usage
//!
//! ```bash
//! # Check a key file without uploading
//! rp-cli keys import --product office-2021 --file keys.txt --dry-run
//!
//! # Upload
//! rp-cli keys import --product office-2021 --file keys.txt
//! ```
//!
//! The file holds one key per line. Blank lines and lines starting with `#`
//! are skipped; repeated keys are uploaded once.

use std::path::Path;

use reseller_panel_admin::{AppError, PanelApi};
use reseller_panel_core::KeyBatch;
use tracing::info;

use super::Panel;

/// Parse a key file and upload it for `product`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or malformed, the guard
/// denies access, or the upload fails.
#[allow(clippy::print_stdout)]
pub async fn import(
    panel: &Panel,
    product: &str,
    file: &Path,
    dry_run: bool,
) -> Result<(), AppError> {
    let product = product.trim();
    if product.is_empty() {
        return Err(AppError::BadRequest("--product must not be empty".to_string()));
    }

    let batch = KeyBatch::parse(&std::fs::read_to_string(file)?)?;
    println!(
        "{} keys parsed ({} repeated in file)",
        batch.len(),
        batch.duplicates()
    );

    if dry_run {
        println!("Dry run: nothing uploaded");
        return Ok(());
    }

    let token = panel.require_admin().await?;
    let summary = panel
        .api
        .import_keys(&token, product, &batch)
        .await
        .inspect_err(|e| {
            if e.is_unauthorized() {
                panel.store.handle_unauthorized();
            }
        })?;

    info!(
        product,
        imported = summary.imported,
        duplicates = summary.duplicates,
        "Imported license keys"
    );
    println!(
        "Imported {} keys for {product} ({} already in inventory)",
        summary.imported, summary.duplicates
    );
    Ok(())
}
