//! Transaction CSV export.

use std::fmt::Write;

use chrono::Utc;
use reseller_panel_core::{Transaction, TransactionFilter};

/// Header row of the export.
pub const CSV_HEADER: &str = "Date,User,Type,Amount,Description";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render transactions as CSV, one row per transaction, header first.
#[must_use]
pub fn transactions_csv(transactions: &[&Transaction]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for tx in transactions {
        // Writing to a String cannot fail.
        let _ = writeln!(
            csv,
            "{},{},{},{},{}",
            tx.created_at.format(DATE_FORMAT),
            escape_field(&tx.username),
            tx.kind,
            tx.amount,
            escape_field(&tx.description)
        );
    }
    csv
}

/// Default file name for an export, e.g. `transactions-2024-05-01.csv`.
///
/// Uses the filter's `from`/`to` bounds when set, today's date otherwise.
#[must_use]
pub fn export_filename(filter: &TransactionFilter) -> String {
    match (filter.from, filter.to) {
        (Some(from), Some(to)) => format!("transactions-{from}-to-{to}.csv"),
        (Some(from), None) => format!("transactions-from-{from}.csv"),
        (None, Some(to)) => format!("transactions-to-{to}.csv"),
        (None, None) => format!("transactions-{}.csv", Utc::now().date_naive()),
    }
}

/// Quote a field if it contains a comma, quote or line break; double
/// embedded quotes.
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
