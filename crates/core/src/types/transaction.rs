//! Credit transactions and filtering.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TransactionId, UserId};

/// Kind of credit movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credits spent on license keys.
    Purchase,
    /// Credits added by an admin.
    Credit,
    /// Credits returned for a failed or revoked purchase.
    Refund,
    /// Manual correction.
    Adjustment,
}

impl TransactionKind {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Credit => "credit",
            Self::Refund => "refund",
            Self::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "credit" => Ok(Self::Credit),
            "refund" => Ok(Self::Refund),
            "adjustment" => Ok(Self::Adjustment),
            _ => Err(format!("invalid transaction type: {s}")),
        }
    }
}

/// A single credit transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Document ID.
    #[serde(alias = "_id")]
    pub id: TransactionId,
    /// Account the transaction belongs to.
    pub user_id: UserId,
    /// Username of that account (denormalized by the API).
    pub username: String,
    /// Kind of movement.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Signed amount in credits.
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,
}

/// Criteria for narrowing a transaction list.
///
/// Every field is optional; an empty filter matches everything. Dates are
/// inclusive and compared by UTC calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only this kind.
    pub kind: Option<TransactionKind>,
    /// Case-insensitive substring of the username.
    pub user: Option<String>,
    /// First day included.
    pub from: Option<NaiveDate>,
    /// Last day included.
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Whether the filter has no criteria.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.user.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.search.is_none()
    }

    /// Test a single transaction against every criterion.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.kind.is_some_and(|kind| kind != tx.kind) {
            return false;
        }

        let day = tx.created_at.date_naive();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }

        let user_ok = non_blank(self.user.as_deref())
            .is_none_or(|user| contains_ignore_case(&tx.username, user));
        let search_ok = non_blank(self.search.as_deref())
            .is_none_or(|search| contains_ignore_case(&tx.description, search));

        user_ok && search_ok
    }

    /// Keep the matching transactions, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|tx| self.matches(tx)).collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
