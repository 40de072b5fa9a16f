//! User profile snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Email, Role, UserId};

/// A read-only snapshot of an account, as returned by the profile endpoint.
///
/// Never mutated locally; a re-fetch replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Document ID of the account.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: Email,
    /// Account role.
    pub role: Role,
    /// Credit balance available for key purchases.
    #[serde(default)]
    pub credits: Decimal,
    /// When the account was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Whether this profile carries the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
