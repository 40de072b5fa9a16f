//! Core types for the reseller panel.
//!
//! This module provides type-safe wrappers for the panel's domain concepts.

pub mod email;
pub mod id;
pub mod license_key;
pub mod profile;
pub mod role;
pub mod session;
pub mod transaction;

pub use email::{Email, EmailError};
pub use id::*;
pub use license_key::{KeyBatch, KeyImportError, LicenseKey};
pub use profile::UserProfile;
pub use role::{Role, RoleParseError};
pub use session::{Session, SessionToken};
pub use transaction::{Transaction, TransactionFilter, TransactionKind};
