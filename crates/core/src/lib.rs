//! Reseller Panel Core - Shared domain types.
//!
//! This crate provides the types shared by every reseller panel component:
//! - `admin` - Dashboard client library (session store, admin guard, API client)
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Anything that talks to the outside world lives in
//! `admin`.
//!
//! # Modules
//!
//! - [`types`] - Document IDs, emails, roles, user profiles, sessions,
//!   transactions and license key batches

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
