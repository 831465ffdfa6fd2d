//! # warden_core
//!
//! Core authentication engine for Warden: client authorization, trusted
//! sessions, token issuance, the request gate and the credential store.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
