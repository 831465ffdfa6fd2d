//! Authentication and authorization engine.
//!
//! Client authorization, password hashing, trusted-session bookkeeping,
//! token issuance and the per-request authentication gate. Everything here
//! talks to storage through [`crate::store::CredentialStore`] and takes its
//! settings from an injected [`AuthSettings`].

pub mod client;
pub mod flows;
pub mod gate;
pub mod issuer;
pub mod jwt;
pub mod password;
pub mod sessions;

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Default lower bound of the access-token lifetime, in hours.
pub const DEFAULT_MIN_TOKEN_HOURS: u32 = 24;

/// Default upper bound (exclusive) of the access-token lifetime, in hours.
pub const DEFAULT_MAX_TOKEN_HOURS: u32 = 72;

/// Default bcrypt cost factor.
pub const DEFAULT_PASSWORD_COST: u32 = 10;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Client id is not well formed")]
    InvalidClientId,

    #[error("Client is not usable")]
    ClientNotUsable,

    #[error("Invalid credentials")]
    CredentialInvalid,

    #[error("Refresh token is not valid")]
    RefreshTokenInvalid,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User is disabled")]
    UserDisabled,

    #[error("Missing required role")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Settings shared by the issuer, the gate and the account flows.
#[derive(Clone)]
pub struct AuthSettings {
    /// HS256 signing key.
    pub signing_key: Vec<u8>,
    pub min_token_hours: u32,
    /// Exclusive.
    pub max_token_hours: u32,
    pub password_cost: u32,
}

impl AuthSettings {
    /// Settings with default lifetimes and bcrypt cost.
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_key: signing_key.into(),
            min_token_hours: DEFAULT_MIN_TOKEN_HOURS,
            max_token_hours: DEFAULT_MAX_TOKEN_HOURS,
            password_cost: DEFAULT_PASSWORD_COST,
        }
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn password_hasher(&self) -> password::PasswordHasher {
        password::PasswordHasher::new(self.password_cost)
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("signing_key", &"<redacted>")
            .field("min_token_hours", &self.min_token_hours)
            .field("max_token_hours", &self.max_token_hours)
            .field("password_cost", &self.password_cost)
            .finish()
    }
}
