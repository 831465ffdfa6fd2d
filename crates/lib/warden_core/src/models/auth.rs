//! Token claims and the response handed to clients after authentication.

use serde::{Deserialize, Serialize};

/// Token type reported in every [`AuthResponse`].
pub const BEARER: &str = "Bearer";

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// User ID.
    pub uid: String,
    /// User roles (e.g. `["user", "admin"]`).
    pub roles: Vec<String>,
    /// Display name.
    pub name: String,
    /// Avatar file reference.
    pub img: String,
    /// Trusted-session ID.
    pub aid: String,
    /// Access-token record ID.
    pub tid: String,
}

/// Result of signup, signin and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token_type: String,
    pub access_token: String,
    pub expire_in_min: i64,
    pub refresh_token: String,
}
