//! JWT signing and verification.

use std::path::{Path, PathBuf};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use super::AuthError;
use crate::models::auth::TokenClaims;

/// The only accepted signing algorithm.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Sign access-token claims with HS256.
pub fn sign_access_token(claims: &TokenClaims, secret: &[u8]) -> Result<String, AuthError> {
    let mut header = Header::new(ALGORITHM);
    header.typ = Some("JWT".to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify an access token's signature, algorithm and expiry.
///
/// Tokens signed with any algorithm other than HS256 are rejected even if
/// the signature would check out under that algorithm.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;
    decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "expired token",
                ErrorKind::InvalidAlgorithm => "unexpected signing algorithm",
                ErrorKind::InvalidSignature => "invalid signature",
                _ => "malformed token",
            };
            AuthError::Unauthorized(reason.into())
        })
}

/// Secret persisted under the platform data dir, generated on first use.
pub fn persisted_jwt_secret() -> String {
    resolve_jwt_secret_at(&jwt_secret_path())
}

/// Read the secret persisted at `path`, generating and writing one if absent.
///
/// A secret that cannot be written is still returned, but tokens signed
/// with it stop verifying after a restart.
pub fn resolve_jwt_secret_at(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    match persist_secret(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "generated JWT secret could not be persisted; issued tokens will not survive a restart"
        ),
    }
    secret
}

fn persist_secret(path: &Path, secret: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, secret)
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("warden")
        .join("jwt-secret")
}
