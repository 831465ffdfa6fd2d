//! Password hashing via bcrypt.
//!
//! bcrypt is CPU-bound, so the async wrappers move the work onto the
//! blocking pool.
//!
//! bcrypt only reads the first 72 bytes of its input, terminator included.
//! Longer passwords are refused rather than silently cut, so two passwords
//! sharing a long prefix never verify against each other.

use bcrypt::BcryptError;

use super::AuthError;

/// Longest password, in UTF-8 bytes, that bcrypt hashes in full.
pub const PASSWORD_MAX_BYTES: usize = 71;

/// bcrypt hasher with a configurable cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password with bcrypt. Passwords over [`PASSWORD_MAX_BYTES`]
    /// are a validation error.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::non_truncating_hash(password, self.cost).map_err(|e| match e {
            BcryptError::Truncation(_) => AuthError::Validation(format!(
                "password must be at most {PASSWORD_MAX_BYTES} bytes"
            )),
            other => AuthError::Internal(format!("bcrypt hash: {other}")),
        })
    }

    /// Verify a password against a bcrypt hash.
    ///
    /// A password too long to have been hashed in full never matches.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        match bcrypt::non_truncating_verify(password, hash) {
            Ok(ok) => Ok(ok),
            Err(BcryptError::Truncation(_)) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("bcrypt verify: {e}"))),
        }
    }

    pub async fn hash_blocking(&self, password: &str) -> Result<String, AuthError> {
        let hasher = *self;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
    }

    pub async fn verify_blocking(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = *self;
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
    }
}
