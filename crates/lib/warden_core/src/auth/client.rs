//! Client authorization: which front-end is calling, independent of the user.
//!
//! Every flow that touches user credentials authorizes the client first, so
//! an unknown or disabled app never reaches password verification.

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, info};
use uuid::Uuid;

use super::AuthError;
use crate::models::client::hash_app_key;
use crate::models::{Client, PlatformType};
use crate::store::CredentialStore;
use crate::uuid::{parse_id, uuidv7};

/// Length of generated app keys.
const APP_KEY_LEN: usize = 16;

/// A client that passed authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizedClient {
    pub client_id: Uuid,
    pub is_web: bool,
}

/// Check that `app_id` names an enabled client and, for non-web clients,
/// that `app_key` is its key.
pub async fn authorize(
    store: &dyn CredentialStore,
    app_id: &str,
    app_key: Option<&str>,
) -> Result<AuthorizedClient, AuthError> {
    let client_id = parse_id(app_id).ok_or(AuthError::InvalidClientId)?;

    let client = match store.find_client(client_id).await? {
        Some(c) if c.enabled => c,
        Some(_) => {
            debug!(%client_id, "client is disabled");
            return Err(AuthError::ClientNotUsable);
        }
        None => {
            debug!(%client_id, "unknown client");
            return Err(AuthError::ClientNotUsable);
        }
    };

    // Browsers cannot keep a secret, so web clients are not asked for one.
    let is_web = client.platform_type.is_web();
    if !is_web {
        let presented = hash_app_key(app_key.unwrap_or_default());
        if !constant_time_eq(presented.as_bytes(), client.app_key_hash.as_bytes()) {
            debug!(%client_id, "app key mismatch");
            return Err(AuthError::ClientNotUsable);
        }
    }

    Ok(AuthorizedClient { client_id, is_web })
}

/// Generate a new app key (alphanumeric).
pub fn generate_app_key() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(APP_KEY_LEN)
        .map(char::from)
        .collect()
}

/// Register a client. Returns the stored record and the plaintext app key,
/// which is not recoverable afterwards.
pub async fn register_client(
    store: &dyn CredentialStore,
    name: &str,
    description: Option<&str>,
    platform_type: PlatformType,
) -> Result<(Client, String), AuthError> {
    if name.trim().is_empty() {
        return Err(AuthError::Validation("client name is required".into()));
    }
    let app_key = generate_app_key();
    let now = Utc::now();
    let client = Client {
        id: uuidv7(),
        app_key_hash: hash_app_key(&app_key),
        name: name.trim().to_string(),
        description: description.map(str::to_string),
        enabled: true,
        platform_type,
        created_at: now,
        updated_at: now,
    };
    store.insert_client(&client).await?;
    info!(client_id = %client.id, platform = client.platform_type.as_str(), "registered client");
    Ok((client, app_key))
}

/// Compare two byte strings without short-circuiting on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
