//! Authentication gate: resolves a bearer header to a request context.
//!
//! ```text
//! no header ─────────────────────────────► Unauthorized
//! not "Bearer <token>" ──────────────────► Unauthorized
//! bad signature / algorithm / expired ───► Unauthorized
//! signature ok → token record lookup
//!     record missing or expired ─────────► Unauthorized
//!     record found → owner lookup
//!         owner disabled ────────────────► UserDisabled
//!         owner enabled ─────────────────► AuthContext
//! ```
//!
//! Claim expiry and record existence are both checked: one catches tokens
//! that are old, the other tokens the store no longer holds.

use tracing::debug;
use uuid::Uuid;

use super::{AuthError, AuthSettings, jwt};
use crate::store::CredentialStore;

/// Expected authorization scheme.
const BEARER_PREFIX: &str = "Bearer ";

/// Identity of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    /// Access-token record id.
    pub token_id: Uuid,
    /// Trusted-session id.
    pub session_id: Uuid,
    /// Client of the trusted session, if the session still exists.
    pub client_id: Option<Uuid>,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Succeeds only if every role in `required` is held.
    pub fn require_roles(&self, required: &[&str]) -> Result<(), AuthError> {
        if required.iter().all(|role| self.has_role(role)) {
            Ok(())
        } else {
            debug!(user_id = %self.user_id, ?required, "missing required role");
            Err(AuthError::Forbidden)
        }
    }
}

/// Extract the token from an `Authorization` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Run the gate against the raw `Authorization` header value.
pub async fn authenticate(
    store: &dyn CredentialStore,
    settings: &AuthSettings,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let header =
        header.ok_or_else(|| AuthError::Unauthorized("missing authorization header".into()))?;
    let token = parse_bearer(header)
        .ok_or_else(|| AuthError::Unauthorized("invalid authorization scheme".into()))?;

    let claims = jwt::verify_access_token(token, &settings.signing_key)?;

    let record = store
        .find_access_token(token)
        .await?
        .ok_or_else(|| AuthError::Unauthorized("access token not found".into()))?;
    if claims.tid != record.id.to_string() {
        return Err(AuthError::Unauthorized("token record mismatch".into()));
    }

    let user = store.find_user(record.user_id).await?.ok_or_else(|| {
        AuthError::Internal(format!("owner {} of live access token is missing", record.user_id))
    })?;
    if !user.enabled {
        debug!(user_id = %user.id, "rejecting token of disabled user");
        return Err(AuthError::UserDisabled);
    }

    Ok(AuthContext {
        user_id: user.id,
        client_id: user.trusted_app(record.trusted_app_id).map(|app| app.client_id),
        roles: user.roles,
        token_id: record.id,
        session_id: record.trusted_app_id,
    })
}
