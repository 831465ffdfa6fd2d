//! Token issuer: signs an access token, rotates the session's refresh token
//! and persists both records.
//!
//! The user document and the access-token record are written concurrently
//! and are not a transaction. When the access-token insert succeeds but the
//! user write fails, the orphaned record is deleted. When the user write
//! succeeds but the insert fails, the rotated session stays: the previous
//! refresh token is already dead and the client must sign in again.

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, rng};
use tracing::{debug, error, warn};

use super::sessions::{SessionRequest, bind_session};
use super::{AuthError, AuthSettings, jwt};
use crate::models::auth::BEARER;
use crate::models::{AccessToken, AuthResponse, TokenClaims, User};
use crate::store::CredentialStore;
use crate::uuid::uuidv7;

/// Issues access/refresh token pairs against a store.
pub struct TokenIssuer<'a> {
    store: &'a dyn CredentialStore,
    settings: &'a AuthSettings,
}

impl<'a> TokenIssuer<'a> {
    pub fn new(store: &'a dyn CredentialStore, settings: &'a AuthSettings) -> Self {
        Self { store, settings }
    }

    /// Lifetime in whole hours, uniform in `[min_token_hours, max_token_hours)`.
    fn lifetime_hours(&self) -> i64 {
        let min = self.settings.min_token_hours;
        let max = self.settings.max_token_hours;
        if max <= min {
            return i64::from(min);
        }
        i64::from(rng().random_range(min..max))
    }

    /// Issue a token pair for `user`, rotating or creating the trusted app
    /// selected by `request`.
    pub async fn issue(
        &self,
        mut user: User,
        request: SessionRequest,
    ) -> Result<AuthResponse, AuthError> {
        let now = Utc::now();
        let hours = self.lifetime_hours();
        let expire_at = now + Duration::hours(hours);

        let grant = bind_session(&mut user, &request, now)?;
        let token_id = uuidv7();

        let claims = TokenClaims {
            exp: expire_at.timestamp(),
            iat: now.timestamp(),
            uid: user.id.to_string(),
            roles: user.roles.clone(),
            name: user.display_name.clone(),
            img: user.image_file_name.clone(),
            aid: grant.session_id.to_string(),
            tid: token_id.to_string(),
        };
        let signed = jwt::sign_access_token(&claims, &self.settings.signing_key)?;

        let record = AccessToken {
            id: token_id,
            user_id: user.id,
            trusted_app_id: grant.session_id,
            token: signed,
            expire_at,
        };

        self.persist(&user, &record, expire_at).await?;

        debug!(
            user_id = %user.id,
            session_id = %grant.session_id,
            client_id = %grant.client_id,
            new_session = grant.created,
            hours,
            "issued access token"
        );

        Ok(AuthResponse {
            token_type: BEARER.to_string(),
            access_token: record.token,
            expire_in_min: hours * 60,
            refresh_token: grant.refresh_token,
        })
    }

    async fn persist(
        &self,
        user: &User,
        record: &AccessToken,
        expire_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let (user_write, token_write) = tokio::join!(
            self.store.replace_user(user),
            self.store.insert_access_token(record),
        );

        match (user_write, token_write) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) => {
                error!(user_id = %user.id, error = %e, "user write failed; removing orphaned access token");
                if let Err(cleanup) = self.store.delete_access_token(record.id).await {
                    warn!(
                        token_id = %record.id,
                        %expire_at,
                        error = %cleanup,
                        "could not remove orphaned access token; it expires on its own"
                    );
                }
                Err(e.into())
            }
            (Ok(()), Err(e)) => {
                error!(
                    user_id = %user.id,
                    session_id = %record.trusted_app_id,
                    error = %e,
                    "access token write failed after session rotation"
                );
                Err(e.into())
            }
            (Err(user_err), Err(token_err)) => {
                error!(user_id = %user.id, error = %user_err, token_error = %token_err, "issuance writes failed");
                Err(user_err.into())
            }
        }
    }
}
