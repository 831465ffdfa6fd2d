//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};
use warden_core::auth::AuthError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AppError(#[from] pub AuthError);

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AuthError::Validation(msg.into()))
    }

    /// Status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "SOME_FIELDS_ARE_NOT_VALID"),
            AuthError::InvalidClientId => {
                (StatusCode::UNAUTHORIZED, "CLIENT_INFORMATION_IS_NOT_VALID")
            }
            AuthError::ClientNotUsable => {
                (StatusCode::FORBIDDEN, "CLIENT_IS_NOT_VALID_TO_COMMUNICATE")
            }
            AuthError::CredentialInvalid => {
                (StatusCode::UNAUTHORIZED, "CREDENTIAL_INFORMATION_IS_NOT_VALID")
            }
            AuthError::RefreshTokenInvalid => {
                (StatusCode::UNAUTHORIZED, "REFRESH_TOKEN_IS_NOT_VALID")
            }
            AuthError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UN_AUTHORIZED"),
            AuthError::UserDisabled => (StatusCode::UNAUTHORIZED, "USER_IS_DISABLED"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "CAN_NOT_ACCESS_TO_THESE_RESOURCES"),
            AuthError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND_ANY_ITEM_WITH_THIS_ID"),
            AuthError::EmailTaken => {
                (StatusCode::BAD_REQUEST, "ALREADY_HAVE_USER_WITH_EMAIL_ADDRESS")
            }
            AuthError::Store(_) | AuthError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
        }
    }

    /// Text sent to the caller. Reasons that would help an attacker and
    /// internal details stay in the logs.
    fn description(&self) -> String {
        match &self.0 {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::InvalidClientId => "Client information is not valid".into(),
            AuthError::ClientNotUsable => "Client is not valid to communicate".into(),
            AuthError::CredentialInvalid => "Email or password is not valid".into(),
            AuthError::RefreshTokenInvalid => "Refresh token is not valid".into(),
            AuthError::Unauthorized(_) => "Authorization is required".into(),
            AuthError::UserDisabled => "User is disabled".into(),
            AuthError::Forbidden => "Can not access these resources".into(),
            AuthError::NotFound(_) => "No item found with this id".into(),
            AuthError::EmailTaken => "A user with this email address already exists".into(),
            AuthError::Store(_) | AuthError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        match &self.0 {
            AuthError::Store(e) => error!(error = %e, "store failure"),
            AuthError::Internal(msg) => error!(error = %msg, "internal error"),
            AuthError::Unauthorized(reason) => debug!(%reason, "request rejected"),
            other => debug!(error = %other, "request failed"),
        }
        let body = Json(ErrorResponse {
            code: status.as_u16(),
            error: code.to_string(),
            description: self.description(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use warden_core::store::StoreError;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_details_are_not_sent() {
        let err = AppError(AuthError::Store(StoreError::Unavailable(
            "connection refused to 10.0.0.3".into(),
        )));
        let (status, json) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], 500);
        assert_eq!(json["error"], "INTERNAL_SERVER_ERROR");
        assert!(!json["description"].as_str().unwrap().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn unauthorized_reason_is_hidden() {
        let (status, json) = body_of(AppError(AuthError::Unauthorized("expired token".into()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "UN_AUTHORIZED");
        assert!(!json["description"].as_str().unwrap().contains("expired"));
    }

    #[tokio::test]
    async fn validation_message_is_passed_through() {
        let (status, json) = body_of(AppError::validation("email is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "SOME_FIELDS_ARE_NOT_VALID");
        assert_eq!(json["description"], "email is required");
    }

    #[test]
    fn status_table() {
        let cases = [
            (AuthError::InvalidClientId, 401),
            (AuthError::ClientNotUsable, 403),
            (AuthError::CredentialInvalid, 401),
            (AuthError::RefreshTokenInvalid, 401),
            (AuthError::UserDisabled, 401),
            (AuthError::Forbidden, 403),
            (AuthError::NotFound("x".into()), 404),
            (AuthError::EmailTaken, 400),
            (AuthError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(AppError(err).status_and_code().0.as_u16(), status);
        }
    }
}
