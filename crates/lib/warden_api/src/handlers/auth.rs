//! Signup, signin and refresh handlers.

use axum::Json;
use axum::extract::State;
use warden_core::auth::flows::{
    self, ClientCredentials, DeviceDetails, SignInInput, SignUpInput,
};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::models::{AuthResponse, RefreshRequest, SignInRequest, SignUpRequest};

/// `POST /auth/signup`: create an account and sign it in.
pub async fn signup_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignUpRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = flows::sign_up(
        state.store.as_ref(),
        &state.settings,
        SignUpInput {
            client: ClientCredentials {
                app_id: &body.app_id,
                app_key: body.app_key.as_deref(),
            },
            device: DeviceDetails {
                model: body.device_model.as_deref(),
                os_version: body.os_version.as_deref(),
                app_version: body.app_version.as_deref(),
            },
            first_name: &body.first_name,
            last_name: &body.last_name,
            display_name: &body.display_name,
            email: &body.email,
            password: &body.password,
        },
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /auth/signin`: authenticate with email + password.
pub async fn signin_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = flows::sign_in(
        state.store.as_ref(),
        &state.settings,
        SignInInput {
            client: ClientCredentials {
                app_id: &body.app_id,
                app_key: body.app_key.as_deref(),
            },
            device: DeviceDetails {
                model: body.device_model.as_deref(),
                os_version: body.os_version.as_deref(),
                app_version: body.app_version.as_deref(),
            },
            email: &body.email,
            password: &body.password,
        },
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /auth/token/refresh`: exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = flows::refresh(
        state.store.as_ref(),
        &state.settings,
        ClientCredentials {
            app_id: &body.app_id,
            app_key: body.app_key.as_deref(),
        },
        body.refresh_token.trim(),
    )
    .await?;
    Ok(Json(resp))
}
