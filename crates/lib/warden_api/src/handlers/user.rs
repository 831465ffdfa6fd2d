//! Handlers for the signed-in user's own account.

use axum::extract::State;
use axum::{Extension, Json};
use warden_core::auth::flows::{self, ProfileUpdate};
use warden_core::auth::gate::AuthContext;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::models::{
    ChangePasswordRequest, OperationResult, PASSWORD_SUCCESSFULLY_CHANGE, SUCCESSFULLY_UPDATED,
    UpdateProfileRequest, UserProfile,
};

/// `GET /api/user/profile`
pub async fn get_profile_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> AppResult<Json<UserProfile>> {
    let profile = flows::profile(state.store.as_ref(), ctx.user_id).await?;
    Ok(Json(profile))
}

/// `PUT /api/user/profile`
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<OperationResult>> {
    flows::update_profile(
        state.store.as_ref(),
        ctx.user_id,
        ProfileUpdate {
            first_name: &body.first_name,
            last_name: &body.last_name,
            display_name: &body.display_name,
            email: &body.email,
        },
    )
    .await?;
    Ok(Json(OperationResult {
        message: SUCCESSFULLY_UPDATED.into(),
        description: "Profile updated".into(),
    }))
}

/// `PUT /api/user/password`
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<OperationResult>> {
    flows::change_password(
        state.store.as_ref(),
        &state.settings,
        ctx.user_id,
        &body.old_password,
        &body.password,
    )
    .await?;
    Ok(Json(OperationResult {
        message: PASSWORD_SUCCESSFULLY_CHANGE.into(),
        description: "Password changed".into(),
    }))
}
