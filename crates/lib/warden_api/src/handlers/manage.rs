//! Administrative user management.

use axum::Json;
use axum::extract::{Path, State};
use warden_core::auth::flows;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::models::{SetEnabledRequest, UserProfile};

/// `PUT /api/manage/users/{id}/enabled`: enable or disable an account.
pub async fn set_user_enabled_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<SetEnabledRequest>,
) -> AppResult<Json<UserProfile>> {
    let user_id = warden_core::uuid::parse_id(&id)
        .ok_or_else(|| AppError::validation(format!("id '{id}' is not valid")))?;
    let profile = flows::set_user_enabled(state.store.as_ref(), user_id, body.enabled).await?;
    Ok(Json(profile))
}
