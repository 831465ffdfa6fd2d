//! Authentication middleware: bearer token gate and role checks.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use warden_core::auth::gate::{self, AuthContext};

use crate::AppState;
use crate::error::AppError;

/// Axum middleware: runs the authentication gate on the `Authorization`
/// header and injects [`AuthContext`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let ctx = gate::authenticate(state.store.as_ref(), &state.settings, header).await?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Axum middleware: rejects the request unless the context holds every
/// role in the state. Must run after [`require_auth`].
pub async fn require_roles(
    State(required): State<&'static [&'static str]>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = request.extensions().get::<AuthContext>().ok_or_else(|| {
        AppError(warden_core::auth::AuthError::Unauthorized(
            "role check without authentication".into(),
        ))
    })?;
    ctx.require_roles(required)?;
    Ok(next.run(request).await)
}
