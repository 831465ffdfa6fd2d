//! # warden_api
//!
//! HTTP API library for Warden.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warden_core::auth::AuthSettings;
use warden_core::models::user::{ROLE_ADMIN, ROLE_USER};
use warden_core::store::SharedStore;

use crate::handlers::{auth, manage, user};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential store backend.
    pub store: SharedStore,
    /// Signing key, token lifetimes and bcrypt cost.
    pub settings: AuthSettings,
}

const USER_ROLES: &[&str] = &[ROLE_USER];
const ADMIN_ROLES: &[&str] = &[ROLE_ADMIN];

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authenticate = axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_auth,
    );

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_SIGNUP, post(auth::signup_handler))
        .route(routes::POST_AUTH_SIGNIN, post(auth::signin_handler))
        .route(routes::POST_AUTH_TOKEN_REFRESH, post(auth::refresh_handler));

    // Route layers run bottom-up: authentication first, then the role check.
    let user_routes = Router::new()
        .route(
            routes::API_USER_PROFILE,
            get(user::get_profile_handler).put(user::update_profile_handler),
        )
        .route(routes::API_USER_PASSWORD, put(user::change_password_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            USER_ROLES,
            middleware::auth::require_roles,
        ))
        .route_layer(authenticate.clone());

    let admin_routes = Router::new()
        .route(
            routes::API_MANAGE_USERS_ID_ENABLED,
            put(manage::set_user_enabled_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            ADMIN_ROLES,
            middleware::auth::require_roles,
        ))
        .route_layer(authenticate);

    Router::new()
        .merge(public)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
