//! Account flows: signup, signin, refresh, and the authenticated profile
//! and password operations.
//!
//! Inputs are assumed to have passed field validation at the HTTP boundary.
//! Each credential flow authorizes the client before looking at the user.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::client::authorize;
use super::issuer::TokenIssuer;
use super::sessions::{DeviceInfo, SessionRequest, find_by_refresh_token};
use super::{AuthError, AuthSettings};
use crate::models::user::normalize_email;
use crate::models::{AuthResponse, NewUser, User, UserProfile};
use crate::store::{CredentialStore, StoreError};
use crate::uuid::uuidv7;

/// Client identification sent with every credential flow.
#[derive(Debug, Clone, Copy)]
pub struct ClientCredentials<'a> {
    pub app_id: &'a str,
    pub app_key: Option<&'a str>,
}

/// Optional device description sent with signup and signin.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceDetails<'a> {
    pub model: Option<&'a str>,
    pub os_version: Option<&'a str>,
    pub app_version: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct SignUpInput<'a> {
    pub client: ClientCredentials<'a>,
    pub device: DeviceDetails<'a>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub display_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct SignInInput<'a> {
    pub client: ClientCredentials<'a>,
    pub device: DeviceDetails<'a>,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileUpdate<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub display_name: &'a str,
    pub email: &'a str,
}

/// Blank values count as absent.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn login_request(client_id: Uuid, is_web: bool, device: DeviceDetails<'_>) -> SessionRequest {
    SessionRequest::Login {
        client_id,
        is_web,
        device: DeviceInfo {
            model: non_blank(device.model),
            os_version: non_blank(device.os_version),
            app_version: non_blank(device.app_version),
        },
    }
}

fn email_conflict(e: StoreError) -> AuthError {
    match e {
        StoreError::Duplicate(_) => AuthError::EmailTaken,
        other => AuthError::Store(other),
    }
}

/// Create an account and sign it in on the calling client.
pub async fn sign_up(
    store: &dyn CredentialStore,
    settings: &AuthSettings,
    input: SignUpInput<'_>,
) -> Result<AuthResponse, AuthError> {
    let client = authorize(store, input.client.app_id, input.client.app_key).await?;

    let email = normalize_email(input.email);
    if store.email_in_use(&email, None).await? {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = settings.password_hasher().hash_blocking(input.password).await?;
    let user = User::new(
        uuidv7(),
        NewUser {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            display_name: input.display_name.trim().to_string(),
            email,
            password_hash,
        },
        Utc::now(),
    );
    // The unique index still guards the race between the check and the insert.
    store.insert_user(&user).await.map_err(email_conflict)?;
    info!(user_id = %user.id, client_id = %client.client_id, "user signed up");

    TokenIssuer::new(store, settings)
        .issue(
            user,
            login_request(client.client_id, client.is_web, input.device),
        )
        .await
}

/// Authenticate with email and password.
pub async fn sign_in(
    store: &dyn CredentialStore,
    settings: &AuthSettings,
    input: SignInInput<'_>,
) -> Result<AuthResponse, AuthError> {
    let client = authorize(store, input.client.app_id, input.client.app_key).await?;

    let user = store
        .find_user_by_email(&normalize_email(input.email))
        .await?
        .ok_or(AuthError::CredentialInvalid)?;

    if !settings
        .password_hasher()
        .verify_blocking(input.password, &user.password_hash)
        .await?
    {
        debug!(user_id = %user.id, "password mismatch");
        return Err(AuthError::CredentialInvalid);
    }
    if !user.enabled {
        return Err(AuthError::UserDisabled);
    }

    TokenIssuer::new(store, settings)
        .issue(
            user,
            login_request(client.client_id, client.is_web, input.device),
        )
        .await
}

/// Exchange a refresh token for a new token pair. The presented refresh
/// token stops working as soon as the new one is stored.
pub async fn refresh(
    store: &dyn CredentialStore,
    settings: &AuthSettings,
    client: ClientCredentials<'_>,
    refresh_token: &str,
) -> Result<AuthResponse, AuthError> {
    let client = authorize(store, client.app_id, client.app_key).await?;

    let user = store
        .find_user_by_refresh_token(client.client_id, refresh_token)
        .await?
        .ok_or(AuthError::RefreshTokenInvalid)?;
    if !user.enabled {
        return Err(AuthError::UserDisabled);
    }

    let index = find_by_refresh_token(&user.trusted_apps, client.client_id, refresh_token)
        .ok_or_else(|| {
            AuthError::Internal(format!("store matched user {} without a session", user.id))
        })?;
    let session_id = user.trusted_apps[index].id;

    TokenIssuer::new(store, settings)
        .issue(user, SessionRequest::Refresh { session_id })
        .await
}

async fn load_user(store: &dyn CredentialStore, user_id: Uuid) -> Result<User, AuthError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {user_id}")))
}

/// The caller's profile.
pub async fn profile(store: &dyn CredentialStore, user_id: Uuid) -> Result<UserProfile, AuthError> {
    Ok(UserProfile::from(&load_user(store, user_id).await?))
}

/// Update names and email of the caller.
pub async fn update_profile(
    store: &dyn CredentialStore,
    user_id: Uuid,
    update: ProfileUpdate<'_>,
) -> Result<UserProfile, AuthError> {
    let email = normalize_email(update.email);
    if store.email_in_use(&email, Some(user_id)).await? {
        return Err(AuthError::EmailTaken);
    }

    let mut user = load_user(store, user_id).await?;
    user.first_name = update.first_name.trim().to_string();
    user.last_name = update.last_name.trim().to_string();
    user.display_name = update.display_name.trim().to_string();
    user.email = email;
    user.updated_at = Utc::now();
    store.replace_user(&user).await.map_err(email_conflict)?;

    Ok(UserProfile::from(&user))
}

/// Change the caller's password after checking the current one.
pub async fn change_password(
    store: &dyn CredentialStore,
    settings: &AuthSettings,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let mut user = load_user(store, user_id).await?;
    let hasher = settings.password_hasher();
    if !hasher.verify_blocking(old_password, &user.password_hash).await? {
        return Err(AuthError::CredentialInvalid);
    }
    user.password_hash = hasher.hash_blocking(new_password).await?;
    user.updated_at = Utc::now();
    store.replace_user(&user).await?;
    info!(user_id = %user.id, "password changed");
    Ok(())
}

/// Enable or disable an account. Disabled users are rejected by the gate on
/// their next request, whatever tokens they hold.
pub async fn set_user_enabled(
    store: &dyn CredentialStore,
    user_id: Uuid,
    enabled: bool,
) -> Result<UserProfile, AuthError> {
    let mut user = load_user(store, user_id).await?;
    user.enabled = enabled;
    user.updated_at = Utc::now();
    store.replace_user(&user).await?;
    info!(user_id = %user.id, enabled, "user enabled flag changed");
    Ok(UserProfile::from(&user))
}

/// Grant a role if the user does not already hold it.
pub async fn grant_role(
    store: &dyn CredentialStore,
    user_id: Uuid,
    role: &str,
) -> Result<UserProfile, AuthError> {
    let mut user = load_user(store, user_id).await?;
    if !user.has_role(role) {
        user.roles.push(role.to_string());
        user.updated_at = Utc::now();
        store.replace_user(&user).await?;
        info!(user_id = %user.id, role, "role granted");
    }
    Ok(UserProfile::from(&user))
}
