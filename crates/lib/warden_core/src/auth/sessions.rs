//! Trusted-session manager.
//!
//! A user holds one [`TrustedApp`] per (client, device) binding, or one per
//! client for web clients. Each login or refresh rotates that entry's
//! refresh token in place; a new entry is only appended for a binding the
//! user has never logged in from. The reported OS and app versions are
//! refreshed on every login that carries them.

use chrono::{DateTime, Utc};
use rand::{Rng, rng};
use uuid::Uuid;

use super::AuthError;
use crate::models::{TrustedApp, User};
use crate::uuid::uuidv7;

/// What the issuer is being asked to do with the user's sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// Refresh exchange for a session already located by its refresh token.
    Refresh { session_id: Uuid },
    /// Password login or signup.
    Login {
        client_id: Uuid,
        is_web: bool,
        device: DeviceInfo,
    },
}

/// What the caller reports about the device it logs in from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
}

/// How to find an existing trusted app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey<'a> {
    Id(Uuid),
    /// Web clients: the device model is ignored.
    Client(Uuid),
    ClientDevice(Uuid, Option<&'a str>),
}

/// Outcome of [`bind_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub refresh_token: String,
    /// `true` when a new trusted app was appended.
    pub created: bool,
}

impl SessionRequest {
    fn key(&self) -> SessionKey<'_> {
        match self {
            SessionRequest::Refresh { session_id } => SessionKey::Id(*session_id),
            SessionRequest::Login {
                client_id,
                is_web: true,
                ..
            } => SessionKey::Client(*client_id),
            SessionRequest::Login {
                client_id,
                is_web: false,
                device,
            } => SessionKey::ClientDevice(*client_id, device.model.as_deref()),
        }
    }
}

/// Index of the trusted app matching `key`, if any.
pub fn find_trusted_app(apps: &[TrustedApp], key: SessionKey<'_>) -> Option<usize> {
    apps.iter().position(|app| match key {
        SessionKey::Id(id) => app.id == id,
        SessionKey::Client(client_id) => app.client_id == client_id,
        SessionKey::ClientDevice(client_id, device) => {
            app.client_id == client_id && app.device_model.as_deref() == device
        }
    })
}

/// Index of the trusted app for `client_id` currently holding `refresh_token`.
pub fn find_by_refresh_token(
    apps: &[TrustedApp],
    client_id: Uuid,
    refresh_token: &str,
) -> Option<usize> {
    apps.iter()
        .position(|app| app.client_id == client_id && app.refresh_token == refresh_token)
}

/// Generate a 128-bit random refresh token as 32 lowercase hex characters.
pub fn generate_refresh_token() -> String {
    let value: u128 = rng().random();
    format!("{value:032x}")
}

/// Rotate or create the trusted app selected by `request` on `user`.
///
/// The user document is only changed in memory; the old refresh token stops
/// working once the caller persists it.
pub fn bind_session(
    user: &mut User,
    request: &SessionRequest,
    now: DateTime<Utc>,
) -> Result<SessionGrant, AuthError> {
    let refresh_token = generate_refresh_token();

    if let Some(index) = find_trusted_app(&user.trusted_apps, request.key()) {
        let app = &mut user.trusted_apps[index];
        app.refresh_token = refresh_token.clone();
        if let SessionRequest::Login { device, .. } = request {
            if device.os_version.is_some() {
                app.os_version = device.os_version.clone();
            }
            if device.app_version.is_some() {
                app.app_version = device.app_version.clone();
            }
        }
        return Ok(SessionGrant {
            session_id: app.id,
            client_id: app.client_id,
            refresh_token,
            created: false,
        });
    }

    match request {
        SessionRequest::Refresh { session_id } => Err(AuthError::Internal(format!(
            "refresh for session {session_id} that the user does not hold"
        ))),
        SessionRequest::Login {
            client_id,
            is_web,
            device,
        } => {
            let app = TrustedApp {
                id: uuidv7(),
                client_id: *client_id,
                refresh_token: refresh_token.clone(),
                device_model: if *is_web { None } else { device.model.clone() },
                os_version: device.os_version.clone(),
                app_version: device.app_version.clone(),
                granted_at: now,
            };
            let grant = SessionGrant {
                session_id: app.id,
                client_id: app.client_id,
                refresh_token,
                created: true,
            };
            user.trusted_apps.push(app);
            Ok(grant)
        }
    }
}
