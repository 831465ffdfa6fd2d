//! User documents and their embedded trusted sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image reference assigned to users who never uploaded one.
pub const DEFAULT_IMAGE_FILE_NAME: &str = "default_image_profile.jpeg";

/// Role granted to every account at signup.
pub const ROLE_USER: &str = "user";

/// Role required by the management routes.
pub const ROLE_ADMIN: &str = "admin";

/// A user document. Trusted apps are embedded and always written together
/// with the rest of the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    /// Lowercase-normalized, unique across users.
    pub email: String,
    pub password_hash: String,
    #[serde(default = "default_image_file_name")]
    pub image_file_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub roles: Vec<String>,
    #[serde(default)]
    pub trusted_apps: Vec<TrustedApp>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One recognized (client, device) binding and its current refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedApp {
    pub id: Uuid,
    pub client_id: Uuid,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    pub granted_at: DateTime<Utc>,
}

/// Fields required to create a user; everything else gets a default.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
}

fn default_image_file_name() -> String {
    DEFAULT_IMAGE_FILE_NAME.to_string()
}

fn default_enabled() -> bool {
    true
}

/// Lowercase and trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Build a fresh, enabled user with the `user` role and no trusted apps.
    pub fn new(id: Uuid, new_user: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            display_name: new_user.display_name,
            email: normalize_email(&new_user.email),
            password_hash: new_user.password_hash,
            image_file_name: default_image_file_name(),
            enabled: true,
            roles: vec![ROLE_USER.to_string()],
            trusted_apps: Vec::new(),
            joined_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The trusted app for a session id, if it still exists.
    pub fn trusted_app(&self, session_id: Uuid) -> Option<&TrustedApp> {
        self.trusted_apps.iter().find(|app| app.id == session_id)
    }
}

/// Public view of a user, without the password hash or trusted apps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub email: String,
    pub image_profile_url: String,
    pub is_enable: bool,
    pub roles: Vec<String>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            image_profile_url: user.image_file_name.clone(),
            is_enable: user.enabled,
            roles: user.roles.clone(),
            joined_at: user.joined_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(
            Uuid::now_v7(),
            NewUser {
                first_name: "Ahmad".into(),
                last_name: "Tahani".into(),
                display_name: "Ahmad".into(),
                email: "  Ahmad.Tahani@Example.COM ".into(),
                password_hash: "hash".into(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_user_is_enabled_with_user_role() {
        let user = sample();
        assert!(user.enabled);
        assert_eq!(user.roles, vec!["user".to_string()]);
        assert!(user.trusted_apps.is_empty());
        assert_eq!(user.image_file_name, DEFAULT_IMAGE_FILE_NAME);
    }

    #[test]
    fn new_user_email_is_normalized() {
        assert_eq!(sample().email, "ahmad.tahani@example.com");
    }

    #[test]
    fn document_without_optional_fields_uses_defaults() {
        let user = sample();
        let mut doc = serde_json::to_value(&user).unwrap();
        let obj = doc.as_object_mut().unwrap();
        obj.remove("enabled");
        obj.remove("image_file_name");
        obj.remove("trusted_apps");
        let parsed: User = serde_json::from_value(doc).unwrap();
        assert!(parsed.enabled);
        assert_eq!(parsed.image_file_name, DEFAULT_IMAGE_FILE_NAME);
        assert!(parsed.trusted_apps.is_empty());
    }

    #[test]
    fn profile_hides_secrets() {
        let profile = UserProfile::from(&sample());
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("trusted_apps").is_none());
        assert_eq!(json["is_enable"], true);
    }
}
