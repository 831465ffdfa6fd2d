//! Calling applications (web, mobile, desktop front-ends).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Platform a client runs on. Only `web` clients skip the app-key check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlatformType {
    #[default]
    Web,
    Other(String),
}

impl PlatformType {
    pub fn is_web(&self) -> bool {
        matches!(self, PlatformType::Web)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlatformType::Web => "web",
            PlatformType::Other(name) => name,
        }
    }
}

impl From<String> for PlatformType {
    fn from(value: String) -> Self {
        if value == "web" {
            PlatformType::Web
        } else {
            PlatformType::Other(value)
        }
    }
}

impl From<&str> for PlatformType {
    fn from(value: &str) -> Self {
        PlatformType::from(value.to_string())
    }
}

impl From<PlatformType> for String {
    fn from(value: PlatformType) -> Self {
        value.as_str().to_string()
    }
}

/// A registered client. The app key itself is never stored, only its digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub app_key_hash: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub platform_type: PlatformType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SHA-256 hash an app key for storage and comparison.
pub fn hash_app_key(app_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_type_parses_web() {
        assert_eq!(PlatformType::from("web"), PlatformType::Web);
        assert!(PlatformType::from("web").is_web());
    }

    #[test]
    fn platform_type_is_case_sensitive() {
        assert_eq!(
            PlatformType::from("Web"),
            PlatformType::Other("Web".into())
        );
    }

    #[test]
    fn platform_type_serializes_as_plain_string() {
        let json = serde_json::to_value(PlatformType::Other("android".into())).unwrap();
        assert_eq!(json, serde_json::json!("android"));
        let back: PlatformType = serde_json::from_value(serde_json::json!("web")).unwrap();
        assert_eq!(back, PlatformType::Web);
    }

    #[test]
    fn app_key_hash_is_stable_hex() {
        let h = hash_app_key("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_app_key("abc"));
        assert_ne!(h, hash_app_key("abd"));
    }
}
