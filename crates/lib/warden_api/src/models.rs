//! Request and response bodies.
//!
//! Required string fields default to empty so that a missing field and a
//! blank one produce the same validation message.

use serde::{Deserialize, Serialize};
use warden_core::auth::password::PASSWORD_MAX_BYTES;

pub use warden_core::models::{AuthResponse, UserProfile};

/// Message returned by the profile update endpoint.
pub const SUCCESSFULLY_UPDATED: &str = "SUCCESSFULLY_UPDATED";
/// Message returned by the password change endpoint.
pub const PASSWORD_SUCCESSFULLY_CHANGE: &str = "PASSWORD_SUCCESSFULLY_CHANGE";

const PASSWORD_MIN_CHARS: usize = 6;
const PASSWORD_MAX_CHARS: usize = 64;

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
    pub description: String,
}

/// Result body of state-changing operations that return no entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub message: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub app_id: String,
    pub app_key: Option<String>,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub app_id: String,
    pub app_key: Option<String>,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub app_id: String,
    pub app_key: Option<String>,
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// Field-level checks applied before a request reaches the core.
pub trait Validate {
    /// Returns a description of every failing field.
    fn validate(&self) -> Result<(), String>;
}

/// Collects field failures in declaration order.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(format!("{field} is required"));
        }
        self
    }

    fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(format!("{field} is required"));
        } else if !is_valid_email(value.trim()) {
            self.0.push(format!("{field} must be a valid email address"));
        }
        self
    }

    fn password(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.chars().count();
        if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
            self.0.push(format!(
                "{field} must be {PASSWORD_MIN_CHARS} to {PASSWORD_MAX_CHARS} characters"
            ));
        } else if value.len() > PASSWORD_MAX_BYTES {
            self.0.push(format!(
                "{field} must be at most {PASSWORD_MAX_BYTES} bytes"
            ));
        }
        self
    }

    fn finish(&mut self) -> Result<(), String> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0.join("; "))
        }
    }
}

/// Syntactic address check: one `@`, a non-empty local part, and a dotted
/// domain without empty labels. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), String> {
        Violations::default()
            .required("app_id", &self.app_id)
            .required("first_name", &self.first_name)
            .required("last_name", &self.last_name)
            .required("display_name", &self.display_name)
            .email("email", &self.email)
            .password("password", &self.password)
            .finish()
    }
}

impl Validate for SignInRequest {
    fn validate(&self) -> Result<(), String> {
        Violations::default()
            .required("app_id", &self.app_id)
            .email("email", &self.email)
            .password("password", &self.password)
            .finish()
    }
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), String> {
        Violations::default()
            .required("app_id", &self.app_id)
            .required("refresh_token", &self.refresh_token)
            .finish()
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), String> {
        Violations::default()
            .required("first_name", &self.first_name)
            .required("last_name", &self.last_name)
            .required("display_name", &self.display_name)
            .email("email", &self.email)
            .finish()
    }
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), String> {
        Violations::default()
            .password("old_password", &self.old_password)
            .password("password", &self.password)
            .finish()
    }
}

impl Validate for SetEnabledRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b..com"));
        assert!(!is_valid_email("a@-b.com"));
        assert!(!is_valid_email("plainaddress"));
    }

    fn signup() -> SignUpRequest {
        SignUpRequest {
            app_id: "id".into(),
            app_key: None,
            device_model: None,
            os_version: None,
            app_version: None,
            first_name: "A".into(),
            last_name: "B".into(),
            display_name: "A".into(),
            email: "a@b.com".into(),
            password: "123456abcz".into(),
        }
    }

    #[test]
    fn signup_accepts_example_body() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn signup_reports_every_failing_field() {
        let req = SignUpRequest {
            first_name: " ".into(),
            email: "nope".into(),
            password: "12345".into(),
            ..signup()
        };
        let msg = req.validate().unwrap_err();
        assert!(msg.contains("first_name is required"));
        assert!(msg.contains("email must be a valid email address"));
        assert!(msg.contains("password must be 6 to 64 characters"));
        assert!(!msg.contains("last_name"));
    }

    fn signin(password: String) -> SignInRequest {
        SignInRequest {
            app_id: "id".into(),
            app_key: None,
            device_model: None,
            os_version: None,
            app_version: None,
            email: "a@b.com".into(),
            password,
        }
    }

    #[test]
    fn password_bounds_count_characters() {
        assert!(signin("x".repeat(64)).validate().is_ok());
        assert!(signin("é".repeat(6)).validate().is_ok());
        let msg = signin("x".repeat(65)).validate().unwrap_err();
        assert!(msg.contains("6 to 64 characters"));
    }

    #[test]
    fn password_must_fit_in_bcrypt_input() {
        // 36 characters but 72 bytes.
        let msg = signin("é".repeat(36)).validate().unwrap_err();
        assert_eq!(msg, "password must be at most 71 bytes");
        assert!(signin(format!("{}x", "é".repeat(35))).validate().is_ok());
    }

    #[test]
    fn missing_fields_deserialize_to_validation_failures() {
        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        let msg = req.validate().unwrap_err();
        assert_eq!(msg, "app_id is required; refresh_token is required");
    }
}
