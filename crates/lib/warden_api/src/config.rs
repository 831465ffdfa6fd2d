//! API server configuration.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use warden_core::auth::jwt::persisted_jwt_secret;
use warden_core::auth::{AuthSettings, DEFAULT_PASSWORD_COST};

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret. `None` falls back to the persisted secret file.
    pub jwt_secret: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// bcrypt cost factor.
    pub password_cost: u32,
    pub sweep_interval_secs: u64,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                      | Default                            |
    /// |-------------------------------|------------------------------------|
    /// | `BIND_ADDR`                   | `127.0.0.1:3100`                   |
    /// | `DATABASE_URL`                | `postgres://localhost:5432/warden` |
    /// | `JWT_SECRET` / `AUTH_SECRET`  | generated & persisted to file      |
    /// | `WARDEN_MAX_CONNECTIONS`      | `5`                                |
    /// | `WARDEN_ACQUIRE_TIMEOUT_SECS` | `30`                               |
    /// | `WARDEN_BCRYPT_COST`          | `10`                               |
    /// | `WARDEN_SWEEP_INTERVAL_SECS`  | `300`                              |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3100".into()),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/warden".into()),
            jwt_secret: ["JWT_SECRET", "AUTH_SECRET"]
                .into_iter()
                .filter_map(|key| lookup(key))
                .find(|s| !s.trim().is_empty()),
            max_connections: parse_or("WARDEN_MAX_CONNECTIONS", &lookup, 5),
            acquire_timeout_secs: parse_or("WARDEN_ACQUIRE_TIMEOUT_SECS", &lookup, 30),
            password_cost: parse_or("WARDEN_BCRYPT_COST", &lookup, DEFAULT_PASSWORD_COST),
            sweep_interval_secs: parse_or("WARDEN_SWEEP_INTERVAL_SECS", &lookup, 300),
        }
    }

    /// Settings for the auth engine.
    ///
    /// Without a configured secret this reads, or generates and persists,
    /// the secret file under the platform data dir.
    pub fn auth_settings(&self) -> AuthSettings {
        let secret = self
            .jwt_secret
            .clone()
            .unwrap_or_else(persisted_jwt_secret);
        AuthSettings::new(secret.as_bytes()).with_password_cost(self.password_cost)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("password_cost", &self.password_cost)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .finish_non_exhaustive()
    }
}

fn parse_or<T: FromStr>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
    }
}
