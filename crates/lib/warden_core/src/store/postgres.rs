//! PostgreSQL credential store.
//!
//! Users are stored as whole JSONB documents so that a user and its trusted
//! apps are one write unit. Every call checks a connection out of the pool
//! and returns it when the query future completes or is dropped.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::{AccessToken, Client, User};

type ClientRow = (
    Uuid,
    String,
    String,
    Option<String>,
    bool,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

type AccessTokenRow = (Uuid, Uuid, Uuid, String, DateTime<Utc>);

/// Store backed by a `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool with a fixed acquire timeout and the same value as the
    /// server-side statement timeout.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let options = database_url
            .parse::<PgConnectOptions>()?
            .options([("statement_timeout", timeout.as_millis().to_string())]);
        info!(max_connections, timeout_ms = timeout.as_millis() as u64, "connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map unique violations to [`StoreError::Duplicate`].
fn map_write_error(e: sqlx::Error, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(what.to_string())
        }
        _ => StoreError::Database(e),
    }
}

fn client_from_row(row: ClientRow) -> Client {
    let (id, app_key_hash, name, description, enabled, platform_type, created_at, updated_at) =
        row;
    Client {
        id,
        app_key_hash,
        name,
        description,
        enabled,
        platform_type: platform_type.into(),
        created_at,
        updated_at,
    }
}

fn access_token_from_row(row: AccessTokenRow) -> AccessToken {
    let (id, user_id, trusted_app_id, token, expire_at) = row;
    AccessToken {
        id,
        user_id,
        trusted_app_id,
        token,
        expire_at,
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, app_key_hash, name, description, enabled, platform_type, created_at, updated_at \
             FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(client_from_row))
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO clients \
             (id, app_key_hash, name, description, enabled, platform_type, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(client.id)
        .bind(&client.app_key_hash)
        .bind(&client.name)
        .bind(client.description.as_deref())
        .bind(client.enabled)
        .bind(client.platform_type.as_str())
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "client id"))?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<User>>("SELECT document FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(user)| user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<User>>(
            "SELECT document FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(user)| user))
    }

    async fn find_user_by_refresh_token(
        &self,
        client_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, StoreError> {
        // Containment of a one-element array matches both keys on the same entry.
        let entry = serde_json::json!([{
            "client_id": client_id,
            "refresh_token": refresh_token,
        }]);
        let row = sqlx::query_scalar::<_, Json<User>>(
            "SELECT document FROM users WHERE document -> 'trusted_apps' @> $1 LIMIT 1",
        )
        .bind(Json(entry))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(user)| user))
    }

    async fn email_in_use(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users \
             WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, email, document) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.email)
            .bind(Json(user))
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "email"))?;
        Ok(())
    }

    async fn replace_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET email = $2, document = $3 WHERE id = $1")
            .bind(user.id)
            .bind(&user.email)
            .bind(Json(user))
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "email"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO access_tokens (id, user_id, trusted_app_id, token, expire_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(token.trusted_app_id)
        .bind(&token.token)
        .bind(token.expire_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "access token"))?;
        Ok(())
    }

    async fn find_access_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        let row = sqlx::query_as::<_, AccessTokenRow>(
            "SELECT id, user_id, trusted_app_id, token, expire_at \
             FROM access_tokens WHERE token = $1 AND expire_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(access_token_from_row))
    }

    async fn delete_access_token(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_access_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expire_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
