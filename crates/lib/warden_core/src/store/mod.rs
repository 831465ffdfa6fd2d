//! Credential store: the keyed document store holding users, clients and
//! access tokens.
//!
//! The auth engine only talks to [`CredentialStore`]. Two backends exist:
//! [`memory::MemoryStore`] for tests and local runs, and
//! [`postgres::PgStore`] which keeps user documents as JSONB.

pub mod memory;
pub mod postgres;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccessToken, Client, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Shared handle to a store backend.
pub type SharedStore = Arc<dyn CredentialStore>;

/// Keyed document store for users, clients and access tokens.
///
/// User documents are read and written whole; there is no partial update.
/// Concurrent writers to the same user therefore resolve last-writer-wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, StoreError>;

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Look up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Find the user owning a trusted app for `client_id` whose current
    /// refresh token is `refresh_token`. Both must match the same entry.
    async fn find_user_by_refresh_token(
        &self,
        client_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Whether any user other than `except` owns `email`.
    async fn email_in_use(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError>;

    /// Insert a new user. Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Replace a whole user document. Fails with [`StoreError::NotFound`] if
    /// the user does not exist.
    async fn replace_user(&self, user: &User) -> Result<(), StoreError>;

    async fn insert_access_token(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// Fetch a live (unexpired) access-token record by its token string.
    async fn find_access_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError>;

    async fn delete_access_token(&self, id: Uuid) -> Result<(), StoreError>;

    /// Remove records that expired before `now`. Returns how many were removed.
    async fn purge_expired_access_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
