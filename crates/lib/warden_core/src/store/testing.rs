//! Failure-injecting store wrapper for tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CredentialStore, MemoryStore, StoreError};
use crate::models::{AccessToken, Client, User};

/// Delegates to a [`MemoryStore`] but can be told to fail selected writes.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_user_writes: AtomicBool,
    pub fail_token_writes: AtomicBool,
    pub fail_token_deletes: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected {what} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FailingStore {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        self.inner.find_client(id).await
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.inner.insert_client(client).await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_refresh_token(
        &self,
        client_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, StoreError> {
        self.inner
            .find_user_by_refresh_token(client_id, refresh_token)
            .await
    }

    async fn email_in_use(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        self.inner.email_in_use(email, except).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.insert_user(user).await
    }

    async fn replace_user(&self, user: &User) -> Result<(), StoreError> {
        Self::check(&self.fail_user_writes, "user write")?;
        self.inner.replace_user(user).await
    }

    async fn insert_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        Self::check(&self.fail_token_writes, "access token write")?;
        self.inner.insert_access_token(token).await
    }

    async fn find_access_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        self.inner.find_access_token(token).await
    }

    async fn delete_access_token(&self, id: Uuid) -> Result<(), StoreError> {
        Self::check(&self.fail_token_deletes, "access token delete")?;
        self.inner.delete_access_token(id).await
    }

    async fn purge_expired_access_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.purge_expired_access_tokens(now).await
    }
}
