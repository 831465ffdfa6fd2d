//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::{AccessToken, Client, User};

/// Process-local store. Users sit behind a single lock so the email
/// uniqueness check and the write happen atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    clients: DashMap<Uuid, Client>,
    users: RwLock<HashMap<Uuid, User>>,
    /// Keyed by token string; lookups happen on every protected request.
    access_tokens: DashMap<String, AccessToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored access-token records, including expired ones.
    pub fn access_token_count(&self) -> usize {
        self.access_tokens.len()
    }
}

fn email_owned_by_other(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(&id).map(|c| c.clone()))
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        if self.clients.contains_key(&client.id) {
            return Err(StoreError::Duplicate(format!("client {}", client.id)));
        }
        self.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_refresh_token(
        &self,
        client_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.trusted_apps
                    .iter()
                    .any(|app| app.client_id == client_id && app.refresh_token == refresh_token)
            })
            .cloned())
    }

    async fn email_in_use(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        Ok(email_owned_by_other(&*self.users.read().await, email, except))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("user {}", user.id)));
        }
        if email_owned_by_other(&users, &user.email, None) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn replace_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if email_owned_by_other(&users, &user.email, Some(user.id)) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
        if self.access_tokens.contains_key(&token.token) {
            return Err(StoreError::Duplicate(format!("access token {}", token.id)));
        }
        self.access_tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_access_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        let now = Utc::now();
        Ok(self
            .access_tokens
            .get(token)
            .filter(|record| record.is_live_at(now))
            .map(|record| record.clone()))
    }

    async fn delete_access_token(&self, id: Uuid) -> Result<(), StoreError> {
        self.access_tokens.retain(|_, record| record.id != id);
        Ok(())
    }

    async fn purge_expired_access_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.access_tokens.len();
        self.access_tokens.retain(|_, record| record.is_live_at(now));
        Ok((before - self.access_tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{NewUser, TrustedApp};

    fn user(email: &str) -> User {
        User::new(
            Uuid::now_v7(),
            NewUser {
                first_name: "A".into(),
                last_name: "B".into(),
                display_name: "A".into(),
                email: email.into(),
                password_hash: "hash".into(),
            },
            Utc::now(),
        )
    }

    fn token(user_id: Uuid, value: &str, expire_at: DateTime<Utc>) -> AccessToken {
        AccessToken {
            id: Uuid::now_v7(),
            user_id,
            trusted_app_id: Uuid::now_v7(),
            token: value.into(),
            expire_at,
        }
    }

    #[tokio::test]
    async fn insert_user_rejects_duplicate_email_any_case() {
        let store = MemoryStore::new();
        store.insert_user(&user("a@b.com")).await.unwrap();
        let mut other = user("x@y.com");
        other.email = "A@B.com".into();
        let err = store.insert_user(&other).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn replace_user_requires_existing_document() {
        let store = MemoryStore::new();
        let err = store.replace_user(&user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn email_in_use_ignores_excepted_user() {
        let store = MemoryStore::new();
        let u = user("a@b.com");
        store.insert_user(&u).await.unwrap();
        assert!(store.email_in_use("a@b.com", None).await.unwrap());
        assert!(!store.email_in_use("a@b.com", Some(u.id)).await.unwrap());
    }

    #[tokio::test]
    async fn refresh_token_lookup_requires_same_entry() {
        let store = MemoryStore::new();
        let client_a = Uuid::now_v7();
        let client_b = Uuid::now_v7();
        let mut u = user("a@b.com");
        u.trusted_apps.push(TrustedApp {
            id: Uuid::now_v7(),
            client_id: client_a,
            refresh_token: "aaa".into(),
            device_model: None,
            os_version: None,
            app_version: None,
            granted_at: Utc::now(),
        });
        u.trusted_apps.push(TrustedApp {
            id: Uuid::now_v7(),
            client_id: client_b,
            refresh_token: "bbb".into(),
            device_model: None,
            os_version: None,
            app_version: None,
            granted_at: Utc::now(),
        });
        store.insert_user(&u).await.unwrap();

        assert!(store.find_user_by_refresh_token(client_a, "aaa").await.unwrap().is_some());
        // Client of one entry, token of the other.
        assert!(store.find_user_by_refresh_token(client_a, "bbb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_access_tokens_are_invisible_and_purged() {
        let store = MemoryStore::new();
        let uid = Uuid::now_v7();
        let now = Utc::now();
        store
            .insert_access_token(&token(uid, "live", now + Duration::hours(1)))
            .await
            .unwrap();
        store
            .insert_access_token(&token(uid, "dead", now - Duration::seconds(1)))
            .await
            .unwrap();

        assert!(store.find_access_token("live").await.unwrap().is_some());
        assert!(store.find_access_token("dead").await.unwrap().is_none());

        assert_eq!(store.purge_expired_access_tokens(now).await.unwrap(), 1);
        assert_eq!(store.access_token_count(), 1);
    }

    #[tokio::test]
    async fn delete_access_token_by_id() {
        let store = MemoryStore::new();
        let record = token(Uuid::now_v7(), "t", Utc::now() + Duration::hours(1));
        store.insert_access_token(&record).await.unwrap();
        store.delete_access_token(record.id).await.unwrap();
        assert!(store.find_access_token("t").await.unwrap().is_none());
    }
}
