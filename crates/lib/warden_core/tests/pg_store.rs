//! PostgreSQL backend tests: run against the database in `DATABASE_URL`.
//!
//! `cargo test -p warden_core --test pg_store -- --ignored`
//!
//! Every test uses fresh ids and emails so runs can share one database.

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;
use warden_core::models::{AccessToken, Client, NewUser, PlatformType, TrustedApp, User};
use warden_core::store::{CredentialStore, PgStore, StoreError};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let store = PgStore::connect(&url, 2, StdDuration::from_secs(10))
        .await
        .expect("connect to PostgreSQL");
    warden_core::migrate::migrate(store.pool())
        .await
        .expect("run migrations");
    store
}

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Uuid::now_v7().simple())
}

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

fn trusted_app(client_id: Uuid, refresh_token: &str) -> TrustedApp {
    TrustedApp {
        id: Uuid::now_v7(),
        client_id,
        refresh_token: refresh_token.into(),
        device_model: Some("Pixel 8".into()),
        os_version: Some("14".into()),
        app_version: None,
        granted_at: Utc::now(),
    }
}

fn access_token(user_id: Uuid, expire_in: Duration) -> AccessToken {
    AccessToken {
        id: Uuid::now_v7(),
        user_id,
        trusted_app_id: Uuid::now_v7(),
        token: format!("token-{}", Uuid::now_v7()),
        expire_at: Utc::now() + expire_in,
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn client_roundtrip() {
    let store = store().await;
    let now = Utc::now();
    let client = Client {
        id: Uuid::now_v7(),
        app_key_hash: "digest".into(),
        name: "android".into(),
        description: None,
        enabled: true,
        platform_type: PlatformType::from("android".to_string()),
        created_at: now,
        updated_at: now,
    };
    store.insert_client(&client).await.unwrap();

    let found = store.find_client(client.id).await.unwrap().expect("client");
    assert_eq!(found.name, "android");
    assert_eq!(found.platform_type.as_str(), "android");
    assert!(!found.platform_type.is_web());
    assert!(store.find_client(Uuid::now_v7()).await.unwrap().is_none());

    let err = store.insert_client(&client).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn user_document_roundtrip() {
    let store = store().await;
    let email = unique_email("doc");
    let mut u = user(&email);
    u.trusted_apps.push(trusted_app(Uuid::now_v7(), "r1"));
    store.insert_user(&u).await.unwrap();

    assert_eq!(store.find_user(u.id).await.unwrap(), Some(u.clone()));
    let by_email = store
        .find_user_by_email(&email.to_uppercase())
        .await
        .unwrap()
        .expect("case-insensitive lookup");
    assert_eq!(by_email.id, u.id);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn email_uniqueness_ignores_case_on_insert_and_replace() {
    let store = store().await;
    let email = unique_email("dup");
    let first = user(&email);
    store.insert_user(&first).await.unwrap();

    let clash = user(&email.to_uppercase());
    assert!(matches!(
        store.insert_user(&clash).await.unwrap_err(),
        StoreError::Duplicate(_)
    ));

    let mut other = user(&unique_email("other"));
    store.insert_user(&other).await.unwrap();
    other.email = email.to_uppercase();
    assert!(matches!(
        store.replace_user(&other).await.unwrap_err(),
        StoreError::Duplicate(_)
    ));

    assert!(store.email_in_use(&email, None).await.unwrap());
    assert!(!store.email_in_use(&email, Some(first.id)).await.unwrap());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn replace_of_missing_user_is_not_found() {
    let store = store().await;
    let ghost = user(&unique_email("ghost"));
    assert!(matches!(
        store.replace_user(&ghost).await.unwrap_err(),
        StoreError::NotFound
    ));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn replace_persists_new_refresh_token() {
    let store = store().await;
    let client_id = Uuid::now_v7();
    let old = format!("old-{}", Uuid::now_v7().simple());
    let new = format!("new-{}", Uuid::now_v7().simple());
    let mut u = user(&unique_email("rotate"));
    u.trusted_apps.push(trusted_app(client_id, &old));
    store.insert_user(&u).await.unwrap();

    u.trusted_apps[0].refresh_token = new.clone();
    store.replace_user(&u).await.unwrap();

    assert!(
        store
            .find_user_by_refresh_token(client_id, &old)
            .await
            .unwrap()
            .is_none()
    );
    let found = store
        .find_user_by_refresh_token(client_id, &new)
        .await
        .unwrap()
        .expect("rotated token");
    assert_eq!(found.id, u.id);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn refresh_lookup_matches_client_and_token_on_one_entry() {
    let store = store().await;
    let client_a = Uuid::now_v7();
    let client_b = Uuid::now_v7();
    let token_a = format!("a-{}", Uuid::now_v7().simple());
    let token_b = format!("b-{}", Uuid::now_v7().simple());
    let mut u = user(&unique_email("pair"));
    u.trusted_apps.push(trusted_app(client_a, &token_a));
    u.trusted_apps.push(trusted_app(client_b, &token_b));
    store.insert_user(&u).await.unwrap();

    let found = store
        .find_user_by_refresh_token(client_a, &token_a)
        .await
        .unwrap()
        .expect("matching entry");
    assert_eq!(found.id, u.id);
    // Client of one entry, token of the other.
    assert!(
        store
            .find_user_by_refresh_token(client_a, &token_b)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .find_user_by_refresh_token(Uuid::now_v7(), &token_a)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn expired_access_tokens_are_invisible_then_purged() {
    let store = store().await;
    let owner = Uuid::now_v7();
    let live = access_token(owner, Duration::hours(1));
    let expired = access_token(owner, Duration::seconds(-5));
    store.insert_access_token(&live).await.unwrap();
    store.insert_access_token(&expired).await.unwrap();

    assert_eq!(
        store.find_access_token(&live.token).await.unwrap().map(|t| t.id),
        Some(live.id)
    );
    assert!(store.find_access_token(&expired.token).await.unwrap().is_none());

    let purged = store.purge_expired_access_tokens(Utc::now()).await.unwrap();
    assert!(purged >= 1);
    let remaining: i64 =
        sqlx::query_scalar("SELECT count(*) FROM access_tokens WHERE id = ANY($1)")
            .bind(vec![live.id, expired.id])
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(remaining, 1);

    store.delete_access_token(live.id).await.unwrap();
    assert!(store.find_access_token(&live.token).await.unwrap().is_none());
}
