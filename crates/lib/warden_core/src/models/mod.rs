//! Domain models shared by the store backends, the auth engine and the API.

pub mod access_token;
pub mod auth;
pub mod client;
pub mod user;

pub use access_token::AccessToken;
pub use auth::{AuthResponse, TokenClaims};
pub use client::{Client, PlatformType};
pub use user::{NewUser, TrustedApp, User, UserProfile};
