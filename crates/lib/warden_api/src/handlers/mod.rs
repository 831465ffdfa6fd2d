//! Request handlers.

pub mod auth;
pub mod manage;
pub mod user;
