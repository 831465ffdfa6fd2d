//! Route paths.

pub const POST_AUTH_SIGNUP: &str = "/auth/signup";
pub const POST_AUTH_SIGNIN: &str = "/auth/signin";
pub const POST_AUTH_TOKEN_REFRESH: &str = "/auth/token/refresh";

/// `GET` and `PUT`.
pub const API_USER_PROFILE: &str = "/api/user/profile";
/// `PUT`.
pub const API_USER_PASSWORD: &str = "/api/user/password";
/// `PUT`.
pub const API_MANAGE_USERS_ID_ENABLED: &str = "/api/manage/users/{id}/enabled";
