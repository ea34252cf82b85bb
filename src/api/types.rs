// Admin API request and response types.
// Defines structs for the authentication endpoints of the admin REST API.

use serde::{Deserialize, Serialize};

/// Role of an admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    #[default]
    User,
    Admin,
    SuperAdmin,
    #[serde(other)]
    Unknown,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::User => "USER",
            AdminRole::Admin => "ADMIN",
            AdminRole::SuperAdmin => "SUPER_ADMIN",
            AdminRole::Unknown => "UNKNOWN",
        }
    }
}

/// Admin account as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: AdminRole,
}

/// Standard `{ success, data }` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

/// Payload of a successful sign-in, sign-up, or bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthData {
    pub user: AdminUser,
    pub token: String,
}

/// Payload of a successful admin creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAdmin {
    pub user: AdminUser,
}

/// Email and password pair used by the auth endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body for bootstrapping the first super admin.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapRequest {
    pub email: String,
    pub password: String,
    pub secret: String,
}
