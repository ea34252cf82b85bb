// Admin API endpoint functions.
// Provides the endpoint paths and typed calls for the auth and detail endpoints.

use serde_json::Value;

use crate::error::Result;

use super::client::{Query, Transport};
use super::types::{
    AdminUser, ApiResponse, AuthData, BootstrapRequest, CreatedAdmin, Credentials,
};

pub const SIGNIN: &str = "/api/admin/signin";
pub const SIGNUP: &str = "/api/admin/signup";
pub const BOOTSTRAP: &str = "/api/admin/bootstrap-super-admin";
pub const CREATE_ADMIN: &str = "/api/admin/create";
pub const DASHBOARD: &str = "/api/admin/dashboard";
pub const USERS: &str = "/api/admin/users";
pub const GUESTS: &str = "/api/admin/guests";
pub const ANALYTICS_OVERVIEW: &str = "/api/admin/analytics/overview";
pub const TRIPS: &str = "/api/admin/analytics/trips";
pub const GUEST_TIMESERIES: &str = "/api/admin/analytics/guests/timeseries";
pub const PERMISSIONS: &str = "/api/admin/analytics/permissions";
pub const HEATMAP: &str = "/api/admin/analytics/heatmap";

/// Path of a single trip.
pub fn trip_detail(trip_id: &str) -> String {
    format!("{}/{}", TRIPS, trip_id)
}

/// Query parameters for a paged list request.
pub fn page_query(page: u32, limit: u32) -> Query {
    vec![
        ("page".to_string(), page.to_string()),
        ("limit".to_string(), limit.to_string()),
    ]
}

/// Sign in with email and password.
pub async fn signin(api: &dyn Transport, credentials: &Credentials) -> Result<AuthData> {
    post_auth(api, SIGNIN, serde_json::to_value(credentials)?).await
}

/// Register a new admin account.
pub async fn signup(api: &dyn Transport, credentials: &Credentials) -> Result<AuthData> {
    post_auth(api, SIGNUP, serde_json::to_value(credentials)?).await
}

/// Create the first super admin using the deployment secret.
pub async fn bootstrap_super_admin(
    api: &dyn Transport,
    request: &BootstrapRequest,
) -> Result<AuthData> {
    post_auth(api, BOOTSTRAP, serde_json::to_value(request)?).await
}

/// Create another admin (super admin only).
pub async fn create_admin(api: &dyn Transport, credentials: &Credentials) -> Result<AdminUser> {
    let value = api
        .post_json(CREATE_ADMIN, &serde_json::to_value(credentials)?)
        .await?;
    let response: ApiResponse<CreatedAdmin> = serde_json::from_value(value)?;
    Ok(response.data.user)
}

/// Get the raw detail document of a trip.
pub async fn get_trip(api: &dyn Transport, trip_id: &str) -> Result<Value> {
    api.get_json(&trip_detail(trip_id), &[]).await
}

async fn post_auth(api: &dyn Transport, path: &str, body: Value) -> Result<AuthData> {
    let value = api.post_json(path, &body).await?;
    let response: ApiResponse<AuthData> = serde_json::from_value(value)?;
    Ok(response.data)
}
