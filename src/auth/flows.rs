// Sign-in, sign-up, and admin management flows.
// Calls the auth endpoints and installs the returned session on the context.

use tracing::info;

use crate::api::{AdminUser, BootstrapRequest, Credentials, Transport, endpoints};
use crate::error::{AdminError, Result};

use super::context::AuthContext;

/// Sign in and install the returned session.
pub async fn sign_in(
    api: &dyn Transport,
    auth: &AuthContext,
    credentials: &Credentials,
) -> Result<AdminUser> {
    let data = endpoints::signin(api, credentials).await?;
    auth.set_session(data.user.clone(), data.token);
    Ok(data.user)
}

/// Register and install the returned session.
pub async fn sign_up(
    api: &dyn Transport,
    auth: &AuthContext,
    credentials: &Credentials,
) -> Result<AdminUser> {
    let data = endpoints::signup(api, credentials).await?;
    auth.set_session(data.user.clone(), data.token);
    Ok(data.user)
}

/// Bootstrap the first super admin and install the returned session.
pub async fn bootstrap_super_admin(
    api: &dyn Transport,
    auth: &AuthContext,
    request: &BootstrapRequest,
) -> Result<AdminUser> {
    let data = endpoints::bootstrap_super_admin(api, request).await?;
    auth.set_session(data.user.clone(), data.token);
    Ok(data.user)
}

/// Create another admin. The current session is left unchanged.
pub async fn create_admin(
    api: &dyn Transport,
    auth: &AuthContext,
    credentials: &Credentials,
) -> Result<AdminUser> {
    if !auth.is_signed_in() {
        return Err(AdminError::NotSignedIn);
    }
    let user = endpoints::create_admin(api, credentials).await?;
    info!(email = %user.email, "created admin");
    Ok(user)
}

/// Drop the session.
pub fn sign_out(auth: &AuthContext) {
    auth.clear();
    info!("signed out");
}
