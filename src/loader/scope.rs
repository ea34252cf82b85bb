// View scopes.
// A scope exists only for a route its guard admitted and cancels pending loads on teardown.

use tokio::sync::watch;
use tracing::debug;

use crate::auth::{AuthContext, Redirect, Route};

/// A mounted view. Loads issued through it resolve to `Cancelled` once it is torn down.
pub struct ViewScope {
    route: Route,
    cancel: watch::Sender<bool>,
}

impl ViewScope {
    /// Mount a route, running its guard first.
    pub fn mount(route: Route, auth: &AuthContext) -> Result<Self, Redirect> {
        route.guard().check(auth).inspect_err(|redirect| {
            debug!(
                route = route.path(),
                to = redirect.to.path(),
                "guard refused view"
            );
        })?;

        let (cancel, _) = watch::channel(false);
        debug!(route = route.path(), "view mounted");
        Ok(Self { route, cancel })
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Tear the view down. Pending and future loads through this scope are cancelled.
    pub fn cancel(&self) {
        if !self.cancel.send_replace(true) {
            debug!(route = self.route.path(), "view torn down");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolve once the scope is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AdminRole, AdminUser};
    use std::time::Duration;

    fn signed_in() -> AuthContext {
        let auth = AuthContext::new();
        auth.set_session(
            AdminUser {
                id: "a1".to_string(),
                email: "ops@sanchara.in".to_string(),
                role: AdminRole::Admin,
            },
            "token",
        );
        auth
    }

    #[test]
    fn test_mount_runs_guard() {
        let redirect = ViewScope::mount(Route::Users, &AuthContext::new()).err();
        assert_eq!(redirect, Some(Redirect { to: Route::Signin }));

        let scope = ViewScope::mount(Route::Users, &signed_in()).unwrap();
        assert_eq!(scope.route(), Route::Users);
        assert!(!scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let scope = ViewScope::mount(Route::Dashboard, &signed_in()).unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(20), scope.cancelled()).await;
        assert!(waited.is_err());

        scope.cancel();
        assert!(scope.is_cancelled());
        tokio::time::timeout(Duration::from_millis(20), scope.cancelled())
            .await
            .unwrap();
    }
}
