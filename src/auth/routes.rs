// Console routes and their access guards.
// Decides which views an admin may enter and where to redirect otherwise.

use crate::api::AdminRole;

use super::context::AuthContext;

/// A view of the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Signin,
    Users,
    Guests,
    Analytics,
    CreateAdmin,
}

impl Route {
    /// Resolve a path. The index path maps to the dashboard.
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_matches('/') {
            "" | "dashboard" => Some(Route::Dashboard),
            "signin" => Some(Route::Signin),
            "users" => Some(Route::Users),
            "guests" => Some(Route::Guests),
            "analytics" => Some(Route::Analytics),
            "create" => Some(Route::CreateAdmin),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Signin => "/signin",
            Route::Users => "/users",
            Route::Guests => "/guests",
            Route::Analytics => "/analytics",
            Route::CreateAdmin => "/create",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Signin => "Sign in",
            Route::Users => "Users",
            Route::Guests => "Guest Visits",
            Route::Analytics => "Analytics",
            Route::CreateAdmin => "Create Admin",
        }
    }

    pub fn guard(&self) -> Guard {
        match self {
            Route::Signin => Guard::RequireGuest,
            Route::CreateAdmin => Guard::RequireSuperAdmin,
            _ => Guard::RequireAuth,
        }
    }
}

/// Access predicate attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Requires a bearer token.
    RequireAuth,
    /// Requires the absence of a bearer token.
    RequireGuest,
    /// Requires a signed-in user with the super admin role.
    RequireSuperAdmin,
}

/// Outcome of a guard that refused entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
}

impl Guard {
    pub fn check(&self, auth: &AuthContext) -> Result<(), Redirect> {
        match self {
            Guard::RequireAuth if !auth.is_signed_in() => Err(Redirect { to: Route::Signin }),
            Guard::RequireGuest if auth.is_signed_in() => Err(Redirect {
                to: Route::Dashboard,
            }),
            Guard::RequireSuperAdmin => match auth.role() {
                None => Err(Redirect { to: Route::Signin }),
                Some(AdminRole::SuperAdmin) => Ok(()),
                Some(_) => Err(Redirect {
                    to: Route::Dashboard,
                }),
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AdminUser;

    fn signed_in(role: AdminRole) -> AuthContext {
        let auth = AuthContext::new();
        auth.set_session(
            AdminUser {
                id: "a1".to_string(),
                email: "ops@sanchara.in".to_string(),
                role,
            },
            "token",
        );
        auth
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/users"), Some(Route::Users));
        assert_eq!(Route::from_path("create"), Some(Route::CreateAdmin));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn test_require_auth() {
        let guest = AuthContext::new();
        assert_eq!(
            Route::Users.guard().check(&guest),
            Err(Redirect { to: Route::Signin })
        );
        assert!(Route::Users.guard().check(&signed_in(AdminRole::Admin)).is_ok());
    }

    #[test]
    fn test_require_guest() {
        assert!(Route::Signin.guard().check(&AuthContext::new()).is_ok());
        assert_eq!(
            Route::Signin.guard().check(&signed_in(AdminRole::Admin)),
            Err(Redirect {
                to: Route::Dashboard
            })
        );
    }

    #[test]
    fn test_require_super_admin() {
        let guard = Route::CreateAdmin.guard();
        assert_eq!(
            guard.check(&AuthContext::new()),
            Err(Redirect { to: Route::Signin })
        );
        assert_eq!(
            guard.check(&signed_in(AdminRole::Admin)),
            Err(Redirect {
                to: Route::Dashboard
            })
        );
        assert!(guard.check(&signed_in(AdminRole::SuperAdmin)).is_ok());
    }
}
