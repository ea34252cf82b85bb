// Authentication module.
// Holds the admin session, the auth flows, and the route guards built on them.

pub mod context;
pub mod flows;
pub mod routes;

pub use context::{AuthContext, Session, TokenSource};
pub use routes::{Guard, Redirect, Route};
