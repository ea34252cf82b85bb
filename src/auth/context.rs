// Auth context holding the signed-in admin session.
// Supplies the bearer token to the HTTP client at request time and persists the session.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{AdminRole, AdminUser};
use crate::cache::{CacheStore, keys};
use crate::error::AdminError;

/// Capability for reading the current bearer token.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A signed-in admin and their bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: AdminUser,
    pub token: String,
}

/// Holder of the current session, optionally persisted to a store.
pub struct AuthContext {
    session: RwLock<Option<Session>>,
    store: Option<Arc<dyn CacheStore>>,
}

impl AuthContext {
    /// Create a context with no session and no persistence.
    pub fn new() -> Self {
        Self {
            session: RwLock::new(None),
            store: None,
        }
    }

    /// Create a context backed by a store, restoring any persisted session.
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        let session = store
            .get(keys::AUTH_KEY)
            .and_then(|raw| match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(error = %e, "persisted session unreadable, starting signed out");
                    None
                }
            });
        Self {
            session: RwLock::new(session),
            store: Some(store),
        }
    }

    /// Install a new session, replacing any existing one.
    pub fn set_session(&self, user: AdminUser, token: impl Into<String>) {
        let session = Session {
            user,
            token: token.into(),
        };
        info!(email = %session.user.email, role = session.user.role.as_str(), "signed in");
        self.persist(Some(&session));
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    /// Drop the current session.
    pub fn clear(&self) {
        self.persist(None);
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user(&self) -> Option<AdminUser> {
        self.session().map(|s| s.user)
    }

    pub fn role(&self) -> Option<AdminRole> {
        self.session().map(|s| s.user.role)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn persist(&self, session: Option<&Session>) {
        let Some(store) = &self.store else {
            return;
        };
        let result = match session {
            Some(session) => serde_json::to_string(session)
                .map_err(AdminError::from)
                .and_then(|json| store.set(keys::AUTH_KEY, &json)),
            None => store.remove(keys::AUTH_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to persist session");
        }
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for AuthContext {
    fn token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.token.clone())
    }
}
