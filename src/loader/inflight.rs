// In-flight request registry.
// Ensures at most one pending request per cache key and fans its outcome out to every waiter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::cache::CacheEntry;
use crate::error::LoadError;

/// Outcome shared with every caller waiting on a key.
pub type Outcome = std::result::Result<CacheEntry<Value>, LoadError>;

type Senders = HashMap<String, broadcast::Sender<Outcome>>;

/// Registry of pending requests keyed by cache key.
#[derive(Clone, Default)]
pub struct InFlight {
    requests: Arc<Mutex<Senders>>,
}

/// Result of joining the registry.
pub enum Joined {
    /// No request was pending; the caller must start one and complete it.
    Leader(broadcast::Receiver<Outcome>, Completion),
    /// A request is already pending; wait on the receiver.
    Follower(broadcast::Receiver<Outcome>),
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Senders> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to the pending request for `key`, registering one if none exists.
    pub fn join(&self, key: &str) -> Joined {
        let mut requests = self.lock();
        if let Some(sender) = requests.get(key) {
            return Joined::Follower(sender.subscribe());
        }

        let (sender, receiver) = broadcast::channel(1);
        requests.insert(key.to_string(), sender);
        Joined::Leader(
            receiver,
            Completion {
                registry: self.clone(),
                key: key.to_string(),
                done: false,
            },
        )
    }

    /// Number of keys with a pending request.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

/// Handle held by the leader of a request.
///
/// Dropping it without calling [`Completion::complete`] unregisters the key
/// and closes the channel, so waiters observe a cancellation instead of
/// hanging.
pub struct Completion {
    registry: InFlight,
    key: String,
    done: bool,
}

impl Completion {
    /// Unregister the key and deliver the outcome to every subscriber.
    pub fn complete(mut self, outcome: Outcome) {
        self.done = true;
        let sender = self.registry.lock().remove(&self.key);
        if let Some(sender) = sender {
            // No receivers left just means every caller gave up.
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.done {
            self.registry.lock().remove(&self.key);
        }
    }
}
