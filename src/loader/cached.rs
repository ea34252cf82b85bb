// Cache-then-refresh loader.
// Serves cached entries first and shares one in-flight request per cache key.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::Transport;
use crate::cache::{self, CacheEntry, CacheStore, keys};
use crate::error::LoadError;

use super::inflight::{Completion, InFlight, Joined, Outcome};
use super::resource::Resource;
use super::scope::ViewScope;

pub type LoadResult<T> = std::result::Result<CacheEntry<T>, LoadError>;

/// Loader shared by every view.
///
/// A fetch runs as its own task. Its normalized result is written to the
/// store before being handed to every waiting caller, and failures leave
/// the store untouched. Every load goes through a [`ViewScope`]; tearing the
/// scope down resolves that scope's pending loads to [`LoadError::Cancelled`].
#[derive(Clone)]
pub struct Loader {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CacheStore>,
    limit: u32,
    in_flight: InFlight,
}

impl Loader {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn CacheStore>, limit: u32) -> Self {
        Self {
            transport,
            store,
            limit: limit.max(1),
            in_flight: InFlight::new(),
        }
    }

    /// Page size used for paged resources.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Load a resource page, serving the cache unless `force_refresh` is set.
    pub async fn load<R: Resource>(
        &self,
        scope: &ViewScope,
        page: Option<u32>,
        force_refresh: bool,
    ) -> LoadResult<R::Payload> {
        if scope.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let page = page_for::<R>(page);
        let key = keys::cache_key(R::NAME, page);

        if !force_refresh {
            if let Some(entry) = cache::read_entry::<R::Payload>(self.store.as_ref(), &key) {
                debug!(key, "cache hit");
                return Ok(entry);
            }
            debug!(key, "cache miss");
        }

        let mut receiver = match self.in_flight.join(&key) {
            Joined::Leader(receiver, completion) => {
                // A previous leader may have filled the cache after our first read.
                let filled = if force_refresh {
                    None
                } else {
                    cache::read_entry::<R::Payload>(self.store.as_ref(), &key)
                };
                match filled {
                    Some(entry) => {
                        debug!(key, "cache filled by previous request");
                        completion.complete(Ok(CacheEntry {
                            payload: to_value(&key, &entry.payload),
                            fetched_at: entry.fetched_at,
                        }));
                    }
                    None => self.spawn_fetch::<R>(key.clone(), page, completion),
                }
                receiver
            }
            Joined::Follower(receiver) => {
                debug!(key, "joined in-flight request");
                receiver
            }
        };

        let outcome = tokio::select! {
            _ = scope.cancelled() => {
                debug!(key, route = scope.route().path(), "load cancelled by view teardown");
                return Err(LoadError::Cancelled);
            }
            received = receiver.recv() => received.map_err(|_| LoadError::Cancelled)?,
        };

        outcome.map(|entry| decode::<R>(&key, entry))
    }

    /// Peek at the cached entry without touching the network.
    pub fn cached<R: Resource>(&self, page: Option<u32>) -> Option<CacheEntry<R::Payload>> {
        let key = keys::cache_key(R::NAME, page_for::<R>(page));
        cache::read_entry(self.store.as_ref(), &key)
    }

    /// Load with a forced refresh, then drop the resource's other cached pages.
    ///
    /// A failed refresh leaves every cached page in place.
    pub async fn refresh<R: Resource>(
        &self,
        scope: &ViewScope,
        page: Option<u32>,
    ) -> LoadResult<R::Payload> {
        let entry = self.load::<R>(scope, page, true).await?;
        let keep = keys::cache_key(R::NAME, page_for::<R>(page));
        cache::invalidate_resource_except(self.store.as_ref(), R::NAME, &keep);
        Ok(entry)
    }

    /// Remove all cached entries of a resource. Never fails.
    pub fn invalidate(&self, resource: &str) -> usize {
        cache::invalidate_resource(self.store.as_ref(), resource)
    }

    fn spawn_fetch<R: Resource>(&self, key: String, page: Option<u32>, completion: Completion) {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let limit = self.limit;

        tokio::spawn(async move {
            info!(key, "fetching");
            let outcome: Outcome = match R::fetch(transport.as_ref(), page, limit).await {
                Ok(raw) => {
                    let payload = R::normalize(&raw, page, limit);
                    let entry = CacheEntry::new(to_value(&key, &payload));
                    if let Err(e) = cache::write_entry(store.as_ref(), &key, &entry) {
                        warn!(key, error = %e, "failed to write cache entry");
                    }
                    info!(key, "fetched");
                    Ok(entry)
                }
                Err(e) => {
                    let error = LoadError::from(e);
                    info!(key, %error, "fetch failed, cache left untouched");
                    Err(error)
                }
            };
            completion.complete(outcome);
        });
    }
}

fn page_for<R: Resource>(page: Option<u32>) -> Option<u32> {
    R::PAGED.then(|| page.unwrap_or(1).max(1))
}

fn to_value<T: serde::Serialize>(key: &str, payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        warn!(key, error = %e, "payload not serializable");
        Value::Null
    })
}

fn decode<R: Resource>(key: &str, entry: CacheEntry<Value>) -> CacheEntry<R::Payload> {
    let payload = serde_json::from_value(entry.payload).unwrap_or_else(|e| {
        warn!(key, error = %e, "shared payload did not decode, using empty payload");
        R::Payload::default()
    });
    CacheEntry {
        payload,
        fetched_at: entry.fetched_at,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::auth::Route;
    use crate::cache::MemoryStore;
    use crate::loader::resource::{Analytics, Dashboard, Users};
    use crate::loader::testing::{FakeTransport, signed_in_scope};
    use crate::model::{PageResult, UserItem};

    fn loader(transport: &Arc<FakeTransport>) -> (Loader, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let loader = Loader::new(transport.clone(), store.clone(), 20);
        (loader, store)
    }

    #[tokio::test]
    async fn test_cache_first() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        let cached = CacheEntry::new(PageResult {
            items: vec![UserItem {
                user_id: "cached".to_string(),
                ..Default::default()
            }],
            total: 1,
            page: 1,
        });
        cache::write_entry(&*store, "users_cache_v1_page_1", &cached).unwrap();

        let entry = loader.load::<Users>(&scope, Some(1), false).await.unwrap();
        assert_eq!(entry, cached);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_load_served_from_cache() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Dashboard);

        let first = loader.load::<Dashboard>(&scope, None, false).await.unwrap();
        let second = loader.load::<Dashboard>(&scope, None, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_overwrites_entry() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        let mut stale = CacheEntry::new(PageResult::<UserItem>::empty(1));
        stale.fetched_at = Utc::now() - chrono::Duration::hours(1);
        cache::write_entry(&*store, "users_cache_v1_page_1", &stale).unwrap();

        let fresh = loader.load::<Users>(&scope, Some(1), true).await.unwrap();
        assert_eq!(transport.calls(), 1);
        assert!(fresh.fetched_at > stale.fetched_at);
        assert_eq!(fresh.payload.items[0].user_id, "u-1-0");

        let stored = loader.cached::<Users>(Some(1)).unwrap();
        assert_eq!(stored, fresh);
    }

    #[tokio::test]
    async fn test_concurrent_singleton_loads_dedupe() {
        let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_millis(30)));
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Dashboard);

        let (a, b) = tokio::join!(
            loader.load::<Dashboard>(&scope, None, false),
            loader.load::<Dashboard>(&scope, None, false),
        );

        assert_eq!(transport.calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_paged_loads_dedupe_per_page() {
        let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_millis(30)));
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        let (a, b, c) = tokio::join!(
            loader.load::<Users>(&scope, Some(1), false),
            loader.load::<Users>(&scope, Some(1), true),
            loader.load::<Users>(&scope, Some(2), false),
        );

        assert_eq!(transport.calls(), 2);
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(c.unwrap().payload.page, 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_a_miss() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);
        store.set("users_cache_v1_page_1", "<<not json>>").unwrap();

        let entry = loader.load::<Users>(&scope, Some(1), false).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(entry.payload.items.len(), 2);
        assert!(loader.cached::<Users>(Some(1)).is_some());
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, store) = loader(&transport);
        let scope = signed_in_scope(Route::Dashboard);

        let before = CacheEntry::new(crate::model::DashboardMetrics::default());
        cache::write_entry(&*store, "dashboard_cache_v1", &before).unwrap();
        transport.fail_with_status(503);

        let err = loader.load::<Dashboard>(&scope, None, true).await.unwrap_err();
        assert!(matches!(err, LoadError::Server { status: 503, .. }));
        assert_eq!(loader.cached::<Dashboard>(None), Some(before));
    }

    #[tokio::test]
    async fn test_auth_failure_is_classified() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);
        transport.fail_with_status(401);

        let err = loader.load::<Users>(&scope, Some(1), false).await.unwrap_err();
        assert!(matches!(err, LoadError::Auth { status: 401, .. }));
        assert!(loader.cached::<Users>(Some(1)).is_none());
    }

    #[tokio::test]
    async fn test_users_end_to_end() {
        let transport = Arc::new(FakeTransport::new().respond(
            "/api/admin/users",
            json!({
                "success": true,
                "data": {
                    "items": [{ "id": "u1", "email": "a@x.com", "created_at": "2024-01-01T00:00:00Z" }],
                    "total": 1
                }
            }),
        ));
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        let entry = loader.load::<Users>(&scope, Some(1), false).await.unwrap();
        let page = entry.payload;

        assert_eq!(page.total, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].user_id, "u1");
        assert_eq!(page.items[0].email, "a@x.com");
        assert_eq!(page.items[0].created_at, "2024-01-01T00:00:00Z");
        assert!(!page.items[0].is_verified);
    }

    #[tokio::test]
    async fn test_malformed_response_is_empty_page() {
        let transport = Arc::new(FakeTransport::new().respond("/api/admin/users", json!("oops")));
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        let entry = loader.load::<Users>(&scope, Some(4), false).await.unwrap();
        assert_eq!(entry.payload, PageResult::empty(4));
    }

    #[tokio::test]
    async fn test_cancelled_scope_never_fetches() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);
        scope.cancel();

        let err = loader.load::<Users>(&scope, Some(1), false).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_teardown_drops_pending_result() {
        let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_millis(50)));
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Dashboard);

        let (result, ()) = tokio::join!(loader.load::<Dashboard>(&scope, None, false), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            scope.cancel();
        });

        assert_eq!(result.unwrap_err(), LoadError::Cancelled);
    }

    #[tokio::test]
    async fn test_refresh_drops_other_pages() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        loader.load::<Users>(&scope, Some(1), false).await.unwrap();
        loader.load::<Users>(&scope, Some(2), false).await.unwrap();

        loader.refresh::<Users>(&scope, Some(1)).await.unwrap();

        assert!(loader.cached::<Users>(Some(1)).is_some());
        assert!(loader.cached::<Users>(Some(2)).is_none());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache() {
        let transport = Arc::new(FakeTransport::new());
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Users);

        let page_1 = loader.load::<Users>(&scope, Some(1), false).await.unwrap();
        let page_2 = loader.load::<Users>(&scope, Some(2), false).await.unwrap();
        transport.fail_with_status(503);

        let err = loader.refresh::<Users>(&scope, Some(1)).await.unwrap_err();

        assert!(matches!(err, LoadError::Server { status: 503, .. }));
        assert_eq!(loader.cached::<Users>(Some(1)), Some(page_1));
        assert_eq!(loader.cached::<Users>(Some(2)), Some(page_2));
    }

    /// Misses the first read of every key, then behaves like the inner store.
    #[derive(Default)]
    struct LateStore {
        inner: MemoryStore,
        seen: std::sync::Mutex<std::collections::HashSet<String>>,
    }

    impl CacheStore for LateStore {
        fn get(&self, key: &str) -> Option<String> {
            if self.seen.lock().unwrap().insert(key.to_string()) {
                return None;
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> crate::error::Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> crate::error::Result<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Vec<String> {
            self.inner.keys()
        }
    }

    #[tokio::test]
    async fn test_leader_serves_entry_written_after_first_read() {
        let transport = Arc::new(FakeTransport::new());
        let store = Arc::new(LateStore::default());
        let cached = CacheEntry::new(crate::model::DashboardMetrics::default());
        cache::write_entry(&*store, "dashboard_cache_v1", &cached).unwrap();
        let loader = Loader::new(transport.clone(), store, 20);
        let scope = signed_in_scope(Route::Dashboard);

        let entry = loader.load::<Dashboard>(&scope, None, false).await.unwrap();

        assert_eq!(entry, cached);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_analytics_bundles_four_requests() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(
                    "/api/admin/analytics/overview",
                    json!({ "data": { "averages": { "distanceMeters": 1500 } } }),
                )
                .respond(
                    "/api/admin/analytics/heatmap",
                    json!({ "data": [{ "lat": 1, "lng": 2, "count": 3 }] }),
                ),
        );
        let (loader, _store) = loader(&transport);
        let scope = signed_in_scope(Route::Analytics);

        let entry = loader.load::<Analytics>(&scope, None, false).await.unwrap();

        assert_eq!(transport.calls(), 4);
        assert_eq!(entry.payload.avg_distance_km(), "1.50");
        assert_eq!(entry.payload.heatmap.len(), 1);
        assert!(loader.cached::<Analytics>(None).is_some());
    }
}
