// Cache store for reading and writing cached data.
// Handles JSON serialization of cache entries and the string-keyed store backends.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::error::Result;

use super::keys;

/// Wrapper for cached data with metadata.
///
/// Entries never expire by age; they are replaced by a forced refresh or
/// removed by invalidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The cached payload.
    pub payload: T,
    /// When the payload was fetched from the server.
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Create a new entry stamped with the current time.
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
        }
    }
}

/// A persistent string-keyed, string-valued store.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Vec<String>;
}

/// Read a cache entry. Missing and unparsable entries are both misses.
pub fn read_entry<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<CacheEntry<T>> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!(key, error = %e, "corrupt cache entry treated as miss");
            None
        }
    }
}

/// Write a cache entry as JSON.
pub fn write_entry<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    entry: &CacheEntry<T>,
) -> Result<()> {
    let json = serde_json::to_string(entry)?;
    store.set(key, &json)
}

/// Remove every entry belonging to a resource. Never fails; store errors are logged.
pub fn invalidate_resource(store: &dyn CacheStore, resource: &str) -> usize {
    remove_entries(store, resource, None)
}

/// Remove every entry of a resource except `keep`.
pub fn invalidate_resource_except(store: &dyn CacheStore, resource: &str, keep: &str) -> usize {
    remove_entries(store, resource, Some(keep))
}

fn remove_entries(store: &dyn CacheStore, resource: &str, keep: Option<&str>) -> usize {
    let mut removed = 0;
    for key in store.keys() {
        if !keys::belongs_to(&key, resource) || keep == Some(key.as_str()) {
            continue;
        }
        match store.remove(&key) {
            Ok(()) => removed += 1,
            Err(e) => warn!(key, error = %e, "failed to remove cache entry"),
        }
    }
    debug!(resource, removed, "invalidated cache entries");
    removed
}

/// Store backed by one JSON file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", keys::sanitize_name(key)))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write atomically via temp file
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect()
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_and_read_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_entry(&store, "users_cache_v1_page_1", &CacheEntry::new(data.clone())).unwrap();

        let cached: Option<CacheEntry<TestData>> = read_entry(&store, "users_cache_v1_page_1");
        assert_eq!(cached.unwrap().payload, data);
    }

    #[test]
    fn test_entry_serializes_fetched_at_camel_case() {
        let entry = CacheEntry::new(1);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("fetchedAt").is_some());
        assert_eq!(json["payload"], 1);
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let store = MemoryStore::new();
        store.set("dashboard_cache_v1", "not json{").unwrap();

        let cached: Option<CacheEntry<TestData>> = read_entry(&store, "dashboard_cache_v1");
        assert!(cached.is_none());
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("missing"));

        let cached: Option<CacheEntry<TestData>> = read_entry(&store, "nothing");
        assert!(cached.is_none());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_file_store_keys_skip_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.set("users_cache_v1_page_1", "{}").unwrap();
        fs::write(temp_dir.path().join("stray.tmp"), "x").unwrap();

        assert_eq!(store.keys(), vec!["users_cache_v1_page_1".to_string()]);
    }

    #[test]
    fn test_invalidate_resource_removes_all_pages() {
        let store = MemoryStore::new();
        store.set("users_cache_v1_page_1", "{}").unwrap();
        store.set("users_cache_v1_page_2", "{}").unwrap();
        store.set("guests_cache_v1_page_1", "{}").unwrap();

        assert_eq!(invalidate_resource(&store, "users"), 2);

        assert_eq!(store.keys(), vec!["guests_cache_v1_page_1".to_string()]);
    }

    #[test]
    fn test_invalidate_resource_except_keeps_one_page() {
        let store = MemoryStore::new();
        store.set("trips_cache_v1_page_1", "{}").unwrap();
        store.set("trips_cache_v1_page_2", "{}").unwrap();
        store.set("trips_cache_v1_page_3", "{}").unwrap();

        assert_eq!(invalidate_resource_except(&store, "trips", "trips_cache_v1_page_2"), 2);

        assert_eq!(store.keys(), vec!["trips_cache_v1_page_2".to_string()]);
    }
}
