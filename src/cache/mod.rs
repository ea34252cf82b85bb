// Cache module for persistent response caching.
// Stores normalized API payloads so views can render instantly before a refresh.

pub mod keys;
pub mod store;

pub use store::{
    CacheEntry, CacheStore, FileStore, MemoryStore, invalidate_resource,
    invalidate_resource_except, read_entry, write_entry,
};
