// Cache key utilities.
// Derives deterministic store keys from resource names and page numbers.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Version suffix baked into every cache key.
const CACHE_VERSION: &str = "cache_v1";

/// Key under which the signed-in session is persisted.
pub const AUTH_KEY: &str = "sanchara_admin_auth";

/// Get the base cache directory (~/.cache/sanchara-admin on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sanchara-admin").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Prefix shared by every cache key of a resource.
pub fn resource_prefix(resource: &str) -> String {
    format!("{}_{}", resource, CACHE_VERSION)
}

/// Key for a singleton resource, or one page of a paged resource.
pub fn cache_key(resource: &str, page: Option<u32>) -> String {
    match page {
        Some(page) => format!("{}_page_{}", resource_prefix(resource), page),
        None => resource_prefix(resource),
    }
}

/// Check whether a key belongs to the given resource.
pub fn belongs_to(key: &str, resource: &str) -> bool {
    let prefix = resource_prefix(resource);
    match key.strip_prefix(&prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("_page_"),
        None => false,
    }
}

/// Sanitize a key for use as a file name.
/// Replaces problematic characters with underscores.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
