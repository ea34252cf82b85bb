// Runtime configuration.
// Reads API base URL, page size, timeout, and cache location from the environment.

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::cache::keys;
use crate::error::{AdminError, Result};

pub const DEFAULT_BASE_URL: &str = "https://sanchara-api1.sreecharandesu.in";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream API, without a trailing slash.
    pub base_url: String,
    /// Items requested per page for list resources.
    pub page_limit: u32,
    pub request_timeout: Duration,
    pub cache_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let base_url: String = try_load("SANCHARA_API_BASE_URL", DEFAULT_BASE_URL)?;
        let page_limit: u32 = try_load("SANCHARA_PAGE_LIMIT", &DEFAULT_PAGE_LIMIT.to_string())?;
        let timeout_secs: u64 =
            try_load("SANCHARA_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())?;

        let cache_dir = match var("SANCHARA_CACHE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => keys::cache_dir().ok_or(AdminError::NoCacheDir)?,
        };

        Self::new(base_url, page_limit, Duration::from_secs(timeout_secs), cache_dir)
    }

    pub fn new(
        base_url: impl Into<String>,
        page_limit: u32,
        request_timeout: Duration,
        cache_dir: PathBuf,
    ) -> Result<Self> {
        if page_limit == 0 {
            return Err(AdminError::Config {
                key: "SANCHARA_PAGE_LIMIT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AdminError::Config {
                key: "SANCHARA_API_BASE_URL".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            base_url,
            page_limit,
            request_timeout,
            cache_dir,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        AdminError::Config {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}
