// Admin API module.
// Provides the HTTP client, endpoint paths, and auth types for the Sanchara admin REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{AdminClient, Query, Transport};
pub use types::*;
