// Sanchara admin console library.
// Cached resource loading, admin auth, and chart classification for the admin API.

pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod model;
pub mod state;

pub use error::{AdminError, LoadError, Result};
