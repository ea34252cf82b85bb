// Resource loading module.
// Cache-first loads with per-key request dedup, scoped to mounted views.

pub mod cached;
pub mod inflight;
pub mod resource;
pub mod scope;

pub use cached::{LoadResult, Loader};
pub use inflight::InFlight;
pub use resource::{Analytics, Dashboard, Guests, Resource, Trips, Users};
pub use scope::ViewScope;
