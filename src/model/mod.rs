// Canonical data model for admin API resources.
// Normalizes raw JSON into fixed local shapes at a single boundary.

pub mod analytics;
pub mod dashboard;
pub mod guests;
pub mod normalize;
pub mod trips;
pub mod users;

pub use analytics::{AnalyticsSnapshot, GuestPoint, HeatPoint, Overview, PermissionGroup, PermissionRow};
pub use dashboard::DashboardMetrics;
pub use guests::Visit;
pub use normalize::{FieldAlias, PageResult, Record, normalize_page, total_pages};
pub use trips::TripItem;
pub use users::UserItem;

/// Client-side, case-insensitive search over a list item.
pub trait Searchable {
    fn matches_query(&self, query: &str) -> bool;
}
