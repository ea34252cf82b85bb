// View state module.
// Holds per-view list and dashboard state fed by the loader.

pub mod dashboard;
pub mod list;

pub use dashboard::{DashboardView, MetricCard};
pub use list::{ListView, Ticket};
