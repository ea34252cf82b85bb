// Cacheable admin resources.
// Binds each resource name to its endpoint requests and its normalization.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::api::Transport;
use crate::api::endpoints;
use crate::error::Result;
use crate::model::{
    AnalyticsSnapshot, DashboardMetrics, PageResult, TripItem, UserItem, Visit, normalize_page,
};

/// A data source the loader can fetch, normalize, and cache.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Payload: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;

    /// Stable resource key used to derive cache keys.
    const NAME: &'static str;
    /// Whether the resource is fetched page by page.
    const PAGED: bool;

    /// Fetch the raw response. `page` is `Some` exactly when the resource is paged.
    async fn fetch(transport: &dyn Transport, page: Option<u32>, limit: u32) -> Result<Value>;

    /// Coalesce a raw response into the canonical payload. Never fails.
    fn normalize(raw: &Value, page: Option<u32>, limit: u32) -> Self::Payload;
}

async fn fetch_page(
    transport: &dyn Transport,
    path: &str,
    page: Option<u32>,
    limit: u32,
) -> Result<Value> {
    let query = endpoints::page_query(page.unwrap_or(1), limit);
    transport.get_json(path, &query).await
}

/// Paginated platform users.
pub struct Users;

#[async_trait]
impl Resource for Users {
    type Payload = PageResult<UserItem>;
    const NAME: &'static str = "users";
    const PAGED: bool = true;

    async fn fetch(transport: &dyn Transport, page: Option<u32>, limit: u32) -> Result<Value> {
        fetch_page(transport, endpoints::USERS, page, limit).await
    }

    fn normalize(raw: &Value, page: Option<u32>, limit: u32) -> Self::Payload {
        normalize_page(raw, page.unwrap_or(1), limit)
    }
}

/// Paginated guest visits.
pub struct Guests;

#[async_trait]
impl Resource for Guests {
    type Payload = PageResult<Visit>;
    const NAME: &'static str = "guests";
    const PAGED: bool = true;

    async fn fetch(transport: &dyn Transport, page: Option<u32>, limit: u32) -> Result<Value> {
        fetch_page(transport, endpoints::GUESTS, page, limit).await
    }

    fn normalize(raw: &Value, page: Option<u32>, limit: u32) -> Self::Payload {
        normalize_page(raw, page.unwrap_or(1), limit)
    }
}

/// Paginated trips.
pub struct Trips;

#[async_trait]
impl Resource for Trips {
    type Payload = PageResult<TripItem>;
    const NAME: &'static str = "trips";
    const PAGED: bool = true;

    async fn fetch(transport: &dyn Transport, page: Option<u32>, limit: u32) -> Result<Value> {
        fetch_page(transport, endpoints::TRIPS, page, limit).await
    }

    fn normalize(raw: &Value, page: Option<u32>, limit: u32) -> Self::Payload {
        normalize_page(raw, page.unwrap_or(1), limit)
    }
}

/// Dashboard metrics (singleton).
pub struct Dashboard;

#[async_trait]
impl Resource for Dashboard {
    type Payload = DashboardMetrics;
    const NAME: &'static str = "dashboard";
    const PAGED: bool = false;

    async fn fetch(transport: &dyn Transport, _page: Option<u32>, _limit: u32) -> Result<Value> {
        transport.get_json(endpoints::DASHBOARD, &[]).await
    }

    fn normalize(raw: &Value, _page: Option<u32>, _limit: u32) -> Self::Payload {
        DashboardMetrics::from_raw(raw)
    }
}

/// Analytics snapshot (singleton), assembled from four endpoints fetched together.
pub struct Analytics;

#[async_trait]
impl Resource for Analytics {
    type Payload = AnalyticsSnapshot;
    const NAME: &'static str = "analytics";
    const PAGED: bool = false;

    async fn fetch(transport: &dyn Transport, _page: Option<u32>, _limit: u32) -> Result<Value> {
        let interval = [("interval".to_string(), "day".to_string())];
        let (overview, permissions, guests, heatmap) = tokio::try_join!(
            transport.get_json(endpoints::ANALYTICS_OVERVIEW, &[]),
            transport.get_json(endpoints::PERMISSIONS, &[]),
            transport.get_json(endpoints::GUEST_TIMESERIES, &interval),
            transport.get_json(endpoints::HEATMAP, &[]),
        )?;
        Ok(json!({
            "overview": overview,
            "permissions": permissions,
            "guests": guests,
            "heatmap": heatmap,
        }))
    }

    fn normalize(raw: &Value, _page: Option<u32>, _limit: u32) -> Self::Payload {
        AnalyticsSnapshot::from_parts(
            &raw["overview"],
            &raw["permissions"],
            &raw["guests"],
            &raw["heatmap"],
        )
    }
}
