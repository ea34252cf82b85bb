// Dashboard metrics payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::normalize::envelope_levels;

/// Opaque metrics mapping shown as dashboard cards, in server order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub metrics: Map<String, Value>,
}

impl DashboardMetrics {
    /// Read `metrics` from the response envelope. A missing mapping yields no metrics.
    pub fn from_raw(raw: &Value) -> Self {
        let metrics = envelope_levels(raw)
            .into_iter()
            .find_map(|level| level.get("metrics").and_then(Value::as_object))
            .cloned()
            .unwrap_or_default();
        Self { metrics }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}
