// Analytics snapshot.
// Overview averages, permission stats, guest visit series, and heatmap points.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::normalize::{FieldAlias, Fields, as_count, as_number, as_text, unwrap_envelope};

const PERMISSION_ALIASES: &[FieldAlias] = &[
    FieldAlias::new("permission", &["permission", "type"]),
    FieldAlias::new("status", &["status", "state"]),
    FieldAlias::new("count", &["count"]),
];

const HEAT_ALIASES: &[FieldAlias] = &[
    FieldAlias::new("latitude", &["lat", "latitude"]),
    FieldAlias::new("longitude", &["lng", "longitude"]),
    FieldAlias::new("weight", &["count", "weight"]),
];

/// Averages and series from the overview endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
    /// Trip series as returned by the server; classify it to chart it.
    pub timeseries_trips: Value,
    pub timeseries_active: Value,
}

impl Overview {
    pub fn from_raw(raw: &Value) -> Self {
        let body = unwrap_envelope(raw);
        let section = |name: &str| {
            body.get(name)
                .or_else(|| body.get("data").and_then(|d| d.get(name)))
                .cloned()
                .unwrap_or(Value::Null)
        };
        let averages = section("averages");
        let timeseries = section("timeseries");

        Self {
            distance_meters: averages.get("distanceMeters").and_then(as_number),
            duration_seconds: averages.get("durationSeconds").and_then(as_number),
            timeseries_trips: timeseries.get("trips").cloned().unwrap_or_else(|| json!([])),
            timeseries_active: timeseries
                .get("activeUsers")
                .cloned()
                .unwrap_or_else(|| json!([])),
        }
    }
}

/// Count of grants or denials of one device permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRow {
    pub permission: String,
    pub status: String,
    pub count: u64,
}

/// Granted and denied totals for one permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGroup {
    pub permission: String,
    pub granted: u64,
    pub denied: u64,
}

/// Guest visits at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestPoint {
    pub time: String,
    pub count: u64,
}

/// A weighted location sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
}

impl HeatPoint {
    pub fn label(&self) -> String {
        format!("{:.3}, {:.3}", self.latitude, self.longitude)
    }
}

/// Normalized analytics bundle cached as one entry.
///
/// The four endpoint responses are fetched together. Each part is normalized
/// on its own, so one malformed response empties only its section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub overview: Overview,
    pub permissions: Vec<PermissionRow>,
    pub guest_series: Vec<GuestPoint>,
    pub heatmap: Vec<HeatPoint>,
}

impl AnalyticsSnapshot {
    /// Build from the four raw endpoint responses.
    pub fn from_parts(overview: &Value, permissions: &Value, guests: &Value, heatmap: &Value) -> Self {
        Self {
            overview: Overview::from_raw(overview),
            permissions: objects(permissions).map(permission_row).collect(),
            guest_series: objects(guests).map(guest_point).collect(),
            heatmap: objects(heatmap).map(heat_point).collect(),
        }
    }

    /// Permission rows grouped by permission, in first-seen order.
    pub fn permission_groups(&self) -> Vec<PermissionGroup> {
        let mut groups: Vec<PermissionGroup> = Vec::new();
        for row in &self.permissions {
            let index = match groups.iter().position(|g| g.permission == row.permission) {
                Some(index) => index,
                None => {
                    groups.push(PermissionGroup {
                        permission: row.permission.clone(),
                        granted: 0,
                        denied: 0,
                    });
                    groups.len() - 1
                }
            };
            if row.status.eq_ignore_ascii_case("granted") {
                groups[index].granted += row.count;
            } else {
                groups[index].denied += row.count;
            }
        }
        groups
    }

    pub fn total_visits(&self) -> u64 {
        self.guest_series.iter().map(|p| p.count).sum()
    }

    /// Average trip distance in km with two decimals, or `-` when unknown.
    pub fn avg_distance_km(&self) -> String {
        match self.overview.distance_meters {
            Some(meters) if meters != 0.0 => format!("{:.2}", meters / 1000.0),
            _ => "-".to_string(),
        }
    }

    /// Average trip duration in whole minutes, or `-` when unknown.
    pub fn avg_duration_minutes(&self) -> String {
        match self.overview.duration_seconds {
            Some(seconds) if seconds != 0.0 => format!("{}", (seconds / 60.0).round() as i64),
            _ => "-".to_string(),
        }
    }

    /// The `n` heaviest heatmap points, heaviest first.
    pub fn top_heat_points(&self, n: usize) -> Vec<&HeatPoint> {
        let mut points: Vec<&HeatPoint> = self.heatmap.iter().collect();
        points.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        points.truncate(n);
        points
    }

    /// The last `n` points of the guest series, oldest first.
    pub fn recent_points(&self, n: usize) -> &[GuestPoint] {
        let start = self.guest_series.len().saturating_sub(n);
        &self.guest_series[start..]
    }
}

/// Objects of the array inside a response envelope; anything else yields nothing.
fn objects(raw: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    unwrap_envelope(raw)
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn permission_row(object: &Map<String, Value>) -> PermissionRow {
    let fields = Fields::new(object, PERMISSION_ALIASES);
    PermissionRow {
        permission: fields.text_or("permission", "UNKNOWN"),
        status: fields.text_or("status", "unknown"),
        count: as_count(fields.get("count")),
    }
}

fn guest_point(object: &Map<String, Value>) -> GuestPoint {
    let time = ["day", "time", "date"]
        .iter()
        .find_map(|key| object.get(*key).and_then(as_text))
        .unwrap_or_default();
    let count = as_count(object.get("visits").or_else(|| object.get("count")));
    GuestPoint { time, count }
}

fn heat_point(object: &Map<String, Value>) -> HeatPoint {
    let fields = Fields::new(object, HEAT_ALIASES);
    HeatPoint {
        latitude: fields.number("latitude").unwrap_or(0.0),
        longitude: fields.number("longitude").unwrap_or(0.0),
        weight: fields.number("weight").unwrap_or(0.0),
    }
}
