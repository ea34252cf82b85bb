// Trip records for the analytics trips listing and detail views.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::{FieldAlias, Fields, Record, unwrap_envelope};

/// A trip recorded by a platform user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripItem {
    pub trip_id: String,
    pub user_id: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub status: String,
    pub started_at: String,
}

impl Record for TripItem {
    const ALIASES: &'static [FieldAlias] = &[
        FieldAlias::new("tripId", &["id", "tripId", "_id"]),
        FieldAlias::new("userId", &["userId", "user_id"]),
        FieldAlias::new(
            "distanceMeters",
            &["distanceMeters", "distance_meters", "distance"],
        ),
        FieldAlias::new(
            "durationSeconds",
            &["durationSeconds", "duration_seconds", "duration"],
        ),
        FieldAlias::new("status", &["status", "state"]),
        FieldAlias::new(
            "startedAt",
            &["startedAt", "started_at", "createdAt", "created_at"],
        ),
    ];
    const LIST_FIELDS: &'static [&'static str] = &["items", "trips"];

    fn from_raw(raw: &Fields<'_>) -> Self {
        Self {
            trip_id: raw.text_or("tripId", ""),
            user_id: raw.text_or("userId", ""),
            distance_meters: raw.number("distanceMeters").unwrap_or(0.0),
            duration_seconds: raw.number("durationSeconds").unwrap_or(0.0),
            status: raw.text_or("status", ""),
            started_at: raw.text_or("startedAt", ""),
        }
    }
}

impl TripItem {
    /// Normalize a trip detail response. Returns `None` when no trip object is present.
    pub fn from_detail(raw: &Value) -> Option<Self> {
        let payload = unwrap_envelope(raw);
        let object = payload
            .get("trip")
            .and_then(Value::as_object)
            .or_else(|| payload.as_object())?;
        Some(Self::from_raw(&Fields::new(object, Self::ALIASES)))
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.duration_seconds / 60.0).round() as i64
    }
}
