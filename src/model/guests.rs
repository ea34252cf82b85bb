// Guest visit records.

use serde::{Deserialize, Serialize};

use super::Searchable;
use super::normalize::{FieldAlias, Fields, Record};

/// A recorded visit by an unauthenticated guest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub visit_id: String,
    pub ip_address: String,
    pub visit_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Record for Visit {
    const ALIASES: &'static [FieldAlias] = &[
        FieldAlias::new("visitId", &["id", "visitId", "_id"]),
        FieldAlias::new("ipAddress", &["ip_address", "ipAddress", "ip"]),
        FieldAlias::new("visitTime", &["created_at", "createdAt", "visitTime"]),
        FieldAlias::new("platform", &["platform"]),
        FieldAlias::new("userAgent", &["user_agent", "userAgent"]),
    ];
    const LIST_FIELDS: &'static [&'static str] = &["items", "visits"];

    fn from_raw(raw: &Fields<'_>) -> Self {
        Self {
            visit_id: raw.text_or("visitId", ""),
            ip_address: raw.text_or("ipAddress", "-"),
            visit_time: raw.text_or("visitTime", ""),
            platform: raw.text("platform"),
            user_agent: raw.text("userAgent"),
        }
    }
}

impl Searchable for Visit {
    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.ip_address.to_lowercase().contains(&query)
            || self.visit_id.to_lowercase().contains(&query)
    }
}
