// Response normalization.
// Maps loosely shaped admin API JSON onto canonical records through alias tables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Maximum number of `data` wrappers descended when unwrapping an envelope.
const MAX_ENVELOPE_DEPTH: usize = 2;

/// Source fields accepted for one canonical field, in priority order.
///
/// The admin API mixes field names (`id` vs `_id`, `createdAt` vs
/// `created_at`) and envelopes (`data` vs `data.data`). Each resource declares
/// an alias table, raw JSON is mapped through it once, and missing fields fall
/// back to defaults instead of failing.
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub field: &'static str,
    pub sources: &'static [&'static str],
}

impl FieldAlias {
    pub const fn new(field: &'static str, sources: &'static [&'static str]) -> Self {
        Self { field, sources }
    }
}

/// A list item that can be built from a raw JSON object.
pub trait Record: Sized {
    /// Alias table mapping canonical fields to accepted source fields.
    const ALIASES: &'static [FieldAlias];
    /// Field names under which the server may return the item list.
    const LIST_FIELDS: &'static [&'static str];

    fn from_raw(raw: &Fields<'_>) -> Self;
}

/// Alias-aware view over a raw JSON object.
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
    aliases: &'static [FieldAlias],
}

impl<'a> Fields<'a> {
    pub fn new(object: &'a Map<String, Value>, aliases: &'static [FieldAlias]) -> Self {
        Self { object, aliases }
    }

    /// First non-null source value for a canonical field.
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        let alias = self.aliases.iter().find(|a| a.field == field)?;
        alias
            .sources
            .iter()
            .filter_map(|key| self.object.get(*key))
            .find(|v| !v.is_null())
    }

    /// Text value; numbers are rendered as text.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(as_text)
    }

    pub fn text_or(&self, field: &str, default: &str) -> String {
        self.text(field).unwrap_or_else(|| default.to_string())
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(as_number)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }
}

/// Render a scalar as text. Objects, arrays, booleans, and null yield `None`.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a number, accepting numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
        _ => None,
    }
}

/// Non-negative integer count, defaulting to zero.
pub fn as_count(value: Option<&Value>) -> u64 {
    value
        .and_then(as_number)
        .filter(|n| *n > 0.0)
        .map(|n| n as u64)
        .unwrap_or(0)
}

/// The value itself followed by its nested `data` payloads.
pub fn envelope_levels(value: &Value) -> Vec<&Value> {
    let mut levels = vec![value];
    let mut current = value;
    for _ in 0..MAX_ENVELOPE_DEPTH {
        match current.get("data") {
            Some(inner) if inner.is_object() || inner.is_array() => {
                levels.push(inner);
                current = inner;
            }
            _ => break,
        }
    }
    levels
}

/// Innermost payload of a `{ data: { data: ... } }` envelope.
pub fn unwrap_envelope(value: &Value) -> &Value {
    envelope_levels(value).last().copied().unwrap_or(value)
}

/// One page of a paged resource in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
        }
    }
}

impl<T> PageResult<T> {
    /// Empty result for a page, used when the response shape is unrecognised.
    pub fn empty(page: u32) -> Self {
        Self {
            page: page.max(1),
            ..Self::default()
        }
    }

    pub fn total_pages(&self, limit: u32) -> u32 {
        total_pages(self.total, limit)
    }
}

/// Number of pages needed for `total` items, never less than one.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    total.div_ceil(limit).max(1).min(u64::from(u32::MAX)) as u32
}

/// Normalize a raw list response into a [`PageResult`].
///
/// Unrecognised shapes produce an empty page rather than an error.
pub fn normalize_page<T: Record>(raw: &Value, requested_page: u32, limit: u32) -> PageResult<T> {
    let requested_page = requested_page.max(1);

    let found = envelope_levels(raw).into_iter().find_map(|level| {
        let object = level.as_object()?;
        T::LIST_FIELDS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))
            .map(|items| (object, items))
    });

    let Some((container, items)) = found else {
        debug!("unrecognised list response, normalizing to empty page");
        return PageResult::empty(requested_page);
    };

    let mut records: Vec<T> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|object| T::from_raw(&Fields::new(object, T::ALIASES)))
        .collect();
    records.truncate(limit.max(1) as usize);

    let total = as_count(container.get("total").or_else(|| container.get("totalCount")));
    let page = container
        .get("page")
        .and_then(as_number)
        .filter(|p| *p >= 1.0)
        .map(|p| p.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(requested_page);

    PageResult {
        items: records,
        total,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Thing {
        id: String,
        size: f64,
    }

    impl Record for Thing {
        const ALIASES: &'static [FieldAlias] = &[
            FieldAlias::new("id", &["id", "_id"]),
            FieldAlias::new("size", &["size", "bytes"]),
        ];
        const LIST_FIELDS: &'static [&'static str] = &["items", "things"];

        fn from_raw(raw: &Fields<'_>) -> Self {
            Self {
                id: raw.text_or("id", ""),
                size: raw.number("size").unwrap_or(0.0),
            }
        }
    }

    #[test]
    fn test_alias_priority_skips_null() {
        let object = json!({ "id": null, "_id": 7 });
        let fields = Fields::new(object.as_object().unwrap(), Thing::ALIASES);
        assert_eq!(fields.text("id").as_deref(), Some("7"));
    }

    #[test]
    fn test_double_wrapped_envelope() {
        let raw = json!({ "data": { "data": { "things": [{ "_id": "a", "bytes": "12" }], "totalCount": 5 } } });
        let page: PageResult<Thing> = normalize_page(&raw, 2, 20);
        assert_eq!(page.items, vec![Thing { id: "a".into(), size: 12.0 }]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
    }

    #[test]
    fn test_malformed_is_empty() {
        for raw in [json!(null), json!("oops"), json!({ "data": { "nothing": true } })] {
            let page: PageResult<Thing> = normalize_page(&raw, 3, 20);
            assert_eq!(page, PageResult::empty(3));
        }
    }

    #[test]
    fn test_items_truncated_to_limit_and_counts_clamped() {
        let raw = json!({ "items": [{ "id": 1 }, { "id": 2 }, { "id": 3 }], "total": -4, "page": 0 });
        let page: PageResult<Thing> = normalize_page(&raw, 1, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}
