// Chart-shape classification.
// Decides how an untyped dashboard metric value should be drawn.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::model::normalize::as_text;

/// Largest number of distinct labels still drawn as a donut.
pub const MAX_DONUT_LABELS: usize = 6;

/// Entries listed per recent-activity section.
pub const RECENT_ENTRIES: usize = 5;

const HUE_STEP: u16 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Doughnut,
}

/// A colour in HSL space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
    pub alpha: f32,
}

impl Hsl {
    /// Colour for the `index`-th segment of a labelled series.
    pub fn rotation(index: usize) -> Self {
        Self {
            hue: ((index as u64 * u64::from(HUE_STEP)) % 360) as u16,
            saturation: 60,
            lightness: 35,
            alpha: 0.9,
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({} {}% {}% / {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

/// A single data series ready to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    /// Per-segment colours; empty means the renderer's default colour.
    pub colors: Vec<Hsl>,
}

/// One row of a recent-activity section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub title: String,
    pub role: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySection {
    pub title: String,
    pub entries: Vec<ActivityEntry>,
}

/// How a metric value should be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartDirective {
    Chart(Series),
    RecentActivity(Vec<ActivitySection>),
    Scalar(String),
}

/// Classify a raw metric value by its runtime shape.
///
/// Rules are tried in order:
/// 1. non-empty mapping of numbers: bar series over the keys
/// 2. non-empty sequence of numbers: line series with 1-based x labels
/// 3. non-empty sequence of `{label, value}` objects: donut when there are
///    at most [`MAX_DONUT_LABELS`] distinct labels, otherwise bar
/// 4. non-empty mapping of sequences: grouped "recent activity" list
/// 5. anything else: scalar text
pub fn classify(value: &Value) -> ChartDirective {
    if let Some(series) = numeric_mapping(value)
        .or_else(|| numeric_sequence(value))
        .or_else(|| labelled_sequence(value))
    {
        return ChartDirective::Chart(series);
    }
    if let Some(sections) = activity_mapping(value) {
        return ChartDirective::RecentActivity(sections);
    }
    ChartDirective::Scalar(scalar_text(value))
}

fn non_empty_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object().filter(|m| !m.is_empty())
}

fn non_empty_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array().filter(|a| !a.is_empty())
}

fn numeric_mapping(value: &Value) -> Option<Series> {
    let object = non_empty_object(value)?;
    let data = object
        .values()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()?;
    Some(Series {
        kind: ChartKind::Bar,
        labels: object.keys().cloned().collect(),
        data,
        colors: Vec::new(),
    })
}

fn numeric_sequence(value: &Value) -> Option<Series> {
    let data = non_empty_array(value)?
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()?;
    Some(Series {
        kind: ChartKind::Line,
        labels: (1..=data.len()).map(|i| i.to_string()).collect(),
        data,
        colors: Vec::new(),
    })
}

fn labelled_sequence(value: &Value) -> Option<Series> {
    let pairs = non_empty_array(value)?
        .iter()
        .map(|item| {
            let object = item.as_object()?;
            let value = object.get("value").and_then(Value::as_f64)?;
            Some((segment_label(object), value))
        })
        .collect::<Option<Vec<(String, f64)>>>()?;

    let distinct: HashSet<&str> = pairs.iter().map(|(label, _)| label.as_str()).collect();
    let kind = if distinct.len() <= MAX_DONUT_LABELS {
        ChartKind::Doughnut
    } else {
        ChartKind::Bar
    };

    Some(Series {
        kind,
        colors: (0..pairs.len()).map(Hsl::rotation).collect(),
        labels: pairs.iter().map(|(label, _)| label.clone()).collect(),
        data: pairs.iter().map(|(_, value)| *value).collect(),
    })
}

fn segment_label(object: &Map<String, Value>) -> String {
    first_text(object, &["label", "name", "title"]).unwrap_or_default()
}

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(as_text))
        .find(|s| !s.is_empty())
}

fn activity_mapping(value: &Value) -> Option<Vec<ActivitySection>> {
    let object = non_empty_object(value)?;
    object
        .iter()
        .map(|(title, items)| {
            let items = items.as_array()?;
            Some(ActivitySection {
                title: title.clone(),
                entries: most_recent(items.iter().map(activity_entry).collect()),
            })
        })
        .collect()
}

fn activity_entry(item: &Value) -> ActivityEntry {
    let Some(object) = item.as_object() else {
        return ActivityEntry {
            title: scalar_text(item),
            role: None,
            timestamp: None,
        };
    };
    ActivityEntry {
        title: first_text(object, &["email", "platform", "id"]).unwrap_or_default(),
        role: first_text(object, &["role"]),
        timestamp: first_text(object, &["createdAt", "created_at"]),
    }
}

/// Newest entries first; entries without a parsable timestamp keep their order after them.
fn most_recent(mut entries: Vec<ActivityEntry>) -> Vec<ActivityEntry> {
    let parsed = |entry: &ActivityEntry| -> Option<DateTime<FixedOffset>> {
        entry
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
    };
    entries.sort_by(|a, b| match (parsed(a), parsed(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    entries.truncate(RECENT_ENTRIES);
    entries
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn series(directive: ChartDirective) -> Series {
        match directive {
            ChartDirective::Chart(series) => series,
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_mapping_of_numbers_is_bar() {
        let s = series(classify(&json!({ "a": 1, "b": 2 })));
        assert_eq!(s.kind, ChartKind::Bar);
        assert_eq!(s.labels, ["a", "b"]);
        assert_eq!(s.data, [1.0, 2.0]);
    }

    #[test]
    fn test_sequence_of_numbers_is_line() {
        let s = series(classify(&json!([1, 2, 3])));
        assert_eq!(s.kind, ChartKind::Line);
        assert_eq!(s.labels, ["1", "2", "3"]);
        assert_eq!(s.data, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_labelled_values_is_donut() {
        let s = series(classify(&json!([
            { "label": "x", "value": 5 },
            { "label": "y", "value": 7 }
        ])));
        assert_eq!(s.kind, ChartKind::Doughnut);
        assert_eq!(s.labels, ["x", "y"]);
        assert_eq!(s.data, [5.0, 7.0]);
        assert_eq!(s.colors[1].to_string(), "hsl(48 60% 35% / 0.9)");
    }

    #[test]
    fn test_many_labels_is_bar_with_rotating_hues() {
        let items: Vec<Value> = (0..8)
            .map(|i| json!({ "name": format!("n{i}"), "value": i }))
            .collect();
        let s = series(classify(&Value::Array(items)));
        assert_eq!(s.kind, ChartKind::Bar);
        assert_eq!(s.colors[7].hue, (7 * 48) % 360);
    }

    #[test]
    fn test_repeated_labels_count_once() {
        let items: Vec<Value> = (0..10)
            .map(|i| json!({ "title": if i % 2 == 0 { "even" } else { "odd" }, "value": i }))
            .collect();
        assert_eq!(series(classify(&Value::Array(items))).kind, ChartKind::Doughnut);
    }

    #[test]
    fn test_label_fallbacks() {
        let s = series(classify(&json!([
            { "label": "", "name": "named", "value": 1 },
            { "value": 2 }
        ])));
        assert_eq!(s.labels, ["named", ""]);
    }

    #[test]
    fn test_recent_activity() {
        let directive = classify(&json!({
            "users": [
                { "email": "old@x.com", "createdAt": "2024-01-01T00:00:00Z" },
                { "email": "new@x.com", "created_at": "2024-06-01T00:00:00Z" },
                { "id": 3 }, { "id": 4 }, { "id": 5 }, { "id": 6 }
            ],
            "admins": [{ "email": "root@x.com", "role": "SUPER_ADMIN" }],
            "visits": []
        }));
        let ChartDirective::RecentActivity(sections) = directive else {
            panic!("expected recent activity");
        };
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, "users");
        assert_eq!(sections[0].entries.len(), RECENT_ENTRIES);
        assert_eq!(sections[0].entries[0].title, "new@x.com");
        assert_eq!(sections[0].entries[1].title, "old@x.com");
        assert_eq!(sections[0].entries[2].title, "3");
        assert_eq!(sections[1].entries[0].role.as_deref(), Some("SUPER_ADMIN"));
        assert!(sections[2].entries.is_empty());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(classify(&json!(42)), ChartDirective::Scalar("42".into()));
        assert_eq!(classify(&json!("ok")), ChartDirective::Scalar("ok".into()));
        assert_eq!(classify(&json!({})), ChartDirective::Scalar("{}".into()));
        assert_eq!(classify(&json!([])), ChartDirective::Scalar("[]".into()));
        assert_eq!(
            classify(&json!({ "a": 1, "b": "two" })),
            ChartDirective::Scalar(r#"{"a":1,"b":"two"}"#.into())
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let value = json!([{ "label": "x", "value": 5 }, { "label": "y", "value": 7 }]);
        assert_eq!(classify(&value), classify(&value));
    }
}
