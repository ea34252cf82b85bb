// Dashboard view state.
// Turns the metrics mapping into labelled cards, each carrying its chart directive.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::chart::{ChartDirective, classify};
use crate::error::LoadError;
use crate::loader::LoadResult;
use crate::model::DashboardMetrics;

use super::list::{Ticket, TicketCounter};

/// One dashboard card.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: String,
    pub directive: ChartDirective,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub cards: Vec<MetricCard>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
    tickets: TicketCounter,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.loading = true;
        self.tickets.issue(1)
    }

    /// Apply a load result; stale or cancelled results are discarded.
    pub fn finish(&mut self, ticket: Ticket, result: LoadResult<DashboardMetrics>) -> bool {
        if !self.tickets.is_current(ticket) {
            debug!("discarding stale dashboard response");
            return false;
        }
        self.loading = false;

        match result {
            Ok(entry) => {
                self.cards = cards(&entry.payload);
                self.fetched_at = Some(entry.fetched_at);
                self.error = None;
                true
            }
            Err(LoadError::Cancelled) => false,
            Err(e) => {
                self.error = Some(e.banner());
                true
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

/// Cards in server order, one per metric.
pub fn cards(metrics: &DashboardMetrics) -> Vec<MetricCard> {
    metrics
        .metrics
        .iter()
        .map(|(label, value)| MetricCard {
            label: label.clone(),
            directive: classify(value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::chart::ChartKind;
    use serde_json::json;

    #[test]
    fn test_cards_follow_metric_order() {
        let metrics = DashboardMetrics::from_raw(&json!({
            "data": { "metrics": {
                "totalUsers": 12,
                "signups": [1, 4, 2],
                "recent": { "users": [{ "email": "a@x.com" }] }
            }}
        }));

        let mut view = DashboardView::new();
        let ticket = view.begin();
        assert!(view.finish(ticket, Ok(CacheEntry::new(metrics))));

        let labels: Vec<&str> = view.cards.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["totalUsers", "signups", "recent"]);
        assert_eq!(view.cards[0].directive, ChartDirective::Scalar("12".into()));
        assert!(matches!(
            &view.cards[1].directive,
            ChartDirective::Chart(s) if s.kind == ChartKind::Line
        ));
        assert!(matches!(view.cards[2].directive, ChartDirective::RecentActivity(_)));
    }

    #[test]
    fn test_error_keeps_cards() {
        let mut view = DashboardView::new();
        let ticket = view.begin();
        let metrics = DashboardMetrics::from_raw(&json!({ "metrics": { "a": 1 } }));
        view.finish(ticket, Ok(CacheEntry::new(metrics)));

        let ticket = view.begin();
        view.finish(ticket, Err(LoadError::Network("timed out".into())));
        assert_eq!(view.cards.len(), 1);
        assert!(view.error.is_some());
    }
}
