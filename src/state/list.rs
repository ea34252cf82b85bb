// Paged list view state.
// Tracks the requested page, the loaded page, and a dismissible error banner for one list view.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::LoadError;
use crate::loader::LoadResult;
use crate::model::{PageResult, Searchable};

/// Marks one issued request. Only the most recent ticket may update the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    page: u32,
}

impl Ticket {
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Issues tickets and recognises the current one.
#[derive(Debug, Clone, Default)]
pub struct TicketCounter {
    generation: u64,
}

impl TicketCounter {
    pub fn issue(&mut self, page: u32) -> Ticket {
        self.generation += 1;
        Ticket {
            generation: self.generation,
            page,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }
}

/// State for a paged, searchable list.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub data: PageResult<T>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<String>,
    requested_page: u32,
    tickets: TicketCounter,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            data: PageResult::default(),
            fetched_at: None,
            loading: false,
            error: None,
            requested_page: 1,
            tickets: TicketCounter::default(),
        }
    }
}

impl<T> ListView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page the view currently expects to show.
    pub fn requested_page(&self) -> u32 {
        self.requested_page
    }

    /// Start loading `page`. Any earlier ticket becomes stale.
    pub fn begin(&mut self, page: u32) -> Ticket {
        self.requested_page = page.max(1);
        self.loading = true;
        self.tickets.issue(self.requested_page)
    }

    /// Apply a load result. Returns `false` when the result was discarded.
    ///
    /// Results for superseded tickets and cancelled loads are dropped. On
    /// failure the previously loaded items stay and the banner is set.
    pub fn finish(&mut self, ticket: Ticket, result: LoadResult<PageResult<T>>) -> bool {
        if !self.tickets.is_current(ticket) {
            debug!(page = ticket.page, "discarding stale response");
            return false;
        }
        self.loading = false;

        match result {
            Ok(entry) => {
                self.data = entry.payload;
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

    pub fn items(&self) -> &[T] {
        &self.data.items
    }

    pub fn total_pages(&self, limit: u32) -> u32 {
        self.data.total_pages(limit)
    }

    pub fn can_prev(&self) -> bool {
        self.data.page > 1
    }

    pub fn can_next(&self, limit: u32) -> bool {
        self.data.page < self.total_pages(limit)
    }

    pub fn is_empty(&self) -> bool {
        self.data.items.is_empty()
    }
}

impl<T: Searchable> ListView<T> {
    /// Loaded items matching a client-side search. A blank query matches all.
    pub fn filtered(&self, query: &str) -> Vec<&T> {
        let query = query.trim();
        self.data
            .items
            .iter()
            .filter(|item| query.is_empty() || item.matches_query(query))
            .collect()
    }
}
