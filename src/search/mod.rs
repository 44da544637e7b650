// src/search/mod.rs
// Search Engine - keyword search with content dedup and paging

mod dedup;

pub use dedup::unique_by_transcription;

use crate::inflight::{self, InFlight};
use crate::lock::lock;
use crate::pagination::{self, Page};
use crate::transport::{Record, RecordTransport, TransportError};
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

pub const EMPTY_RESULTS_MESSAGE: &str = "No results found for your search.";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search keyword is empty")]
    EmptyKeyword,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What the search panel should currently show
#[derive(Debug, Clone, PartialEq)]
pub enum SearchView {
    /// No search has completed yet
    Idle,
    /// The latest search matched nothing
    NoResults,
    Results(Page<Record>),
}

impl SearchView {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SearchView::NoResults => Some(EMPTY_RESULTS_MESSAGE),
            _ => None,
        }
    }
}

#[derive(Default)]
struct SearchState {
    query: Option<String>,
    /// `None` until a search succeeds; `Some(empty)` after a search with no matches
    results: Option<Vec<Record>>,
    current_page: usize,
    error: Option<String>,
}

pub struct SearchEngine {
    transport: Arc<dyn RecordTransport>,
    page_size: NonZeroUsize,
    state: Mutex<SearchState>,
    in_flight: AtomicUsize,
}

impl SearchEngine {
    pub fn new(transport: Arc<dyn RecordTransport>, page_size: NonZeroUsize) -> Self {
        Self {
            transport,
            page_size,
            state: Mutex::new(SearchState {
                current_page: 1,
                ..SearchState::default()
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Run one search and replace the result set with its deduplicated hits.
    ///
    /// On failure the previous results and page stay as they were and the
    /// error text is kept for display. Overlapping searches are not
    /// coalesced: whichever response arrives last is what remains.
    pub async fn submit(&self, keyword: &str) -> Result<usize, SearchError> {
        if keyword.trim().is_empty() {
            return Err(SearchError::EmptyKeyword);
        }

        let _busy = InFlight::enter(&self.in_flight);
        tracing::info!("Searching records for '{}'", keyword);

        match self.transport.search(keyword).await {
            Ok(set) => {
                let results = if set.is_empty() {
                    tracing::info!("No records found for '{}'", keyword);
                    Vec::new()
                } else {
                    unique_by_transcription(set.data)
                };
                let count = results.len();

                let mut state = lock(&self.state);
                state.query = Some(keyword.to_string());
                state.results = Some(results);
                state.current_page = 1;
                state.error = None;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Search for '{}' failed: {}", keyword, e);
                lock(&self.state).error = Some(e.describe("Search"));
                Err(SearchError::Transport(e))
            }
        }
    }

    pub fn is_searching(&self) -> bool {
        inflight::is_busy(&self.in_flight)
    }

    /// Keyword of the search that produced the current results
    pub fn query(&self) -> Option<String> {
        lock(&self.state).query.clone()
    }

    pub fn results(&self) -> Option<Vec<Record>> {
        lock(&self.state).results.clone()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn current_page(&self) -> usize {
        lock(&self.state).current_page
    }

    pub fn view(&self) -> SearchView {
        let state = lock(&self.state);

        match state.results.as_deref() {
            None => SearchView::Idle,
            Some([]) => SearchView::NoResults,
            Some(results) => {
                SearchView::Results(Page::of(results, self.page_size, state.current_page))
            }
        }
    }

    pub fn go_to_page(&self, page: usize) -> usize {
        let mut state = lock(&self.state);
        let total = state.results.as_ref().map(|r| r.len()).unwrap_or(0);
        let total_pages = pagination::total_pages(total, self.page_size.get());
        state.current_page = pagination::clamp_page(page, total_pages);
        state.current_page
    }

    pub fn next_page(&self) -> usize {
        self.go_to_page(self.current_page().saturating_add(1))
    }

    pub fn previous_page(&self) -> usize {
        self.go_to_page(self.current_page().saturating_sub(1))
    }
}
