//! Infinite-scroll pagination with debounced search
//!
//! The controller owns the photo collection and the opaque next-page
//! cursor. It never performs I/O itself: operations that need the
//! network hand back a `PageRequest` which the shell executes and
//! reports through `page_loaded`.

use std::time::Duration;

use super::data::{skeleton_photos, Photo, PhotoPage};
use super::timer::{Timer, TimerToken};
use crate::error::GalleryError;

/// Quiet period after the last keystroke before a search is issued
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Distance from the end of the collection of the photo whose
/// visibility triggers the next page
pub const NEXT_PAGE_OFFSET: usize = 10;

/// What a page request asks the API for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageQuery {
    /// First page of the curated feed (empty search)
    Curated,
    /// First page of a search
    Search(String),
    /// Follow-up page addressed by an API-supplied cursor
    Cursor(String),
}

/// A list fetch to be executed by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Monotonic request token; responses for older tokens are stale
    pub token: u64,
    pub query: PageQuery,
    pub per_page: usize,
}

impl PageRequest {
    /// Operation name used in user-visible error messages
    pub fn operation(&self) -> &'static str {
        match self.query {
            PageQuery::Curated => "fetch curated photos",
            PageQuery::Search(_) => "search photos",
            PageQuery::Cursor(_) => "fetch the next page of photos",
        }
    }

    /// Cursor pages extend the collection, first pages replace it
    pub fn appends(&self) -> bool {
        matches!(self.query, PageQuery::Cursor(_))
    }
}

/// Observable pagination state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationState {
    pub photos: Vec<Photo>,
    /// Opaque cursor of the next page; `None` when exhausted or reset
    pub next_page_cursor: Option<String>,
    /// Guard allowing at most one list fetch in flight
    pub loading: bool,
    pub search: String,
    /// Last list-fetch failure, shown instead of the grid
    pub error: Option<String>,
}

/// Owns `PaginationState` and drives both mutation triggers
#[derive(Debug)]
pub struct PaginationController {
    state: PaginationState,
    page_size: usize,
    debounce: Timer,
    latest_token: u64,
}

impl PaginationController {
    pub fn new(page_size: usize) -> Self {
        PaginationController {
            state: PaginationState {
                photos: skeleton_photos(page_size),
                ..PaginationState::default()
            },
            page_size,
            debounce: Timer::new(SEARCH_DEBOUNCE),
            latest_token: 0,
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn photos(&self) -> &[Photo] {
        &self.state.photos
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Initial fetch at mount, using the current (empty) search term
    pub fn start(&mut self) -> PageRequest {
        self.refetch()
    }

    /// Record a keystroke and (re)arm the search debounce.
    ///
    /// The shell must report the returned token through
    /// `search_timer_elapsed` once its delay has passed.
    pub fn set_search(&mut self, term: impl Into<String>) -> TimerToken {
        self.state.search = term.into();
        self.debounce.arm()
    }

    /// Debounce expiry. Only the latest armed token issues a fetch.
    pub fn search_timer_elapsed(&mut self, token: TimerToken) -> Option<PageRequest> {
        if !self.debounce.expire(token) {
            return None;
        }
        Some(self.refetch())
    }

    /// Replace the collection with placeholders and ask for a fresh
    /// first page for the current search term
    fn refetch(&mut self) -> PageRequest {
        self.state.photos = skeleton_photos(self.page_size);
        self.state.next_page_cursor = None;
        self.state.error = None;
        self.state.loading = true;

        let query = if self.state.search.is_empty() {
            PageQuery::Curated
        } else {
            PageQuery::Search(self.state.search.clone())
        };

        tracing::info!(search = %self.state.search, "fetching first page");
        self.issue(query)
    }

    /// Ask for the page after the current one.
    ///
    /// No-op while another list fetch is in flight or when there is no
    /// cursor to follow.
    pub fn request_next_page(&mut self) -> Option<PageRequest> {
        if self.state.loading {
            return None;
        }
        let cursor = self.state.next_page_cursor.clone()?;

        self.state.loading = true;
        tracing::debug!(%cursor, "fetching next page");
        Some(self.issue(PageQuery::Cursor(cursor)))
    }

    fn issue(&mut self, query: PageQuery) -> PageRequest {
        self.latest_token += 1;
        PageRequest {
            token: self.latest_token,
            query,
            per_page: self.page_size,
        }
    }

    /// Apply the outcome of a list fetch.
    ///
    /// Returns false if the response was stale (a newer request has been
    /// issued since) and was discarded.
    pub fn page_loaded(
        &mut self,
        request: &PageRequest,
        result: Result<PhotoPage, GalleryError>,
    ) -> bool {
        if request.token != self.latest_token {
            tracing::debug!(
                token = request.token,
                latest = self.latest_token,
                "discarding stale page response"
            );
            return false;
        }

        self.state.loading = false;
        match result {
            Ok(page) => {
                tracing::info!(
                    received = page.photos.len(),
                    has_next = page.next_page.is_some(),
                    "page loaded"
                );
                if request.appends() {
                    // Rebuilt rather than mutated in place
                    let mut photos = Vec::with_capacity(self.state.photos.len() + page.photos.len());
                    photos.extend_from_slice(&self.state.photos);
                    photos.extend(page.photos);
                    self.state.photos = photos;
                } else {
                    self.state.photos = page.photos;
                }
                self.state.next_page_cursor = page.next_page.filter(|cursor| !cursor.is_empty());
            }
            Err(err) => {
                tracing::warn!(error = %err, "list fetch failed");
                self.state.error = Some(err.to_string());
            }
        }
        true
    }

    /// Index of the photo whose visibility requests the next page
    pub fn next_page_trigger_index(&self) -> Option<usize> {
        if self.state.photos.is_empty() {
            None
        } else {
            Some(self.state.photos.len().saturating_sub(NEXT_PAGE_OFFSET))
        }
    }

    /// Cancel any pending search debounce
    pub fn teardown(&mut self) {
        self.debounce.cancel();
    }
}
