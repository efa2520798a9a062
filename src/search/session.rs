//! Per-view search state: debounce, request sequencing and error state.
//!
//! [`SearchSession`] does no I/O. The caller feeds it keystrokes and clock
//! ticks; in server mode [`SearchSession::poll`] hands back a
//! [`PendingSearch`] once the debounce window has elapsed, and the caller
//! reports the backend's answer through [`SearchSession::complete`]. Every
//! issued request carries a sequence number and only the newest one may
//! change the visible results.
//!
//! # Timeline
//!
//! ```text
//! set_query("wr")   set_query("wri")   poll(t+300ms)        complete(seq=1, Ok)
//!      |                  |                  |                       |
//!  deadline=t+300    deadline reset      issue seq=1           results shown
//! ```

use super::engine::{search_sync, Corpus, SearchResult};
use super::query::{is_searchable, SearchFilters, SearchMode, SearchOptions, SearchRequest};
use super::recent::RecentSearches;
use std::fmt;
use std::time::{Duration, Instant};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A server search ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSearch {
    pub seq: u64,
    pub request: SearchRequest,
}

/// Observable search state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub results: Vec<SearchResult>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Search state for a single view.
#[derive(Debug, Clone)]
pub struct SearchSession {
    mode: SearchMode,
    debounce: Duration,
    options: SearchOptions,
    query: String,
    filters: SearchFilters,
    deadline: Option<Instant>,
    next_seq: u64,
    in_flight: Option<u64>,
    state: SearchState,
    recent: RecentSearches,
    recent_dirty: bool,
}

impl SearchSession {
    #[must_use]
    pub fn new(mode: SearchMode, debounce: Duration, options: SearchOptions, recent: RecentSearches) -> Self {
        Self {
            mode,
            debounce,
            options,
            query: String::new(),
            filters: SearchFilters::default(),
            deadline: None,
            next_seq: 1,
            in_flight: None,
            state: SearchState::default(),
            recent,
            recent_dirty: false,
        }
    }

    /// Updates the query text.
    ///
    /// Client mode recomputes results against `corpus` immediately. Server
    /// mode restarts the debounce window. Either way a request still in
    /// flight is superseded and its answer will be discarded; an
    /// unsearchable query also clears the results at once.
    pub fn set_query(&mut self, query: impl Into<String>, now: Instant, corpus: Corpus<'_>) {
        self.query = query.into();
        self.on_input_changed(now, corpus);
    }

    /// Replaces the filters, re-running the search like a query change.
    pub fn set_filters(&mut self, filters: SearchFilters, now: Instant, corpus: Corpus<'_>) {
        self.filters = filters;
        self.on_input_changed(now, corpus);
    }

    fn on_input_changed(&mut self, now: Instant, corpus: Corpus<'_>) {
        let _span = tracing::debug_span!("search_input", mode = ?self.mode, query_len = self.query.len()).entered();

        if self.in_flight.take().is_some() {
            tracing::debug!("in-flight search superseded");
            self.state.loading = false;
        }

        if !is_searchable(&self.query, self.options.min_query_len) {
            self.deadline = None;
            self.state = SearchState::default();
            return;
        }

        self.deadline = Some(now + self.debounce);
        if self.mode == SearchMode::Client {
            self.recompute_client(corpus);
        }
    }

    fn recompute_client(&mut self, corpus: Corpus<'_>) {
        self.state = SearchState {
            results: search_sync(corpus, &self.query, &self.filters, &self.options),
            loading: false,
            error: None,
        };
    }

    /// Re-runs a client-mode search after the underlying data changed.
    ///
    /// Does nothing in server mode.
    pub fn refresh_client(&mut self, corpus: Corpus<'_>) {
        if self.mode == SearchMode::Client && is_searchable(&self.query, self.options.min_query_len) {
            self.recompute_client(corpus);
        }
    }

    /// When the pending debounce window elapses, if one is armed.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires the debounce window if it has elapsed by `now`.
    ///
    /// The query is recorded in the recent list either way; in server mode a
    /// new sequenced request is returned and the session enters loading.
    pub fn poll(&mut self, now: Instant) -> Option<PendingSearch> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        if self.recent.push(&self.query) {
            self.recent_dirty = true;
        }

        if self.mode == SearchMode::Client {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);
        self.state.loading = true;
        self.state.error = None;

        tracing::debug!(seq = seq, "issuing server search");
        Some(PendingSearch {
            seq,
            request: self.request(),
        })
    }

    /// Applies a backend answer. Returns `false` when `seq` is stale.
    ///
    /// A failure empties the results and records the message; it is never
    /// returned to the caller.
    pub fn complete<E: fmt::Display>(&mut self, seq: u64, outcome: std::result::Result<Vec<SearchResult>, E>) -> bool {
        if self.in_flight != Some(seq) {
            tracing::debug!(seq = seq, latest = ?self.in_flight, "discarding stale search response");
            return false;
        }
        self.in_flight = None;

        self.state = match outcome {
            Ok(results) => SearchState {
                results,
                loading: false,
                error: None,
            },
            Err(e) => {
                tracing::warn!(seq = seq, error = %e, "server search failed");
                SearchState {
                    results: Vec::new(),
                    loading: false,
                    error: Some(e.to_string()),
                }
            }
        };
        true
    }

    /// Cancels the debounce timer and forgets any in-flight request.
    pub fn teardown(&mut self) {
        self.deadline = None;
        self.in_flight = None;
        self.state.loading = false;
    }

    /// Clears the query and results, keeping recent searches.
    pub fn clear(&mut self) {
        self.teardown();
        self.query.clear();
        self.state = SearchState::default();
    }

    /// Switches between client and server evaluation.
    pub fn set_mode(&mut self, mode: SearchMode, now: Instant, corpus: Corpus<'_>) {
        if self.mode != mode {
            self.mode = mode;
            self.teardown();
            self.on_input_changed(now, corpus);
        }
    }

    #[must_use]
    pub fn request(&self) -> SearchRequest {
        SearchRequest::new(self.query.clone(), self.filters, self.options)
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    #[must_use]
    pub const fn mode(&self) -> SearchMode {
        self.mode
    }

    #[must_use]
    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        &self.state.results
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    #[must_use]
    pub const fn recent(&self) -> &RecentSearches {
        &self.recent
    }

    /// Returns and resets the flag set when the recent list changed.
    pub fn take_recent_dirty(&mut self) -> bool {
        std::mem::take(&mut self.recent_dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use chrono::Utc;

    fn server_session() -> SearchSession {
        SearchSession::new(SearchMode::Server, DEFAULT_DEBOUNCE, SearchOptions::default(), RecentSearches::default())
    }

    #[test]
    fn debounce_collapses_keystrokes() {
        let mut session = server_session();
        let t0 = Instant::now();
        let empty = Corpus::default();

        session.set_query("wr", t0, empty);
        session.set_query("wri", t0 + Duration::from_millis(100), empty);
        assert_eq!(session.poll(t0 + Duration::from_millis(350)), None);

        let pending = session.poll(t0 + Duration::from_millis(400)).unwrap();
        assert_eq!(pending.request.query, "wri");
        assert!(session.is_loading());
        assert_eq!(session.poll(t0 + Duration::from_secs(5)), None);
        assert_eq!(session.recent().entries(), ["wri"]);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut session = server_session();
        let t0 = Instant::now();
        let empty = Corpus::default();

        session.set_query("first", t0, empty);
        let first = session.poll(t0 + DEFAULT_DEBOUNCE).unwrap();
        session.set_query("second", t0 + DEFAULT_DEBOUNCE, empty);
        let second = session.poll(t0 + DEFAULT_DEBOUNCE * 2).unwrap();
        assert!(second.seq > first.seq);

        assert!(!session.complete::<String>(first.seq, Ok(Vec::new())));
        assert!(session.is_loading());
        assert!(session.complete::<String>(second.seq, Ok(Vec::new())));
        assert!(!session.is_loading());
    }

    #[test]
    fn new_input_supersedes_request_in_flight() {
        let mut session = server_session();
        let t0 = Instant::now();
        let empty = Corpus::default();

        session.set_query("first", t0, empty);
        let first = session.poll(t0 + DEFAULT_DEBOUNCE).unwrap();
        session.set_query("second", t0 + DEFAULT_DEBOUNCE, empty);
        assert!(!session.is_loading());

        assert!(!session.complete::<String>(first.seq, Ok(Vec::new())));
        assert_eq!(session.query(), "second");
        assert!(session.next_deadline().is_some());

        session.set_filters(SearchFilters::tasks_only(), t0 + DEFAULT_DEBOUNCE, empty);
        let second = session.poll(t0 + DEFAULT_DEBOUNCE * 2).unwrap();
        session.set_filters(SearchFilters::default(), t0 + DEFAULT_DEBOUNCE * 2, empty);
        assert!(!session.complete::<String>(second.seq, Ok(Vec::new())));
    }

    #[test]
    fn failure_becomes_error_state() {
        let mut session = server_session();
        let t0 = Instant::now();
        session.set_query("report", t0, Corpus::default());
        let pending = session.poll(t0 + DEFAULT_DEBOUNCE).unwrap();

        session.complete(pending.seq, Err("backend unavailable"));
        assert!(!session.is_loading());
        assert_eq!(session.error(), Some("backend unavailable"));
        assert!(session.results().is_empty());
    }

    #[test]
    fn teardown_ignores_late_response() {
        let mut session = server_session();
        let t0 = Instant::now();
        session.set_query("report", t0, Corpus::default());
        let pending = session.poll(t0 + DEFAULT_DEBOUNCE).unwrap();
        session.teardown();
        assert!(!session.complete::<String>(pending.seq, Ok(Vec::new())));
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn client_mode_is_synchronous() {
        let tasks = vec![Task::new("t1", "l1", "Write report", Utc::now())];
        let mut session = SearchSession::new(
            SearchMode::Client,
            DEFAULT_DEBOUNCE,
            SearchOptions::default(),
            RecentSearches::default(),
        );
        let t0 = Instant::now();
        session.set_query("rep", t0, Corpus::new(&[], &tasks));
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.poll(t0 + DEFAULT_DEBOUNCE), None);
        assert!(session.take_recent_dirty());
        assert!(!session.take_recent_dirty());
    }
}
