//! Full-text search over lists and tasks.
//!
//! - [`query`]: Request shape (filters, options, mode)
//! - [`matcher`]: Case-insensitive matching, tiers and highlights
//! - [`engine`]: Client ranking, server normalization, strategy trait
//! - [`session`]: Debounce, sequencing and error state for one view
//! - [`recent`]: Recent-searches list

pub mod engine;
pub mod matcher;
pub mod query;
pub mod recent;
pub mod session;

pub use engine::{
    normalize_hits, rank, search_request, search_sync, ClientSearch, Corpus, SearchHit, SearchItem, SearchResult,
    SearchStrategy, ServerSearch,
};
pub use matcher::{Highlight, MatchField, MatchTier};
pub use query::{
    is_searchable, CompletedFilter, PriorityFilter, SearchFilters, SearchMode, SearchOptions, SearchRequest,
    TypeFilter,
};
pub use recent::{RecentSearches, DEFAULT_RECENT_CAPACITY};
pub use session::{PendingSearch, SearchSession, SearchState, DEFAULT_DEBOUNCE};
