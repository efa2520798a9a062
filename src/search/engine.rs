//! Search execution: local ranking and the strategy seam.
//!
//! [`search_sync`] is the client-mode engine: it filters, matches, ranks and
//! truncates an in-memory [`Corpus`]. [`SearchStrategy`] abstracts over where
//! matching happens so callers get the same [`SearchResult`] shape from either
//! [`ClientSearch`] or [`ServerSearch`].
//!
//! # Ranking
//!
//! Results are ordered by score (descending), then `created_at` (newest first),
//! then id (ascending) so equal items have a stable order. Truncation to
//! `limit` happens after sorting.

use super::matcher::{fold, match_item, Highlight};
use super::query::{SearchFilters, SearchMode, SearchOptions, SearchRequest};
use crate::backend::DataLayer;
use crate::domain::{Identified, ItemId, ItemKind, Result, Task, TodoList};
use chrono::{DateTime, Utc};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// The entity a result points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchItem {
    Task(Task),
    List(TodoList),
}

impl SearchItem {
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Task(_) => ItemKind::Task,
            Self::List(_) => ItemKind::List,
        }
    }

    /// Task title or list name.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Task(task) => &task.title,
            Self::List(list) => &list.name,
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Task(task) => task.description.as_deref(),
            Self::List(list) => list.description.as_deref(),
        }
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Task(task) => task.created_at,
            Self::List(list) => list.created_at,
        }
    }

    #[must_use]
    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Self::Task(task) => Some(task),
            Self::List(_) => None,
        }
    }
}

impl Identified for SearchItem {
    fn id(&self) -> &ItemId {
        match self {
            Self::Task(task) => &task.id,
            Self::List(list) => &list.id,
        }
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub item: SearchItem,
    pub score: u32,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

impl Identified for SearchResult {
    fn id(&self) -> &ItemId {
        self.item.id()
    }
}

/// Borrowed view over the collections a client-mode search runs against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Corpus<'a> {
    pub lists: &'a [TodoList],
    pub tasks: &'a [Task],
}

impl<'a> Corpus<'a> {
    #[must_use]
    pub const fn new(lists: &'a [TodoList], tasks: &'a [Task]) -> Self {
        Self { lists, tasks }
    }
}

/// Client-mode search over an in-memory corpus.
///
/// Returns an empty vector when the trimmed query is shorter than
/// `options.min_query_len`.
///
/// # Examples
///
/// ```
/// use todo_core::domain::Task;
/// use todo_core::search::{search_sync, Corpus, SearchFilters, SearchOptions};
///
/// let now = chrono::Utc::now();
/// let tasks = vec![
///     Task::new("t1", "l1", "Write report", now),
///     Task::new("t2", "l1", "Call client", now),
/// ];
///
/// let hits = search_sync(
///     Corpus::new(&[], &tasks),
///     "write",
///     &SearchFilters::default(),
///     &SearchOptions::default(),
/// );
/// assert_eq!(hits.len(), 1);
/// ```
#[must_use]
pub fn search_sync(
    corpus: Corpus<'_>,
    query: &str,
    filters: &SearchFilters,
    options: &SearchOptions,
) -> Vec<SearchResult> {
    let _span = tracing::debug_span!(
        "search_sync",
        query_len = query.len(),
        lists = corpus.lists.len(),
        tasks = corpus.tasks.len()
    )
    .entered();

    if !super::query::is_searchable(query, options.min_query_len) {
        tracing::trace!("query below minimum length");
        return Vec::new();
    }

    let needle = fold(query.trim());

    let tasks = corpus
        .tasks
        .iter()
        .filter(|task| filters.admits_task(task))
        .filter_map(|task| {
            match_item(&task.title, task.description.as_deref(), &needle, options)
                .map(|hit| (SearchItem::Task(task.clone()), hit))
        });

    let lists = corpus
        .lists
        .iter()
        .filter(|list| filters.admits_list(list))
        .filter_map(|list| {
            match_item(&list.name, list.description.as_deref(), &needle, options)
                .map(|hit| (SearchItem::List(list.clone()), hit))
        });

    let mut results: Vec<SearchResult> = tasks
        .chain(lists)
        .map(|(item, hit)| SearchResult {
            kind: item.kind(),
            item,
            score: hit.score,
            highlights: hit.highlights,
        })
        .collect();

    rank(&mut results);
    results.truncate(options.limit);

    tracing::debug!(result_count = results.len(), "search complete");
    results
}

/// Convenience wrapper over [`search_sync`] taking a whole request.
#[must_use]
pub fn search_request(corpus: Corpus<'_>, request: &SearchRequest) -> Vec<SearchResult> {
    search_sync(corpus, &request.query, &request.filters, &request.options)
}

/// Sorts by score, then newest first, then id.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.item.created_at().cmp(&a.item.created_at()))
            .then_with(|| a.item.id().cmp(b.item.id()))
    });
}

/// A hit as returned by the data layer, before normalization.
///
/// Backends may omit the score or the highlights; `kind` is derived from the
/// item itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub item: SearchItem,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

/// Turns backend hits into ranked results.
///
/// Hits the filters would reject are dropped, a missing score counts as 0,
/// and the list is cut to `limit` after ranking, as in client mode.
#[must_use]
pub fn normalize_hits(hits: Vec<SearchHit>, request: &SearchRequest) -> Vec<SearchResult> {
    let filters = &request.filters;
    let mut results: Vec<SearchResult> = hits
        .into_iter()
        .filter(|hit| match &hit.item {
            SearchItem::Task(task) => filters.admits_task(task),
            SearchItem::List(list) => filters.admits_list(list),
        })
        .map(|hit| SearchResult {
            kind: hit.item.kind(),
            item: hit.item,
            score: hit.score.unwrap_or(0),
            highlights: hit.highlights,
        })
        .collect();

    rank(&mut results);
    results.truncate(request.options.limit);
    results
}

/// Where and how a search is evaluated.
///
/// Both implementations return the same result shape, so the session and the
/// views do not care which one ran.
pub trait SearchStrategy {
    fn mode(&self) -> SearchMode;

    /// Runs `request`, resolving to ranked results.
    ///
    /// # Errors
    ///
    /// Only server-backed strategies fail, with [`crate::domain::TodoError::Backend`].
    fn search<'a>(&'a self, request: &'a SearchRequest) -> LocalBoxFuture<'a, Result<Vec<SearchResult>>>;
}

/// Matches locally over an owned snapshot of lists and tasks.
#[derive(Debug, Clone, Default)]
pub struct ClientSearch {
    lists: Vec<TodoList>,
    tasks: Vec<Task>,
}

impl ClientSearch {
    #[must_use]
    pub const fn new(lists: Vec<TodoList>, tasks: Vec<Task>) -> Self {
        Self { lists, tasks }
    }

    /// Replaces the snapshot after the underlying collections change.
    pub fn replace(&mut self, lists: Vec<TodoList>, tasks: Vec<Task>) {
        self.lists = lists;
        self.tasks = tasks;
    }

    #[must_use]
    pub fn corpus(&self) -> Corpus<'_> {
        Corpus::new(&self.lists, &self.tasks)
    }
}

impl SearchStrategy for ClientSearch {
    fn mode(&self) -> SearchMode {
        SearchMode::Client
    }

    fn search<'a>(&'a self, request: &'a SearchRequest) -> LocalBoxFuture<'a, Result<Vec<SearchResult>>> {
        futures::future::ready(Ok(search_request(self.corpus(), request))).boxed_local()
    }
}

/// Delegates matching to a [`DataLayer`].
pub struct ServerSearch<D: DataLayer> {
    data: Rc<D>,
}

impl<D: DataLayer> ServerSearch<D> {
    pub const fn new(data: Rc<D>) -> Self {
        Self { data }
    }
}

impl<D: DataLayer> SearchStrategy for ServerSearch<D> {
    fn mode(&self) -> SearchMode {
        SearchMode::Server
    }

    fn search<'a>(&'a self, request: &'a SearchRequest) -> LocalBoxFuture<'a, Result<Vec<SearchResult>>> {
        async move {
            if !request.is_searchable() {
                return Ok(Vec::new());
            }
            tracing::debug!(query = %request.trimmed_query(), "forwarding search to data layer");
            let hits = self.data.search(request.clone()).await?;
            Ok(normalize_hits(hits, request))
        }
        .boxed_local()
    }
}
