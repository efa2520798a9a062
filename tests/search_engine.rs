use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use std::rc::Rc;
use std::time::Instant;
use todo_core::backend::InMemoryBackend;
use todo_core::domain::{ItemKind, Task, TodoList};
use todo_core::search::{
    search_sync, CompletedFilter, Corpus, MatchField, RecentSearches, SearchFilters, SearchMode, SearchOptions,
    SearchRequest, SearchSession, SearchStrategy, ServerSearch, TypeFilter,
};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn fixture() -> (Vec<TodoList>, Vec<Task>) {
    let lists = vec![
        TodoList::new("l-work", "Work", at(0)).with_description("report drafts and email"),
        TodoList::new("l-home", "Home", at(1)),
    ];
    let tasks = vec![
        Task::new("t1", "l-work", "Write report", at(10)),
        Task::new("t2", "l-work", "Write email", at(20)),
        Task::new("t3", "l-work", "Call client", at(30)).with_description("about the report"),
        Task::new("t4", "l-home", "Buy milk", at(40)).with_completed(true),
    ];
    (lists, tasks)
}

fn titles(results: &[todo_core::search::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.item.title()).collect()
}

#[test]
fn empty_or_short_query_returns_nothing() {
    let (lists, tasks) = fixture();
    let corpus = Corpus::new(&lists, &tasks);
    let options = SearchOptions::default();
    for query in ["", "   ", "w", " w "] {
        assert!(search_sync(corpus, query, &SearchFilters::default(), &options).is_empty(), "{query:?}");
    }
}

#[test]
fn same_tier_matches_order_newest_first() {
    let (lists, tasks) = fixture();
    let results = search_sync(
        Corpus::new(&lists, &tasks),
        "Write",
        &SearchFilters::default(),
        &SearchOptions::default(),
    );
    assert_eq!(titles(&results), vec!["Write email", "Write report"]);
    assert_eq!(results[0].score, results[1].score);
}

#[test]
fn title_match_outranks_description_match() {
    let (lists, tasks) = fixture();
    let results = search_sync(
        Corpus::new(&lists, &tasks),
        "report",
        &SearchFilters::tasks_only(),
        &SearchOptions::default(),
    );
    assert_eq!(titles(&results), vec!["Write report", "Call client"]);
    assert!(results[0].score > results[1].score);
    assert_eq!(results[1].highlights[0].field, MatchField::Description);
}

#[test]
fn filters_restrict_kind_and_completion() {
    let (lists, tasks) = fixture();
    let corpus = Corpus::new(&lists, &tasks);
    let options = SearchOptions::default();

    let completed = SearchFilters {
        completed: CompletedFilter::Completed,
        ..SearchFilters::default()
    };
    let done = search_sync(corpus, "milk", &completed, &options);
    assert_eq!(titles(&done), vec!["Buy milk"]);
    assert!(search_sync(corpus, "report", &completed, &options).is_empty());

    let all = search_sync(corpus, "report", &SearchFilters::default(), &options);
    assert!(all.iter().any(|r| r.kind == ItemKind::List));
    let tasks_only = search_sync(corpus, "report", &SearchFilters::tasks_only(), &options);
    assert!(tasks_only.iter().all(|r| r.kind == ItemKind::Task));

    let lists_only = SearchFilters {
        item_type: TypeFilter::Lists,
        ..SearchFilters::default()
    };
    assert_eq!(titles(&search_sync(corpus, "report", &lists_only, &options)), vec!["Work"]);
}

#[test]
fn limit_applies_after_ranking() {
    let (lists, tasks) = fixture();
    let options = SearchOptions {
        limit: 1,
        ..SearchOptions::default()
    };
    let results = search_sync(Corpus::new(&lists, &tasks), "Write", &SearchFilters::default(), &options);
    assert_eq!(titles(&results), vec!["Write email"]);
}

#[test]
fn fuzzy_fallback_tolerates_a_typo() {
    let (lists, tasks) = fixture();
    let corpus = Corpus::new(&lists, &tasks);
    let strict = SearchOptions::default();
    assert!(search_sync(corpus, "clinet", &SearchFilters::default(), &strict).is_empty());

    let fuzzy = SearchOptions {
        fuzzy: true,
        max_edit_distance: 2,
        ..SearchOptions::default()
    };
    assert_eq!(titles(&search_sync(corpus, "clinet", &SearchFilters::default(), &fuzzy)), vec!["Call client"]);
}

#[test]
fn recent_searches_stay_capped_and_unique() {
    let mut recent = RecentSearches::default();
    for i in 0..15 {
        recent.push(&format!("query {i}"));
    }
    recent.push("query 12");

    assert_eq!(recent.len(), 10);
    assert_eq!(recent.entries()[0], "query 12");
    let mut unique = recent.entries().to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), recent.len());
}

#[test]
fn server_strategy_matches_client_shape() {
    let (lists, tasks) = fixture();
    let backend = Rc::new(InMemoryBackend::with_data(lists, tasks));
    let server = ServerSearch::new(Rc::clone(&backend));
    assert_eq!(server.mode(), SearchMode::Server);

    let request = SearchRequest::new("write", SearchFilters::default(), SearchOptions::default());
    let results = block_on(server.search(&request)).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.kind == ItemKind::Task));

    backend.set_reachable(false);
    assert!(block_on(server.search(&request)).is_err());
}

#[test]
fn session_drops_stale_server_responses() {
    let (lists, tasks) = fixture();
    let corpus = Corpus::new(&lists, &tasks);
    let start = Instant::now();
    let debounce = std::time::Duration::from_millis(300);
    let mut session = SearchSession::new(SearchMode::Server, debounce, SearchOptions::default(), RecentSearches::default());

    session.set_query("wri", start, corpus);
    let first = session.poll(start + debounce).unwrap();
    session.set_query("write", start + debounce, corpus);
    let second = session.poll(start + debounce * 2).unwrap();
    assert!(second.seq > first.seq);

    assert!(!session.complete::<String>(first.seq, Ok(Vec::new())));
    assert!(session.is_loading());

    assert!(session.complete(second.seq, Err("timeout")));
    assert!(!session.is_loading());
    assert_eq!(session.error(), Some("timeout"));
    assert!(session.results().is_empty());
    assert_eq!(session.recent().entries(), ["write".to_string(), "wri".to_string()]);
}

#[test]
fn keystrokes_inside_the_window_only_search_once() {
    let (lists, tasks) = fixture();
    let corpus = Corpus::new(&lists, &tasks);
    let start = Instant::now();
    let debounce = std::time::Duration::from_millis(300);
    let mut session = SearchSession::new(SearchMode::Server, debounce, SearchOptions::default(), RecentSearches::default());

    for (i, query) in ["wr", "wri", "writ"].iter().enumerate() {
        let now = start + std::time::Duration::from_millis(100 * i as u64);
        session.set_query(*query, now, corpus);
        assert!(session.poll(now).is_none());
    }

    let pending = session.poll(start + std::time::Duration::from_millis(600)).unwrap();
    assert_eq!(pending.request.query, "writ");
    assert!(session.poll(start + std::time::Duration::from_secs(5)).is_none());
}
