use std::rc::Rc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use todo_core::app::viewmodel::bracket_highlights;
use todo_core::backend::InMemoryBackend;
use todo_core::domain::{Identified, ItemId, Mutation, Priority, Task, TodoList};
use todo_core::reports::export_json;
use todo_core::search::SearchMode;
use todo_core::storage::MemoryStore;
use todo_core::sync::ConflictChoice;
use todo_core::{initialize, Clock, Config, Event, InputMode, Runtime};

fn seeded() -> Rc<InMemoryBackend> {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Rc::new(InMemoryBackend::with_data(
        vec![TodoList::new("home", "Home", at)],
        vec![
            Task::new("t1", "home", "Pay rent", at),
            Task::new("t2", "home", "Water plants", at + chrono::Duration::minutes(5)),
        ],
    ))
}

fn runtime_with(config: &Config, backend: &Rc<InMemoryBackend>) -> Runtime<InMemoryBackend> {
    let store = MemoryStore::new();
    let state = initialize(config, &store).unwrap();
    let mut runtime = Runtime::new(state, Rc::clone(backend), Box::new(store));
    block_on(runtime.start());
    runtime
}

fn key(runtime: &mut Runtime<InMemoryBackend>, chord: &str) -> bool {
    block_on(runtime.dispatch(Event::Key(chord.parse().unwrap()), Clock::now()))
}

fn send(runtime: &mut Runtime<InMemoryBackend>, event: Event) -> bool {
    block_on(runtime.dispatch(event, Clock::now()))
}

fn completed(backend: &InMemoryBackend, id: &str) -> bool {
    backend.task(&ItemId::new(id)).is_some_and(|t| t.completed)
}

#[test]
fn start_loads_everything() {
    let backend = seeded();
    let runtime = runtime_with(&Config::default(), &backend);

    assert!(runtime.state().loaded);
    assert_eq!(runtime.state().tasks.len(), 2);
    assert_eq!(runtime.viewmodel().header, "All tasks (2)");
}

#[test]
fn bulk_complete_reaches_the_backend() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    key(&mut runtime, "ctrl+a");
    assert_eq!(runtime.state().selection.selected_count(), 2);
    key(&mut runtime, "c");

    assert!(completed(&backend, "t1"));
    assert!(completed(&backend, "t2"));
    assert!(!runtime.state().selection.selection_mode());
    assert!(runtime.state().tasks.iter().all(|t| t.completed));
}

#[test]
fn offline_changes_replay_when_back_online() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    backend.set_reachable(false);
    send(&mut runtime, Event::ConnectivityChanged { online: false });
    key(&mut runtime, "ctrl+a");
    key(&mut runtime, "d");

    assert_eq!(runtime.state().queue.len(), 2);
    assert!(runtime.state().tasks.is_empty());
    assert!(backend.task(&ItemId::new("t1")).is_some());
    assert_eq!(runtime.viewmodel().sync.pending, 2);

    backend.set_reachable(true);
    send(&mut runtime, Event::ConnectivityChanged { online: true });

    assert!(runtime.state().queue.is_empty());
    assert!(backend.task(&ItemId::new("t1")).is_none());
    assert!(runtime.state().tasks.is_empty());
}

#[test]
fn successive_offline_edits_replay_without_conflicts() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    backend.set_reachable(false);
    send(&mut runtime, Event::ConnectivityChanged { online: false });
    send(&mut runtime, Event::ToggleItem(ItemId::new("t1")));
    key(&mut runtime, "c");
    send(&mut runtime, Event::ToggleItem(ItemId::new("t1")));
    key(&mut runtime, "3");
    assert_eq!(runtime.state().queue.len(), 2);

    backend.set_reachable(true);
    send(&mut runtime, Event::ConnectivityChanged { online: true });

    assert!(runtime.state().queue.is_empty());
    assert!(runtime.state().queue.conflicts().is_empty());
    let task = backend.task(&ItemId::new("t1")).unwrap();
    assert!(task.completed);
    assert_eq!(task.priority, Priority::High);
}

#[test]
fn queue_backoff_follows_the_given_clock() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);
    let start = Clock::now();

    backend.set_reachable(false);
    block_on(runtime.dispatch(Event::ToggleItem(ItemId::new("t2")), start));
    block_on(runtime.dispatch(Event::Key("c".parse().unwrap()), start));
    block_on(runtime.dispatch(Event::ConnectivityChanged { online: true }, start));
    assert_eq!(runtime.state().queue.pending().next().map(|op| op.attempts), Some(1));

    backend.set_reachable(true);
    block_on(runtime.dispatch(Event::Tick, start.advanced(Duration::from_millis(100))));
    assert_eq!(runtime.state().queue.len(), 1);

    block_on(runtime.dispatch(Event::Tick, start.advanced(Duration::from_secs(1))));
    assert!(runtime.state().queue.is_empty());
    assert!(completed(&backend, "t2"));
}

#[test]
fn failed_send_falls_back_to_the_queue() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    backend.set_reachable(false);
    key(&mut runtime, "v");
    key(&mut runtime, "space");
    key(&mut runtime, "c");

    assert!(!runtime.state().online);
    assert_eq!(runtime.state().queue.len(), 1);
    assert!(!completed(&backend, "t1") && !completed(&backend, "t2"));

    backend.set_reachable(true);
    send(&mut runtime, Event::ConnectivityChanged { online: true });
    assert!(runtime.state().queue.is_empty());
    assert_eq!(runtime.state().tasks.iter().filter(|t| t.completed).count(), 1);
}

#[test]
fn conflicting_offline_change_waits_for_a_decision() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    backend.set_reachable(false);
    send(&mut runtime, Event::ConnectivityChanged { online: false });
    send(&mut runtime, Event::ToggleItem(ItemId::new("t1")));
    key(&mut runtime, "c");

    backend.set_reachable(true);
    backend.write_from_elsewhere(Mutation::Complete {
        id: ItemId::new("t1"),
        completed: false,
    });
    send(&mut runtime, Event::ConnectivityChanged { online: true });

    let conflicts = runtime.state().queue.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(runtime.viewmodel().sync.conflicts, 1);
    let op_id = conflicts[0].op.op_id.clone();
    assert!(!completed(&backend, "t1"));

    send(
        &mut runtime,
        Event::ResolveConflict {
            op_id: op_id.clone(),
            choice: ConflictChoice::KeepMine,
        },
    );
    assert!(completed(&backend, "t1"));
    assert!(runtime.state().queue.conflicts().is_empty());

    // Resolving again is reported, not fatal.
    send(
        &mut runtime,
        Event::ResolveConflict {
            op_id,
            choice: ConflictChoice::KeepServer,
        },
    );
    assert!(runtime.is_running());
    assert!(runtime.state().status.as_deref().is_some_and(|s| s.contains("no conflict")));
}

#[test]
fn server_search_runs_after_the_debounce() {
    let backend = seeded();
    let mut config = Config::default();
    config.search.mode = SearchMode::Server;
    let mut runtime = runtime_with(&config, &backend);

    let now = Clock::now();
    block_on(runtime.dispatch(Event::Key("/".parse().unwrap()), now));
    for c in "rent".chars() {
        block_on(runtime.dispatch(Event::Char(c), now));
    }
    assert!(runtime.state().search.results().is_empty());

    block_on(runtime.dispatch(Event::Tick, now.advanced(Duration::from_millis(config.search.debounce_ms + 1))));

    let ids: Vec<&str> = runtime.state().search.results().iter().map(|r| r.item.id().as_str()).collect();
    assert_eq!(ids, vec!["t1"]);
    assert_eq!(runtime.state().search.recent().entries().to_vec(), vec!["rent"]);
    let vm = runtime.viewmodel();
    let row = &vm.rows[0];
    assert_eq!(bracket_highlights(&row.title, &row.highlights), "Pay [rent]");
}

#[test]
fn typing_swallows_global_shortcuts() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    key(&mut runtime, "/");
    assert!(runtime.state().input_mode.is_typing());
    key(&mut runtime, "q");
    assert!(runtime.is_running());
    assert_eq!(runtime.state().search.query(), "q");

    key(&mut runtime, "esc");
    assert_eq!(runtime.state().input_mode, InputMode::Normal);
    key(&mut runtime, "q");
    assert!(!runtime.is_running());
}

#[test]
fn import_merges_through_the_backend() {
    let backend = seeded();
    let mut runtime = runtime_with(&Config::default(), &backend);

    let at = Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap();
    let payload = export_json(
        &[TodoList::new("work", "Work", at)],
        &[Task::new("w1", "work", "Send invoice", at)],
        at,
    )
    .unwrap();
    send(&mut runtime, Event::Import { payload });

    assert!(backend.task(&ItemId::new("w1")).is_some());
    assert_eq!(runtime.state().lists.len(), 2);
    assert_eq!(runtime.state().tasks.len(), 3);

    send(&mut runtime, Event::Import { payload: "{ nope".into() });
    assert!(runtime.is_running());
    assert_eq!(runtime.state().tasks.len(), 3);
}
