//! Event handling and state transition logic.
//!
//! [`handle_event`] is the only place state changes in response to input,
//! backend answers and connectivity changes. It never performs I/O: side
//! effects come back as [`Action`]s for the runtime to execute.
//!
//! # Event Types
//!
//! - **Input**: `Key`, `Command`, `Char`, `ToggleItem`, `RangeSelect`, `SetFilters`
//! - **Timer**: `Tick` fires the search debounce and retries due queue entries
//! - **Backend**: `DataLoaded`, `LoadFailed`, `BatchApplied`, `BatchFailed`, `SearchCompleted`
//! - **Sync**: `ConnectivityChanged`, `ReplayFinished`, `ResolveConflict`
//! - **Transfer**: `Import`
//!
//! # Example
//!
//! ```
//! use todo_core::app::{handle_event, Action, Clock, Event};
//! use todo_core::Config;
//! use todo_core::storage::MemoryStore;
//!
//! let mut state = todo_core::initialize(&Config::default(), &MemoryStore::new())?;
//! let (_render, actions) = handle_event(&mut state, &Event::Key("q".parse()?), Clock::now())?;
//! assert_eq!(actions, vec![Action::Quit]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use super::clock::Clock;
use super::keymap::Command;
use super::modes::{InputMode, SearchFocus};
use crate::app::{Action, AppState};
use crate::backend::BatchReceipt;
use crate::domain::error::Result;
use crate::domain::{BatchMutation, ItemId, OpId, Task};
use crate::reports::import_json;
use crate::search::{Corpus, SearchFilters, SearchMode, SearchResult};
use crate::selection::{plan_bulk, BulkAction};
use crate::shortcuts::{Key, KeyChord};
use crate::sync::{ConflictChoice, ReplayReport};
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Everything the application reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key chord from the frontend, resolved through the shortcut stack.
    Key(KeyChord),
    /// A command issued directly, bypassing key resolution.
    Command(Command),
    /// Appends a character to the search query while typing.
    Char(char),
    /// Timer heartbeat.
    Tick,

    /// Toggles one item, e.g. from a checkbox click.
    ToggleItem(ItemId),
    /// Selects from the last selected item to this one, e.g. shift-click.
    RangeSelect(ItemId),
    /// Replaces the search filters.
    SetFilters(SearchFilters),

    DataLoaded {
        lists: Vec<crate::domain::TodoList>,
        tasks: Vec<Task>,
    },
    LoadFailed {
        message: String,
    },
    BatchApplied(BatchReceipt),
    /// A batch could not be delivered; its mutations go to the offline queue.
    BatchFailed {
        batch: BatchMutation,
        message: String,
    },
    /// Answer to a sequenced server search.
    SearchCompleted {
        seq: u64,
        result: std::result::Result<Vec<SearchResult>, String>,
    },

    ConnectivityChanged {
        online: bool,
    },
    ReplayFinished(ReplayReport),
    ResolveConflict {
        op_id: OpId,
        choice: ConflictChoice,
    },

    /// A JSON export document to merge into the data.
    Import {
        payload: String,
    },
}

/// Processes an event, mutates application state, and returns actions to execute.
///
/// The boolean is `true` when the view should be re-rendered. After every
/// event the shortcut context stack is re-synced with the modes, and a
/// [`Action::PersistRecent`] is appended when the recent-searches list changed.
///
/// # Errors
///
/// Returns [`crate::domain::TodoError::Queue`] when resolving an unknown
/// conflict and [`crate::domain::TodoError::Import`] for a rejected import.
/// State is left unchanged in both cases.
pub fn handle_event(state: &mut AppState, event: &Event, now: Clock) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = event_name(event)).entered();

    let (render, mut actions) = dispatch(state, event, now)?;

    state.sync_contexts();
    if state.search.take_recent_dirty() {
        actions.push(Action::PersistRecent);
    }

    Ok((render, actions))
}

#[allow(clippy::too_many_lines)]
fn dispatch(state: &mut AppState, event: &Event, now: Clock) -> Result<(bool, Vec<Action>)> {
    match event {
        Event::Key(chord) => {
            if let Some(command) = state.shortcuts.dispatch(chord).cloned() {
                return handle_command(state, &command, now);
            }
            if state.input_mode.is_typing() {
                if let Some(c) = typed_char(chord) {
                    return Ok(push_char(state, c, now.instant));
                }
            }
            tracing::trace!(chord = %chord, context = state.shortcuts.active_context(), "unbound key");
            Ok((false, vec![]))
        }
        Event::Command(command) => handle_command(state, command, now),
        Event::Char(c) => {
            if !state.input_mode.is_typing() {
                return Ok((false, vec![]));
            }
            Ok(push_char(state, *c, now.instant))
        }
        Event::Tick => {
            let mut actions = vec![];
            let had_deadline = state.search.next_deadline().is_some();
            if let Some(pending) = state.search.poll(now.instant) {
                actions.push(Action::RunSearch(pending));
            }
            if state.online && !state.queue.ready(now.wall).is_empty() {
                actions.push(Action::ReplayQueue);
            }
            let fired = had_deadline && state.search.next_deadline().is_none();
            Ok((fired, actions))
        }

        Event::ToggleItem(id) => {
            state.selection.toggle(id.clone());
            Ok((true, vec![]))
        }
        Event::RangeSelect(id) => {
            let from = state.selection.last_selected_id().cloned().unwrap_or_else(|| id.clone());
            let visible = state.visible_ids();
            state.selection.select_range(&from, id, &visible);
            Ok((true, vec![]))
        }
        Event::SetFilters(filters) => {
            let corpus = Corpus::new(&state.lists, &state.tasks);
            state.search.set_filters(*filters, now.instant, corpus);
            state.cursor = 0;
            Ok((true, vec![]))
        }

        Event::DataLoaded { lists, tasks } => {
            state.replace_data(lists.clone(), tasks.clone());
            Ok((true, vec![]))
        }
        Event::LoadFailed { message } => {
            tracing::warn!(error = %message, "loading data failed");
            state.status = Some(format!("load failed: {message}"));
            Ok((true, vec![]))
        }
        Event::BatchApplied(receipt) => {
            tracing::debug!(batch_id = %receipt.batch_id, applied = receipt.applied, skipped = receipt.skipped, "batch applied");
            state.status = Some(format!("{} change(s) saved", receipt.applied));
            Ok((true, vec![Action::LoadData]))
        }
        Event::BatchFailed { batch, message } => {
            tracing::warn!(batch_id = %batch.batch_id, error = %message, "batch failed, queueing for replay");
            enqueue_batch(state, batch, now.wall);
            state.online = false;
            state.status = Some(format!("offline: {} change(s) queued", batch.len()));
            Ok((true, vec![Action::PersistQueue]))
        }
        Event::SearchCompleted { seq, result } => {
            let accepted = state.search.complete(*seq, result.clone());
            if accepted {
                state.clamp_cursor();
            }
            Ok((accepted, vec![]))
        }

        Event::ConnectivityChanged { online } => {
            if state.online == *online {
                return Ok((false, vec![]));
            }
            state.online = *online;
            tracing::info!(online = online, queued = state.queue.len(), "connectivity changed");
            if !online {
                state.status = Some("offline: changes will be queued".into());
                return Ok((true, vec![]));
            }
            state.status = Some("back online".into());
            let mut actions = vec![];
            if !state.queue.is_empty() {
                actions.push(Action::ReplayQueue);
            }
            actions.push(Action::LoadData);
            Ok((true, actions))
        }
        Event::ReplayFinished(report) => {
            state.status = Some(format!(
                "sync: {} done, {} retrying, {} conflict(s), {} failed",
                report.completed + report.discarded,
                report.retrying,
                report.parked,
                report.dead_lettered
            ));
            Ok((true, vec![Action::PersistQueue, Action::LoadData]))
        }
        Event::ResolveConflict { op_id, choice } => {
            state.queue.resolve_conflict(op_id, *choice, now.wall)?;
            state.status = Some(format!("conflict on {op_id} resolved"));
            let mut actions = vec![Action::PersistQueue];
            if state.online && *choice == ConflictChoice::KeepMine {
                actions.push(Action::ReplayQueue);
            }
            Ok((true, actions))
        }

        Event::Import { payload } => {
            let document = import_json(payload)?;
            let (lists, tasks) = (document.lists.len(), document.tasks.len());
            let batch = document.into_batch();
            state.status = Some(format!("imported {lists} list(s), {tasks} task(s)"));
            Ok((true, submit(state, batch, now.wall)))
        }
    }
}

fn handle_command(state: &mut AppState, command: &Command, now: Clock) -> Result<(bool, Vec<Action>)> {
    tracing::debug!(command = ?command, "command");

    match command {
        Command::Quit => Ok((false, vec![Action::Quit])),
        Command::CursorDown => {
            state.move_cursor_down();
            Ok((true, vec![]))
        }
        Command::CursorUp => {
            state.move_cursor_up();
            Ok((true, vec![]))
        }
        Command::NextList => {
            state.next_view();
            Ok((true, vec![]))
        }
        Command::FocusSearch => {
            if state.input_mode == InputMode::Normal {
                let corpus = Corpus::new(&state.lists, &state.tasks);
                state.search.set_query("", now.instant, corpus);
                state.cursor = 0;
            }
            state.input_mode = InputMode::Search(SearchFocus::Typing);
            Ok((true, vec![]))
        }
        Command::FocusResults => {
            if state.search.query().trim().is_empty() {
                exit_search(state);
            } else {
                state.input_mode = InputMode::Search(SearchFocus::Navigating);
            }
            Ok((true, vec![]))
        }
        Command::ExitSearch => {
            exit_search(state);
            Ok((true, vec![]))
        }
        Command::Backspace => {
            let mut query = state.search.query().to_string();
            if query.pop().is_none() {
                return Ok((false, vec![]));
            }
            set_query(state, query, now.instant);
            Ok((true, vec![]))
        }
        Command::ToggleSearchMode => {
            let mode = match state.search.mode() {
                SearchMode::Client => SearchMode::Server,
                SearchMode::Server => SearchMode::Client,
            };
            let corpus = Corpus::new(&state.lists, &state.tasks);
            state.search.set_mode(mode, now.instant, corpus);
            state.status = Some(format!("{} search", if mode == SearchMode::Client { "client" } else { "server" }));
            Ok((true, vec![]))
        }
        Command::EnterSelectionMode => {
            state.selection.enter_selection_mode();
            Ok((true, vec![]))
        }
        Command::ExitSelectionMode => {
            state.selection.exit_selection_mode();
            Ok((true, vec![]))
        }
        Command::ToggleAtCursor => {
            let Some(id) = state.cursor_id() else {
                return Ok((false, vec![]));
            };
            state.selection.toggle(id);
            Ok((true, vec![]))
        }
        Command::RangeToCursor => {
            let Some(to) = state.cursor_id() else {
                return Ok((false, vec![]));
            };
            let from = state.selection.last_selected_id().cloned().unwrap_or_else(|| to.clone());
            let visible = state.visible_ids();
            state.selection.select_range(&from, &to, &visible);
            Ok((true, vec![]))
        }
        Command::SelectAll => {
            let visible = state.visible_ids();
            state.selection.select_all(&visible);
            Ok((true, vec![]))
        }
        Command::ClearSelection => {
            state.selection.deselect_all();
            state.selection.enter_selection_mode();
            Ok((true, vec![]))
        }
        Command::Bulk(action) => Ok((true, run_bulk(state, action, now.wall))),
    }
}

fn typed_char(chord: &KeyChord) -> Option<char> {
    let modifiers = chord.modifiers;
    if modifiers.ctrl || modifiers.alt || modifiers.meta {
        return None;
    }
    match chord.key {
        Key::Char(c) if modifiers.shift => c.to_uppercase().next(),
        Key::Char(c) => Some(c),
        Key::Space => Some(' '),
        _ => None,
    }
}

fn push_char(state: &mut AppState, c: char, now: Instant) -> (bool, Vec<Action>) {
    let mut query = state.search.query().to_string();
    query.push(c);
    set_query(state, query, now);
    (true, vec![])
}

fn set_query(state: &mut AppState, query: String, now: Instant) {
    let corpus = Corpus::new(&state.lists, &state.tasks);
    state.search.set_query(query, now, corpus);
    state.cursor = 0;
}

fn exit_search(state: &mut AppState) {
    tracing::debug!(query = %state.search.query(), "exiting search mode");
    state.search.clear();
    state.input_mode = InputMode::Normal;
    state.cursor = 0;
}

fn run_bulk(state: &mut AppState, action: &BulkAction, now: DateTime<Utc>) -> Vec<Action> {
    let batch = {
        let selected: Vec<&Task> = state.selection.get_selected(&state.tasks);
        if selected.is_empty() {
            state.status = Some("no tasks selected".into());
            return vec![];
        }
        plan_bulk(action, &selected)
    };

    state.selection.exit_selection_mode();
    if batch.is_empty() {
        state.status = Some("nothing to change".into());
        return vec![];
    }

    state.status = Some(format!(
        "{} change(s) {}",
        batch.len(),
        if state.online { "sent" } else { "queued" }
    ));
    submit(state, batch, now)
}

/// Sends `batch` when online, queues it otherwise, and applies it locally.
fn submit(state: &mut AppState, batch: BatchMutation, now: DateTime<Utc>) -> Vec<Action> {
    let action = if state.online {
        Action::SendBatch(batch.clone())
    } else {
        enqueue_batch(state, &batch, now);
        Action::PersistQueue
    };
    state.apply_local(&batch.mutations);
    vec![action]
}

fn enqueue_batch(state: &mut AppState, batch: &BatchMutation, enqueued_at: DateTime<Utc>) {
    for mutation in &batch.mutations {
        let base = state.version_of(mutation.target());
        state.queue.enqueue(mutation.clone(), base, enqueued_at);
    }
}

const fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Key(_) => "key",
        Event::Command(_) => "command",
        Event::Char(_) => "char",
        Event::Tick => "tick",
        Event::ToggleItem(_) => "toggle_item",
        Event::RangeSelect(_) => "range_select",
        Event::SetFilters(_) => "set_filters",
        Event::DataLoaded { .. } => "data_loaded",
        Event::LoadFailed { .. } => "load_failed",
        Event::BatchApplied(_) => "batch_applied",
        Event::BatchFailed { .. } => "batch_failed",
        Event::SearchCompleted { .. } => "search_completed",
        Event::ConnectivityChanged { .. } => "connectivity_changed",
        Event::ReplayFinished(_) => "replay_finished",
        Event::ResolveConflict { .. } => "resolve_conflict",
        Event::Import { .. } => "import",
    }
}
