//! Application state and view model computation.
//!
//! [`AppState`] is the single source of truth for everything a frontend
//! shows: the loaded lists and tasks, the cursor, the selection, the search
//! session, the offline queue and the shortcut context stack. The event
//! handler mutates it; [`AppState::compute_viewmodel`] turns a snapshot of it
//! into a [`ViewModel`].
//!
//! # Rows
//!
//! Outside search mode the rows are the tasks of the current [`ViewMode`].
//! Inside search mode they are the search results, which may include lists.
//! Cursor, range selection and select-all always operate on the rows that are
//! currently visible.

use super::keymap::{Command, RESULTS_CONTEXT, SEARCH_CONTEXT, SELECTION_CONTEXT};
use super::modes::{InputMode, SearchFocus, ViewMode};
use super::viewmodel::{RowView, SearchBar, SelectionBar, SyncBanner, ViewModel};
use crate::domain::{Identified, ItemId, ItemKind, Mutation, Task, TodoList};
use crate::search::{Corpus, SearchItem, SearchSession};
use crate::selection::{BulkAction, SelectionStore};
use crate::shortcuts::ShortcutRegistry;
use crate::sync::OfflineQueue;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Central application state container.
#[derive(Debug)]
pub struct AppState {
    /// Lists as last loaded, plus local optimistic edits.
    pub lists: Vec<TodoList>,

    /// Tasks as last loaded, plus local optimistic edits.
    pub tasks: Vec<Task>,

    pub input_mode: InputMode,
    pub view_mode: ViewMode,

    /// Zero-based index into the visible rows. Wraps during navigation.
    pub cursor: usize,

    pub selection: SelectionStore,
    pub search: SearchSession,
    pub queue: OfflineQueue,
    pub shortcuts: ShortcutRegistry<Command>,

    /// Whether the data layer is believed reachable. Writes made while
    /// offline go to the queue instead of the backend.
    pub online: bool,

    /// Set once the first load has completed.
    pub loaded: bool,

    /// One-line message for the status bar.
    pub status: Option<String>,
}

impl AppState {
    #[must_use]
    pub fn new(search: SearchSession, queue: OfflineQueue, shortcuts: ShortcutRegistry<Command>) -> Self {
        Self {
            lists: Vec::new(),
            tasks: Vec::new(),
            input_mode: InputMode::Normal,
            view_mode: ViewMode::AllTasks,
            cursor: 0,
            selection: SelectionStore::new(),
            search,
            queue,
            shortcuts,
            online: true,
            loaded: false,
            status: None,
        }
    }

    #[must_use]
    pub fn corpus(&self) -> Corpus<'_> {
        Corpus::new(&self.lists, &self.tasks)
    }

    #[must_use]
    pub fn task(&self, id: &ItemId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    #[must_use]
    pub fn list(&self, id: &ItemId) -> Option<&TodoList> {
        self.lists.iter().find(|l| l.id == *id)
    }

    /// Version of the entity `id` as last seen, used as an operation's base.
    #[must_use]
    pub fn version_of(&self, id: &ItemId) -> Option<DateTime<Utc>> {
        self.task(id)
            .map(|t| t.updated_at)
            .or_else(|| self.list(id).map(|l| l.updated_at))
    }

    /// Tasks belonging to the current view, in load order.
    #[must_use]
    pub fn tasks_in_view(&self) -> Vec<&Task> {
        match &self.view_mode {
            ViewMode::AllTasks => self.tasks.iter().collect(),
            ViewMode::List(list_id) => self.tasks.iter().filter(|t| t.list_id == *list_id).collect(),
        }
    }

    /// Ids of the visible rows, in display order.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<ItemId> {
        if self.input_mode.is_search() {
            self.search.results().iter().map(|r| r.id().clone()).collect()
        } else {
            self.tasks_in_view().into_iter().map(|t| t.id.clone()).collect()
        }
    }

    fn row_count(&self) -> usize {
        if self.input_mode.is_search() {
            self.search.results().len()
        } else {
            self.tasks_in_view().len()
        }
    }

    /// Id of the row under the cursor.
    #[must_use]
    pub fn cursor_id(&self) -> Option<ItemId> {
        self.visible_ids().into_iter().nth(self.cursor)
    }

    pub fn move_cursor_down(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % count;
    }

    pub fn move_cursor_up(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 { count - 1 } else { self.cursor - 1 };
    }

    /// Keeps the cursor inside the visible rows.
    pub fn clamp_cursor(&mut self) {
        let count = self.row_count();
        self.cursor = if count == 0 { 0 } else { self.cursor.min(count - 1) };
    }

    /// Cycles the view: all tasks, then each list in load order, then back.
    pub fn next_view(&mut self) {
        self.view_mode = match &self.view_mode {
            ViewMode::AllTasks => self
                .lists
                .first()
                .map_or(ViewMode::AllTasks, |l| ViewMode::List(l.id.clone())),
            ViewMode::List(current) => {
                let position = self.lists.iter().position(|l| l.id == *current);
                position
                    .and_then(|p| self.lists.get(p + 1))
                    .map_or(ViewMode::AllTasks, |l| ViewMode::List(l.id.clone()))
            }
        };
        self.cursor = 0;
    }

    /// Replaces the loaded data.
    ///
    /// Selected ids that no longer exist are dropped, a view pointing at a
    /// deleted list falls back to all tasks, and client-mode search results
    /// are recomputed.
    pub fn replace_data(&mut self, lists: Vec<TodoList>, tasks: Vec<Task>) {
        let _span = tracing::debug_span!("replace_data", lists = lists.len(), tasks = tasks.len()).entered();

        self.lists = lists;
        self.tasks = tasks;
        self.loaded = true;

        let known: HashSet<&ItemId> = self
            .lists
            .iter()
            .map(|l| &l.id)
            .chain(self.tasks.iter().map(|t| &t.id))
            .collect();
        let stale: Vec<ItemId> = self
            .selection
            .state()
            .selected_ids()
            .iter()
            .filter(|id| !known.contains(id))
            .cloned()
            .collect();
        if !stale.is_empty() {
            tracing::debug!(dropped = stale.len(), "pruning selection of removed items");
        }
        for id in stale {
            self.selection.deselect(id);
        }

        if let ViewMode::List(list_id) = &self.view_mode {
            if !known.contains(list_id) {
                self.view_mode = ViewMode::AllTasks;
            }
        }

        self.refresh_search();
        self.clamp_cursor();
    }

    /// Recomputes client-mode search results against the current data.
    pub fn refresh_search(&mut self) {
        let corpus = Corpus::new(&self.lists, &self.tasks);
        self.search.refresh_client(corpus);
    }

    /// Applies mutations to the local copy ahead of the backend.
    ///
    /// Versions are left untouched; the next load brings the authoritative
    /// ones.
    pub fn apply_local(&mut self, mutations: &[Mutation]) {
        for mutation in mutations {
            match mutation {
                Mutation::Complete { id, completed } => {
                    if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                        task.completed = *completed;
                    }
                }
                Mutation::SetPriority { id, priority } => {
                    if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                        task.priority = *priority;
                    }
                }
                Mutation::Move { id, to_list } => {
                    if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                        task.list_id = to_list.clone();
                    }
                }
                Mutation::Delete { id } => {
                    self.tasks.retain(|t| t.id != *id && t.list_id != *id);
                    self.lists.retain(|l| l.id != *id);
                }
                Mutation::UpsertList { list } => match self.lists.iter_mut().find(|l| l.id == list.id) {
                    Some(existing) => *existing = list.clone(),
                    None => self.lists.push(list.clone()),
                },
                Mutation::UpsertTask { task } => match self.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(existing) => *existing = task.clone(),
                    None => self.tasks.push(task.clone()),
                },
            }
        }
        self.refresh_search();
        self.clamp_cursor();
    }

    /// Makes the shortcut context stack mirror the current modes.
    ///
    /// Order from bottom to top is `global`, `selection`, then `results` or
    /// the modal `search` context.
    pub fn sync_contexts(&mut self) {
        let wanted = [
            (SELECTION_CONTEXT, self.selection.selection_mode()),
            (RESULTS_CONTEXT, self.input_mode == InputMode::Search(SearchFocus::Navigating)),
            (SEARCH_CONTEXT, self.input_mode.is_typing()),
        ];

        let current: Vec<&str> = self.shortcuts.stack().iter().skip(1).map(String::as_str).collect();
        let target: Vec<&str> = wanted.iter().filter(|(_, on)| *on).map(|(name, _)| *name).collect();
        if current == target {
            return;
        }

        for (name, _) in wanted {
            while self.shortcuts.remove_context(name) {}
        }
        for name in target {
            if let Err(e) = self.shortcuts.push_context(name) {
                tracing::warn!(context = name, error = %e, "failed to activate shortcut context");
            }
        }
        tracing::trace!(active = self.shortcuts.active_context(), "shortcut contexts synced");
    }

    /// Computes a renderable view model from the current state.
    #[must_use]
    pub fn compute_viewmodel(&self) -> ViewModel {
        let rows: Vec<RowView> = if self.input_mode.is_search() {
            self.search
                .results()
                .iter()
                .map(|result| self.result_row(&result.item, &result.highlights))
                .collect()
        } else {
            self.tasks_in_view()
                .into_iter()
                .map(|task| self.task_row(task, &[]))
                .collect()
        };

        let cursor = (!rows.is_empty()).then_some(self.cursor.min(rows.len().saturating_sub(1)));

        ViewModel {
            header: self.compute_header(rows.len()),
            rows,
            cursor,
            selection: self.selection.selection_mode().then(|| SelectionBar {
                count: self.selection.selected_count(),
            }),
            search: self.compute_search_bar(),
            sync: SyncBanner {
                online: self.online,
                pending: self.queue.len(),
                conflicts: self.queue.conflicts().len(),
                dead_letters: self.queue.dead_letters().len(),
            },
            status: self.status.clone(),
            footer: self.compute_footer(),
        }
    }

    fn task_row(&self, task: &Task, highlights: &[crate::search::Highlight]) -> RowView {
        let list_name = self
            .list(&task.list_id)
            .map_or_else(|| task.list_id.to_string(), |l| l.name.clone());
        RowView {
            id: task.id.clone(),
            kind: ItemKind::Task,
            title: task.title.clone(),
            detail: format!("{list_name} · {}", task.priority.as_str()),
            completed: task.completed,
            selected: self.selection.is_selected(&task.id),
            highlights: highlights.to_vec(),
        }
    }

    fn result_row(&self, item: &SearchItem, highlights: &[crate::search::Highlight]) -> RowView {
        match item {
            SearchItem::Task(task) => self.task_row(task, highlights),
            SearchItem::List(list) => RowView {
                id: list.id.clone(),
                kind: ItemKind::List,
                title: list.name.clone(),
                detail: list.description.clone().unwrap_or_default(),
                completed: false,
                selected: self.selection.is_selected(&list.id),
                highlights: highlights.to_vec(),
            },
        }
    }

    fn compute_header(&self, count: usize) -> String {
        if self.input_mode.is_search() {
            return format!("Search results ({count})");
        }
        match &self.view_mode {
            ViewMode::AllTasks => format!("All tasks ({count})"),
            ViewMode::List(id) => {
                let name = self.list(id).map_or(id.as_str(), |l| l.name.as_str());
                format!("{name} ({count})")
            }
        }
    }

    fn compute_search_bar(&self) -> Option<SearchBar> {
        if !self.input_mode.is_search() {
            return None;
        }
        let searchable = self.search.request().is_searchable();
        Some(SearchBar {
            query: self.search.query().to_string(),
            mode: self.search.mode(),
            loading: self.search.is_loading(),
            error: self.search.error().map(str::to_string),
            recent: if searchable {
                Vec::new()
            } else {
                self.search.recent().entries().to_vec()
            },
        })
    }

    fn compute_footer(&self) -> String {
        let context = self.shortcuts.active_context();
        self.shortcuts
            .bindings(context)
            .into_iter()
            .map(|(chord, command)| format!("{chord}: {}", command_label(command)))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

fn command_label(command: &Command) -> String {
    match command {
        Command::Quit => "quit".into(),
        Command::CursorDown => "down".into(),
        Command::CursorUp => "up".into(),
        Command::NextList => "next list".into(),
        Command::FocusSearch => "search".into(),
        Command::FocusResults => "results".into(),
        Command::ExitSearch => "close search".into(),
        Command::Backspace => "delete".into(),
        Command::ToggleSearchMode => "client/server".into(),
        Command::EnterSelectionMode => "select".into(),
        Command::ExitSelectionMode => "done".into(),
        Command::ToggleAtCursor => "toggle".into(),
        Command::RangeToCursor => "range".into(),
        Command::SelectAll => "all".into(),
        Command::ClearSelection => "clear".into(),
        Command::Bulk(BulkAction::Complete) => "complete".into(),
        Command::Bulk(BulkAction::Uncomplete) => "reopen".into(),
        Command::Bulk(BulkAction::Delete) => "delete".into(),
        Command::Bulk(BulkAction::MoveTo { list_id }) => format!("move to {list_id}"),
        Command::Bulk(BulkAction::SetPriority { priority }) => format!("{} priority", priority.as_str()),
    }
}
