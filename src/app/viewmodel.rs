//! View model types representing renderable state.
//!
//! View models are computed by `AppState::compute_viewmodel()` and contain no
//! logic, only display-ready data. The `Display` impl renders a plain-text
//! frame for the shell binary; highlights are shown in `[brackets]`.

use crate::domain::{ItemId, ItemKind};
use crate::search::{Highlight, MatchField, SearchMode};
use serde::Serialize;
use std::fmt;

/// Complete view model for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub header: String,
    pub rows: Vec<RowView>,
    /// Index of the cursor row, if there are rows.
    pub cursor: Option<usize>,
    /// Present while selection mode is on.
    pub selection: Option<SelectionBar>,
    /// Present while search mode is on.
    pub search: Option<SearchBar>,
    pub sync: SyncBanner,
    pub status: Option<String>,
    /// Bindings of the active shortcut context.
    pub footer: String,
}

/// One list row: a task, or a list when it appears in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: ItemId,
    pub kind: ItemKind,
    pub title: String,
    /// List name and priority for tasks, description for lists.
    pub detail: String,
    pub completed: bool,
    pub selected: bool,
    /// Title highlights only; description matches are not rendered in rows.
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionBar {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchBar {
    pub query: String,
    pub mode: SearchMode,
    pub loading: bool,
    pub error: Option<String>,
    /// Shown while the query is too short to search.
    pub recent: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncBanner {
    pub online: bool,
    pub pending: usize,
    pub conflicts: usize,
    pub dead_letters: usize,
}

/// Wraps highlighted character ranges of `text` in brackets.
#[must_use]
pub fn bracket_highlights(text: &str, highlights: &[Highlight]) -> String {
    let mut spans: Vec<(usize, usize)> = highlights
        .iter()
        .filter(|h| h.field == MatchField::Title)
        .map(|h| (h.start, h.end))
        .collect();
    spans.sort_unstable();

    let mut out = String::with_capacity(text.len() + spans.len() * 2);
    let mut spans = spans.into_iter().peekable();
    let mut open_until = None;

    for (i, c) in text.chars().enumerate() {
        if open_until == Some(i) {
            out.push(']');
            open_until = None;
        }
        if open_until.is_none() {
            while spans.peek().is_some_and(|&(start, _)| start < i) {
                spans.next();
            }
            if let Some(&(start, end)) = spans.peek() {
                if start == i && end > start {
                    out.push('[');
                    open_until = Some(end);
                    spans.next();
                }
            }
        }
        out.push(c);
    }
    if open_until.is_some() {
        out.push(']');
    }
    out
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.header)?;

        if let Some(search) = &self.search {
            let mode = match search.mode {
                SearchMode::Client => "client",
                SearchMode::Server => "server",
            };
            write!(f, "search ({mode}): {}", search.query)?;
            if search.loading {
                write!(f, "  [loading]")?;
            }
            writeln!(f)?;
            if let Some(error) = &search.error {
                writeln!(f, "  error: {error}")?;
            }
            if !search.recent.is_empty() {
                writeln!(f, "  recent: {}", search.recent.join(", "))?;
            }
        }

        if let Some(selection) = &self.selection {
            writeln!(f, "-- {} selected --", selection.count)?;
        }

        if self.rows.is_empty() {
            writeln!(f, "  (nothing to show)")?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let cursor = if self.cursor == Some(i) { '>' } else { ' ' };
            let mark = match (self.selection.is_some(), row.selected) {
                (true, true) => "(*) ",
                (true, false) => "( ) ",
                (false, _) => "",
            };
            let done = if row.completed { "x" } else { " " };
            let kind = match row.kind {
                ItemKind::Task => "",
                ItemKind::List => "list: ",
            };
            writeln!(
                f,
                "{cursor} {mark}[{done}] {kind}{}  {}  ({})",
                bracket_highlights(&row.title, &row.highlights),
                row.detail,
                row.id
            )?;
        }

        let sync = &self.sync;
        if !sync.online || sync.pending > 0 || sync.conflicts > 0 || sync.dead_letters > 0 {
            writeln!(
                f,
                "sync: {}  pending {}  conflicts {}  failed {}",
                if sync.online { "online" } else { "offline" },
                sync.pending,
                sync.conflicts,
                sync.dead_letters
            )?;
        }
        if let Some(status) = &self.status {
            writeln!(f, "status: {status}")?;
        }
        write!(f, "keys: {}", self.footer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(start: usize, end: usize) -> Highlight {
        Highlight { field: MatchField::Title, start, end }
    }

    #[test]
    fn brackets_each_span() {
        assert_eq!(bracket_highlights("aaaa", &[title(0, 2), title(2, 4)]), "[aa][aa]");
        assert_eq!(bracket_highlights("Buy milk", &[title(4, 8)]), "Buy [milk]");
    }

    #[test]
    fn description_spans_are_ignored() {
        let span = Highlight { field: MatchField::Description, start: 0, end: 3 };
        assert_eq!(bracket_highlights("Call", &[span]), "Call");
    }
}
