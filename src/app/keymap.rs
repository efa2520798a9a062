//! Commands reachable from the keyboard and their default bindings.
//!
//! | Context     | Modal | Purpose                                  |
//! |-------------|-------|------------------------------------------|
//! | `global`    | no    | Navigation, search, entering selection   |
//! | `selection` | no    | Toggling, ranges and bulk actions        |
//! | `search`    | yes   | Query editing; blocks everything beneath |
//! | `results`   | no    | Navigating search results                |

use crate::domain::error::Result;
use crate::domain::Priority;
use crate::selection::BulkAction;
use crate::shortcuts::{ShortcutRegistry, GLOBAL_CONTEXT};

pub const SELECTION_CONTEXT: &str = "selection";
pub const SEARCH_CONTEXT: &str = "search";
pub const RESULTS_CONTEXT: &str = "results";

/// Something a key chord can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    CursorDown,
    CursorUp,
    /// Cycle the list filter: all tasks, then each list in turn.
    NextList,
    FocusSearch,
    FocusResults,
    ExitSearch,
    /// Delete the last query character.
    Backspace,
    /// Switch between client and server search.
    ToggleSearchMode,
    EnterSelectionMode,
    ExitSelectionMode,
    ToggleAtCursor,
    /// Select from the last selected row to the cursor.
    RangeToCursor,
    SelectAll,
    ClearSelection,
    Bulk(BulkAction),
}

/// Registry with every default binding installed.
///
/// # Errors
///
/// Returns [`crate::domain::TodoError::Shortcut`] if a binding below is
/// malformed or bound twice.
pub fn default_registry() -> Result<ShortcutRegistry<Command>> {
    let mut registry = ShortcutRegistry::new();
    registry.define_context(SELECTION_CONTEXT, false);
    registry.define_context(SEARCH_CONTEXT, true);
    registry.define_context(RESULTS_CONTEXT, false);

    let bindings: [(&str, &str, Command); 26] = [
        (GLOBAL_CONTEXT, "q", Command::Quit),
        (GLOBAL_CONTEXT, "ctrl+c", Command::Quit),
        (GLOBAL_CONTEXT, "j", Command::CursorDown),
        (GLOBAL_CONTEXT, "down", Command::CursorDown),
        (GLOBAL_CONTEXT, "k", Command::CursorUp),
        (GLOBAL_CONTEXT, "up", Command::CursorUp),
        (GLOBAL_CONTEXT, "tab", Command::NextList),
        (GLOBAL_CONTEXT, "/", Command::FocusSearch),
        (GLOBAL_CONTEXT, "v", Command::EnterSelectionMode),
        (GLOBAL_CONTEXT, "ctrl+a", Command::SelectAll),
        (SELECTION_CONTEXT, "space", Command::ToggleAtCursor),
        (SELECTION_CONTEXT, "shift+space", Command::RangeToCursor),
        (SELECTION_CONTEXT, "esc", Command::ExitSelectionMode),
        (SELECTION_CONTEXT, "x", Command::ClearSelection),
        (SELECTION_CONTEXT, "c", Command::Bulk(BulkAction::Complete)),
        (SELECTION_CONTEXT, "u", Command::Bulk(BulkAction::Uncomplete)),
        (SELECTION_CONTEXT, "d", Command::Bulk(BulkAction::Delete)),
        (SELECTION_CONTEXT, "1", Command::Bulk(BulkAction::SetPriority { priority: Priority::Low })),
        (SELECTION_CONTEXT, "2", Command::Bulk(BulkAction::SetPriority { priority: Priority::Medium })),
        (SELECTION_CONTEXT, "3", Command::Bulk(BulkAction::SetPriority { priority: Priority::High })),
        (SEARCH_CONTEXT, "esc", Command::ExitSearch),
        (SEARCH_CONTEXT, "enter", Command::FocusResults),
        (SEARCH_CONTEXT, "backspace", Command::Backspace),
        (SEARCH_CONTEXT, "ctrl+s", Command::ToggleSearchMode),
        (RESULTS_CONTEXT, "/", Command::FocusSearch),
        (RESULTS_CONTEXT, "esc", Command::ExitSearch),
    ];

    for (context, chord, command) in bindings {
        registry.register(context, chord.parse()?, command)?;
    }

    tracing::debug!("default shortcuts installed");
    Ok(registry)
}
