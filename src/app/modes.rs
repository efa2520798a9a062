//! Input and view mode state types for the application.
//!
//! - **Normal**: Navigation, selection and bulk commands
//! - **Search**: Query editing or result navigation
//!
//! View modes pick the base set of tasks shown when no search is active.
//!
//! # Example
//!
//! ```rust
//! use todo_core::app::modes::{InputMode, SearchFocus, ViewMode};
//!
//! let input_mode = InputMode::Search(SearchFocus::Typing);
//! let view_mode = ViewMode::AllTasks;
//! assert!(input_mode.is_search());
//! assert_ne!(view_mode, ViewMode::List("inbox".into()));
//! ```

use crate::domain::ItemId;

/// Focus state within search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    /// Keystrokes edit the query.
    Typing,
    /// Keystrokes move through and select results.
    Navigating,
}

/// Current input handling mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Search(SearchFocus),
}

impl InputMode {
    #[must_use]
    pub const fn is_search(self) -> bool {
        matches!(self, Self::Search(_))
    }

    #[must_use]
    pub const fn is_typing(self) -> bool {
        matches!(self, Self::Search(SearchFocus::Typing))
    }
}

/// Which tasks are listed outside search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Every task across lists.
    #[default]
    AllTasks,
    /// Tasks of one list.
    List(ItemId),
}
