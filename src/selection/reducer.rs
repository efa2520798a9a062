//! Pure selection transitions.
//!
//! Every change to a [`SelectionState`] goes through [`reduce`], which consumes
//! the old state and a [`SelectionAction`] and returns the new state. The
//! reducer is total: unknown ids are simply absent from the set, and a range
//! whose endpoints are not both in the reference list leaves the state as is.
//!
//! # States
//!
//! ```text
//!            enter_selection_mode
//!   Idle ─────────────────────────▶ Armed
//!    ▲  ▲                             │ select / toggle
//!    │  └──── exit / deselect ────────┤
//!    │                                ▼
//!    └──── deselect-to-empty ───── Active
//! ```

use crate::domain::ItemId;
use std::collections::HashSet;

/// Which of the three selection phases a state is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// Nothing selected, selection mode off.
    Idle,
    /// Selection mode entered explicitly, nothing selected yet.
    Armed,
    /// At least one item selected.
    Active,
}

/// Selected ids plus the selection-mode flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_ids: HashSet<ItemId>,
    selection_mode: bool,
    last_selected_id: Option<ItemId>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn selected_ids(&self) -> &HashSet<ItemId> {
        &self.selected_ids
    }

    #[must_use]
    pub const fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    #[must_use]
    pub const fn last_selected_id(&self) -> Option<&ItemId> {
        self.last_selected_id.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selected_ids.contains(id)
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected_ids.len()
    }

    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        match (self.selection_mode, self.selected_ids.is_empty()) {
            (false, _) => SelectionPhase::Idle,
            (true, true) => SelectionPhase::Armed,
            (true, false) => SelectionPhase::Active,
        }
    }

    fn sync_mode_with_size(&mut self) {
        self.selection_mode = !self.selected_ids.is_empty();
    }
}

/// Commands accepted by [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    /// Flips membership of one id.
    Toggle(ItemId),
    /// Adds one id (idempotent) and forces selection mode on.
    Select(ItemId),
    /// Removes one id (idempotent).
    Deselect(ItemId),
    /// Replaces the selection with exactly these ids.
    SelectAll(Vec<ItemId>),
    /// Clears everything.
    DeselectAll,
    /// Turns selection mode on without selecting anything.
    EnterSelectionMode,
    /// Clears the selection and turns selection mode off.
    ExitSelectionMode,
    /// Unions the inclusive slice of `all` between `from` and `to`.
    SelectRange {
        from: ItemId,
        to: ItemId,
        all: Vec<ItemId>,
    },
}

/// Applies one action to a selection state.
///
/// # Examples
///
/// ```
/// use todo_core::domain::ItemId;
/// use todo_core::selection::{reduce, SelectionAction, SelectionState};
///
/// let state = reduce(SelectionState::new(), SelectionAction::Toggle(ItemId::new("t1")));
/// assert!(state.is_selected(&ItemId::new("t1")));
/// assert!(state.selection_mode());
///
/// let state = reduce(state, SelectionAction::Toggle(ItemId::new("t1")));
/// assert_eq!(state.selected_count(), 0);
/// assert!(!state.selection_mode());
/// ```
#[must_use]
pub fn reduce(mut state: SelectionState, action: SelectionAction) -> SelectionState {
    match action {
        SelectionAction::Toggle(id) => {
            if !state.selected_ids.remove(&id) {
                state.selected_ids.insert(id.clone());
            }
            state.last_selected_id = Some(id);
            state.sync_mode_with_size();
        }
        SelectionAction::Select(id) => {
            state.selected_ids.insert(id.clone());
            state.last_selected_id = Some(id);
            state.selection_mode = true;
        }
        SelectionAction::Deselect(id) => {
            state.selected_ids.remove(&id);
            state.sync_mode_with_size();
        }
        SelectionAction::SelectAll(ids) => {
            state.last_selected_id = ids.last().cloned();
            state.selected_ids = ids.into_iter().collect();
            state.sync_mode_with_size();
        }
        SelectionAction::DeselectAll | SelectionAction::ExitSelectionMode => {
            state.selected_ids.clear();
            state.last_selected_id = None;
            state.selection_mode = false;
        }
        SelectionAction::EnterSelectionMode => {
            state.selection_mode = true;
        }
        SelectionAction::SelectRange { from, to, all } => {
            let from_pos = all.iter().position(|id| *id == from);
            let to_pos = all.iter().position(|id| *id == to);

            let (Some(a), Some(b)) = (from_pos, to_pos) else {
                tracing::debug!(from = %from, to = %to, "range endpoint not in reference list, ignoring");
                return state;
            };

            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            state.selected_ids.extend(all[start..=end].iter().cloned());
            state.last_selected_id = Some(to);
            state.selection_mode = true;
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|s| ItemId::new(*s)).collect()
    }

    fn id(raw: &str) -> ItemId {
        ItemId::new(raw)
    }

    #[test]
    fn select_sets_mode_and_last_id() {
        let state = reduce(SelectionState::new(), SelectionAction::Select(id("a")));
        assert_eq!(state.phase(), SelectionPhase::Active);
        assert_eq!(state.last_selected_id(), Some(&id("a")));

        let again = reduce(state.clone(), SelectionAction::Select(id("a")));
        assert_eq!(again, state);
    }

    #[test]
    fn deselect_to_empty_returns_to_idle() {
        let state = reduce(SelectionState::new(), SelectionAction::Select(id("a")));
        let state = reduce(state, SelectionAction::Deselect(id("a")));
        assert_eq!(state.phase(), SelectionPhase::Idle);

        let unchanged = reduce(state.clone(), SelectionAction::Deselect(id("zzz")));
        assert_eq!(unchanged, state);
    }

    #[test]
    fn armed_state_transitions() {
        let armed = reduce(SelectionState::new(), SelectionAction::EnterSelectionMode);
        assert_eq!(armed.phase(), SelectionPhase::Armed);
        assert_eq!(armed.selected_count(), 0);

        let active = reduce(armed.clone(), SelectionAction::Toggle(id("a")));
        assert_eq!(active.phase(), SelectionPhase::Active);

        let idle = reduce(armed.clone(), SelectionAction::Deselect(id("a")));
        assert_eq!(idle.phase(), SelectionPhase::Idle);

        let exited = reduce(armed, SelectionAction::ExitSelectionMode);
        assert_eq!(exited.phase(), SelectionPhase::Idle);
    }

    #[test]
    fn select_all_replaces_and_tracks_last() {
        let state = reduce(SelectionState::new(), SelectionAction::Select(id("old")));
        let state = reduce(state, SelectionAction::SelectAll(ids(&["a", "b", "c"])));
        assert_eq!(state.selected_count(), 3);
        assert!(!state.is_selected(&id("old")));
        assert_eq!(state.last_selected_id(), Some(&id("c")));

        let state = reduce(state, SelectionAction::SelectAll(vec![]));
        assert_eq!(state.phase(), SelectionPhase::Idle);
        assert_eq!(state.last_selected_id(), None);
    }

    #[test]
    fn range_unions_with_existing_selection() {
        let all = ids(&["t1", "t2", "t3", "t4", "t5"]);
        let state = reduce(SelectionState::new(), SelectionAction::Select(id("t5")));
        let state = reduce(
            state,
            SelectionAction::SelectRange { from: id("t3"), to: id("t1"), all },
        );

        let mut selected: Vec<_> = state.selected_ids().iter().map(ItemId::as_str).collect();
        selected.sort_unstable();
        assert_eq!(selected, vec!["t1", "t2", "t3", "t5"]);
        assert_eq!(state.last_selected_id(), Some(&id("t1")));
    }

    #[test]
    fn range_with_missing_endpoint_is_noop() {
        let all = ids(&["t1", "t2", "t3"]);
        let state = reduce(
            SelectionState::new(),
            SelectionAction::SelectRange { from: id("missing"), to: id("t2"), all },
        );
        assert_eq!(state, SelectionState::new());
    }

    #[test]
    fn range_of_single_item_selects_it() {
        let all = ids(&["t1", "t2"]);
        let state = reduce(
            SelectionState::new(),
            SelectionAction::SelectRange { from: id("t2"), to: id("t2"), all },
        );
        assert_eq!(state.selected_count(), 1);
        assert!(state.selection_mode());
    }
}
