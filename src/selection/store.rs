//! Method-style facade over the selection reducer.
//!
//! [`SelectionStore`] owns one [`SelectionState`] for the lifetime of a view and
//! routes every call through [`reduce`], so the store and the reducer can never
//! disagree about a transition.

use super::reducer::{reduce, SelectionAction, SelectionPhase, SelectionState};
use crate::domain::{Identified, ItemId};

/// Selection state owned by a single list or search view.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    state: SelectionState,
}

impl SelectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an action through the reducer.
    pub fn dispatch(&mut self, action: SelectionAction) {
        let _span = tracing::trace_span!("selection_dispatch", action = ?action).entered();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    pub fn toggle(&mut self, id: impl Into<ItemId>) {
        self.dispatch(SelectionAction::Toggle(id.into()));
    }

    pub fn select(&mut self, id: impl Into<ItemId>) {
        self.dispatch(SelectionAction::Select(id.into()));
    }

    pub fn deselect(&mut self, id: impl Into<ItemId>) {
        self.dispatch(SelectionAction::Deselect(id.into()));
    }

    pub fn select_all(&mut self, ids: &[ItemId]) {
        self.dispatch(SelectionAction::SelectAll(ids.to_vec()));
    }

    pub fn deselect_all(&mut self) {
        self.dispatch(SelectionAction::DeselectAll);
    }

    pub fn enter_selection_mode(&mut self) {
        self.dispatch(SelectionAction::EnterSelectionMode);
    }

    pub fn exit_selection_mode(&mut self) {
        self.dispatch(SelectionAction::ExitSelectionMode);
    }

    /// Selects the inclusive range between `from` and `to` in `all_ids`.
    ///
    /// No-op when either endpoint is missing from `all_ids`.
    pub fn select_range(&mut self, from: &ItemId, to: &ItemId, all_ids: &[ItemId]) {
        self.dispatch(SelectionAction::SelectRange {
            from: from.clone(),
            to: to.clone(),
            all: all_ids.to_vec(),
        });
    }

    #[must_use]
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.state.is_selected(id)
    }

    /// Returns the members of `items` that are selected, in input order.
    ///
    /// # Examples
    ///
    /// ```
    /// use todo_core::domain::ItemId;
    /// use todo_core::selection::SelectionStore;
    ///
    /// let items = vec![ItemId::new("a"), ItemId::new("b"), ItemId::new("c")];
    /// let mut store = SelectionStore::new();
    /// store.select("c");
    /// store.select("a");
    ///
    /// let picked: Vec<&str> = store.get_selected(&items).iter().map(|i| i.as_str()).collect();
    /// assert_eq!(picked, vec!["a", "c"]);
    /// ```
    #[must_use]
    pub fn get_selected<'a, T: Identified>(&self, items: &'a [T]) -> Vec<&'a T> {
        items
            .iter()
            .filter(|item| self.state.is_selected(item.id()))
            .collect()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.state.selected_count()
    }

    #[must_use]
    pub const fn selection_mode(&self) -> bool {
        self.state.selection_mode()
    }

    #[must_use]
    pub const fn last_selected_id(&self) -> Option<&ItemId> {
        self.state.last_selected_id()
    }

    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        self.state.phase()
    }

    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_matches_reducer() {
        let mut store = SelectionStore::new();
        store.toggle("a");
        store.toggle("b");
        store.toggle("a");

        let expected = [
            SelectionAction::Toggle(ItemId::new("a")),
            SelectionAction::Toggle(ItemId::new("b")),
            SelectionAction::Toggle(ItemId::new("a")),
        ]
        .into_iter()
        .fold(SelectionState::new(), reduce);

        assert_eq!(store.state(), &expected);
        assert_eq!(store.selected_count(), 1);
        assert_eq!(store.last_selected_id(), Some(&ItemId::new("a")));
    }
}
