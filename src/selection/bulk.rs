//! Bulk actions issued from the selection toolbar.
//!
//! [`plan_bulk`] turns a toolbar action and the currently selected tasks into a
//! [`BatchMutation`]. Mutations that would not change anything (completing an
//! already completed task, moving a task into the list it is already in) are
//! left out so the batch only carries real writes.

use crate::domain::{BatchMutation, ItemId, Mutation, Priority, Task};
use serde::{Deserialize, Serialize};

/// Actions offered by the bulk-action toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    Complete,
    Uncomplete,
    Delete,
    MoveTo { list_id: ItemId },
    SetPriority { priority: Priority },
}

/// Builds the batch of mutations for `action` over `selected`.
///
/// # Examples
///
/// ```
/// use todo_core::domain::Task;
/// use todo_core::selection::{plan_bulk, BulkAction};
///
/// let now = chrono::Utc::now();
/// let open = Task::new("t1", "l1", "Write report", now);
/// let done = Task::new("t2", "l1", "Call client", now).with_completed(true);
///
/// let batch = plan_bulk(&BulkAction::Complete, &[&open, &done]);
/// assert_eq!(batch.len(), 1);
/// ```
#[must_use]
pub fn plan_bulk(action: &BulkAction, selected: &[&Task]) -> BatchMutation {
    let mutations: Vec<Mutation> = selected
        .iter()
        .filter_map(|task| mutation_for(action, task))
        .collect();

    tracing::debug!(
        action = ?action,
        selected = selected.len(),
        planned = mutations.len(),
        "bulk batch planned"
    );

    BatchMutation::new(mutations)
}

fn mutation_for(action: &BulkAction, task: &Task) -> Option<Mutation> {
    match action {
        BulkAction::Complete if !task.completed => Some(Mutation::Complete {
            id: task.id.clone(),
            completed: true,
        }),
        BulkAction::Uncomplete if task.completed => Some(Mutation::Complete {
            id: task.id.clone(),
            completed: false,
        }),
        BulkAction::Delete => Some(Mutation::Delete { id: task.id.clone() }),
        BulkAction::MoveTo { list_id } if task.list_id != *list_id => Some(Mutation::Move {
            id: task.id.clone(),
            to_list: list_id.clone(),
        }),
        BulkAction::SetPriority { priority } if task.priority != *priority => {
            Some(Mutation::SetPriority {
                id: task.id.clone(),
                priority: *priority,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tasks() -> Vec<Task> {
        let now = Utc::now();
        vec![
            Task::new("t1", "inbox", "Buy milk", now),
            Task::new("t2", "work", "Write report", now).with_priority(Priority::High),
            Task::new("t3", "inbox", "Call mom", now).with_completed(true),
        ]
    }

    #[test]
    fn delete_targets_every_selected_task() {
        let tasks = tasks();
        let refs: Vec<&Task> = tasks.iter().collect();
        let batch = plan_bulk(&BulkAction::Delete, &refs);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn move_skips_tasks_already_in_target() {
        let tasks = tasks();
        let refs: Vec<&Task> = tasks.iter().collect();
        let batch = plan_bulk(&BulkAction::MoveTo { list_id: ItemId::new("work") }, &refs);
        let targets: Vec<&str> = batch.mutations.iter().map(|m| m.target().as_str()).collect();
        assert_eq!(targets, vec!["t1", "t3"]);
    }

    #[test]
    fn priority_and_completion_skip_noops() {
        let tasks = tasks();
        let refs: Vec<&Task> = tasks.iter().collect();

        let batch = plan_bulk(&BulkAction::SetPriority { priority: Priority::High }, &refs);
        assert_eq!(batch.len(), 2);

        let batch = plan_bulk(&BulkAction::Uncomplete, &refs);
        assert_eq!(batch.mutations, vec![Mutation::Complete { id: ItemId::new("t3"), completed: false }]);
    }
}
