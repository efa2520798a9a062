//! Completion and workload statistics over lists and tasks.

use crate::domain::{ItemId, Priority, Task, TodoList};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Open tasks per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }
}

/// Per-list breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSummary {
    pub list_id: ItemId,
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
}

/// Snapshot of the whole workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub lists: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Completed / total in `[0, 1]`; `0.0` when there are no tasks.
    pub completion_rate: f64,
    pub open_by_priority: PriorityCounts,
    pub overdue: usize,
    /// One entry per list, in input order.
    pub per_list: Vec<ListSummary>,
    /// Tasks whose list is not among `lists`.
    pub orphaned_tasks: usize,
}

/// Summarizes `tasks` grouped by `lists`, judging overdue against `now`.
///
/// # Examples
///
/// ```
/// use todo_core::domain::{Task, TodoList};
/// use todo_core::reports::summarize;
///
/// let now = chrono::Utc::now();
/// let lists = vec![TodoList::new("l1", "Work", now)];
/// let tasks = vec![
///     Task::new("t1", "l1", "Write report", now).with_completed(true),
///     Task::new("t2", "l1", "Call client", now),
/// ];
///
/// let summary = summarize(&lists, &tasks, now);
/// assert_eq!(summary.completion_rate, 0.5);
/// assert_eq!(summary.per_list[0].completed, 1);
/// ```
#[must_use]
pub fn summarize(lists: &[TodoList], tasks: &[Task], now: DateTime<Utc>) -> Summary {
    let index: HashMap<&ItemId, usize> = lists.iter().enumerate().map(|(i, list)| (&list.id, i)).collect();
    let mut per_list: Vec<ListSummary> = lists
        .iter()
        .map(|list| ListSummary {
            list_id: list.id.clone(),
            name: list.name.clone(),
            total: 0,
            completed: 0,
            overdue: 0,
        })
        .collect();

    let mut completed_tasks = 0;
    let mut overdue = 0;
    let mut orphaned_tasks = 0;
    let mut open_by_priority = PriorityCounts::default();

    for task in tasks {
        let is_overdue = task.is_overdue(now);
        if task.completed {
            completed_tasks += 1;
        } else {
            open_by_priority.bump(task.priority);
        }
        if is_overdue {
            overdue += 1;
        }

        match index.get(&task.list_id) {
            Some(&i) => {
                let entry = &mut per_list[i];
                entry.total += 1;
                entry.completed += usize::from(task.completed);
                entry.overdue += usize::from(is_overdue);
            }
            None => orphaned_tasks += 1,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let completion_rate = if tasks.is_empty() {
        0.0
    } else {
        completed_tasks as f64 / tasks.len() as f64
    };

    Summary {
        lists: lists.len(),
        total_tasks: tasks.len(),
        completed_tasks,
        completion_rate,
        open_by_priority,
        overdue,
        per_list,
        orphaned_tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn empty_workspace() {
        let summary = summarize(&[], &[], Utc::now());
        assert_eq!(summary.total_tasks, 0);
        assert!(summary.completion_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn counts_priorities_overdue_and_orphans() {
        let now = Utc::now();
        let lists = vec![TodoList::new("l1", "Work", now), TodoList::new("l2", "Home", now)];
        let tasks = vec![
            Task::new("t1", "l1", "A", now).with_priority(Priority::High).with_due_date(now - Duration::days(1)),
            Task::new("t2", "l1", "B", now).with_priority(Priority::High).with_completed(true),
            Task::new("t3", "l2", "C", now).with_priority(Priority::Low),
            Task::new("t4", "gone", "D", now),
        ];

        let summary = summarize(&lists, &tasks, now);
        assert_eq!(summary.open_by_priority, PriorityCounts { low: 1, medium: 1, high: 1 });
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.orphaned_tasks, 1);
        assert_eq!(summary.per_list[0].total, 2);
        assert_eq!(summary.per_list[0].overdue, 1);
        assert_eq!(summary.per_list[1].total, 1);
    }
}
