//! In-process [`DataLayer`] used by the shell binary and tests.
//!
//! Behaves like a remote backend in the ways the core cares about: writes bump
//! `updated_at`, op ids and batch ids are remembered so replays are harmless,
//! stale base versions are reported as conflicts, and the whole thing can be
//! switched unreachable to simulate going offline.

use super::data_layer::{BatchReceipt, DataLayer};
use crate::domain::error::{Result, TodoError};
use crate::domain::{BatchMutation, ItemId, Mutation, OpId, Task, TodoList};
use crate::search::{search_request, Corpus, SearchHit, SearchRequest};
use crate::sync::{QueuedOperation, ReplayOutcome};
use chrono::{DateTime, Duration, Utc};
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
struct Collections {
    lists: BTreeMap<ItemId, TodoList>,
    tasks: BTreeMap<ItemId, Task>,
    applied_ops: HashSet<OpId>,
    receipts: HashMap<OpId, BatchReceipt>,
    last_write: Option<DateTime<Utc>>,
}

impl Collections {
    /// Strictly increasing write timestamp.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_write {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_write = Some(stamp);
        stamp
    }

    fn updated_at(&self, id: &ItemId) -> Option<DateTime<Utc>> {
        self.tasks
            .get(id)
            .map(|task| task.updated_at)
            .or_else(|| self.lists.get(id).map(|list| list.updated_at))
    }

    /// Applies one mutation. Returns `false` when the target does not exist.
    fn apply(&mut self, mutation: Mutation) -> bool {
        let stamp = self.stamp();
        match mutation {
            Mutation::Complete { id, completed } => self.tasks.get_mut(&id).is_some_and(|task| {
                task.completed = completed;
                task.updated_at = stamp;
                true
            }),
            Mutation::SetPriority { id, priority } => self.tasks.get_mut(&id).is_some_and(|task| {
                task.priority = priority;
                task.updated_at = stamp;
                true
            }),
            Mutation::Move { id, to_list } => {
                if !self.lists.contains_key(&to_list) {
                    return false;
                }
                self.tasks.get_mut(&id).is_some_and(|task| {
                    task.list_id = to_list;
                    task.updated_at = stamp;
                    true
                })
            }
            Mutation::Delete { id } => {
                if self.tasks.remove(&id).is_some() {
                    return true;
                }
                if self.lists.remove(&id).is_some() {
                    self.tasks.retain(|_, task| task.list_id != id);
                    return true;
                }
                false
            }
            Mutation::UpsertList { list } => {
                self.lists.insert(list.id.clone(), list);
                true
            }
            Mutation::UpsertTask { task } => {
                if !self.lists.contains_key(&task.list_id) {
                    return false;
                }
                self.tasks.insert(task.id.clone(), task);
                true
            }
        }
    }
}

/// Reference data layer holding everything in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    data: RefCell<Collections>,
    reachable: Cell<bool>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: RefCell::new(Collections::default()),
            reachable: Cell::new(true),
        }
    }

    /// Seeds the backend with existing lists and tasks.
    #[must_use]
    pub fn with_data(lists: Vec<TodoList>, tasks: Vec<Task>) -> Self {
        let backend = Self::new();
        {
            let mut data = backend.data.borrow_mut();
            data.lists = lists.into_iter().map(|list| (list.id.clone(), list)).collect();
            data.tasks = tasks.into_iter().map(|task| (task.id.clone(), task)).collect();
        }
        backend
    }

    /// Simulates losing or regaining the connection.
    pub fn set_reachable(&self, reachable: bool) {
        tracing::debug!(reachable = reachable, "in-memory backend reachability changed");
        self.reachable.set(reachable);
    }

    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable.get()
    }

    /// Applies `mutation` directly, as another client would.
    pub fn write_from_elsewhere(&self, mutation: Mutation) -> bool {
        self.data.borrow_mut().apply(mutation)
    }

    #[must_use]
    pub fn task(&self, id: &ItemId) -> Option<Task> {
        self.data.borrow().tasks.get(id).cloned()
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.get() {
            Ok(())
        } else {
            Err(TodoError::Backend("data layer unreachable".to_string()))
        }
    }

    fn lists_now(&self) -> Result<Vec<TodoList>> {
        self.ensure_reachable()?;
        Ok(self.data.borrow().lists.values().cloned().collect())
    }

    fn tasks_now(&self) -> Result<Vec<Task>> {
        self.ensure_reachable()?;
        Ok(self.data.borrow().tasks.values().cloned().collect())
    }

    fn apply_batch_now(&self, batch: BatchMutation) -> Result<BatchReceipt> {
        self.ensure_reachable()?;
        let _span = tracing::debug_span!("memory_apply_batch", batch_id = %batch.batch_id.as_str(), size = batch.len()).entered();

        let mut data = self.data.borrow_mut();
        if let Some(receipt) = data.receipts.get(&batch.batch_id) {
            tracing::debug!("batch already applied");
            return Ok(receipt.clone());
        }

        let total = batch.len();
        let applied = batch.mutations.into_iter().map(|m| data.apply(m)).filter(|&ok| ok).count();
        let receipt = BatchReceipt {
            batch_id: batch.batch_id,
            applied,
            skipped: total - applied,
        };
        data.receipts.insert(receipt.batch_id.clone(), receipt.clone());

        tracing::debug!(applied = receipt.applied, skipped = receipt.skipped, "batch applied");
        Ok(receipt)
    }

    fn replay_now(&self, op: QueuedOperation) -> Result<ReplayOutcome> {
        self.ensure_reachable()?;
        let _span = tracing::debug_span!("memory_replay", op_id = %op.op_id.as_str(), kind = op.mutation.kind()).entered();

        let mut data = self.data.borrow_mut();
        if data.applied_ops.contains(&op.op_id) {
            return Ok(ReplayOutcome::Duplicate);
        }

        if let (Some(base), Some(current)) = (op.base_version, data.updated_at(op.mutation.target())) {
            if current > base {
                return Ok(ReplayOutcome::Conflict { server_version: current });
            }
        }

        let target = op.mutation.target().clone();
        if data.apply(op.mutation) {
            data.applied_ops.insert(op.op_id);
            Ok(ReplayOutcome::Applied {
                version: data.updated_at(&target),
            })
        } else {
            Ok(ReplayOutcome::Failed {
                message: format!("no item {target}"),
            })
        }
    }

    fn search_now(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.ensure_reachable()?;
        let data = self.data.borrow();
        let lists: Vec<TodoList> = data.lists.values().cloned().collect();
        let tasks: Vec<Task> = data.tasks.values().cloned().collect();

        Ok(search_request(Corpus::new(&lists, &tasks), request)
            .into_iter()
            .map(|result| SearchHit {
                item: result.item,
                score: Some(result.score),
                highlights: result.highlights,
            })
            .collect())
    }
}

impl DataLayer for InMemoryBackend {
    fn load_lists(&self) -> LocalBoxFuture<'_, Result<Vec<TodoList>>> {
        future::ready(self.lists_now()).boxed_local()
    }

    fn load_tasks(&self) -> LocalBoxFuture<'_, Result<Vec<Task>>> {
        future::ready(self.tasks_now()).boxed_local()
    }

    fn apply_batch(&self, batch: BatchMutation) -> LocalBoxFuture<'_, Result<BatchReceipt>> {
        future::ready(self.apply_batch_now(batch)).boxed_local()
    }

    fn replay(&self, op: QueuedOperation) -> LocalBoxFuture<'_, Result<ReplayOutcome>> {
        future::ready(self.replay_now(op)).boxed_local()
    }

    fn search(&self, request: SearchRequest) -> LocalBoxFuture<'_, Result<Vec<SearchHit>>> {
        future::ready(self.search_now(&request)).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{OfflineQueue, QueueConfig};
    use futures::executor::block_on;

    fn seeded() -> InMemoryBackend {
        let now = Utc::now();
        InMemoryBackend::with_data(
            vec![TodoList::new("inbox", "Inbox", now), TodoList::new("work", "Work", now)],
            vec![Task::new("t1", "inbox", "Buy milk", now), Task::new("t2", "work", "Write report", now)],
        )
    }

    #[test]
    fn batch_is_idempotent_by_id() {
        let backend = seeded();
        let batch = BatchMutation::new(vec![
            Mutation::Complete { id: ItemId::new("t1"), completed: true },
            Mutation::Complete { id: ItemId::new("missing"), completed: true },
        ]);

        let first = block_on(backend.apply_batch(batch.clone())).unwrap();
        assert_eq!((first.applied, first.skipped), (1, 1));
        let again = block_on(backend.apply_batch(batch)).unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn replay_detects_duplicates_and_conflicts() {
        let backend = seeded();
        let known = backend.task(&ItemId::new("t1")).unwrap().updated_at;
        let mut queue = OfflineQueue::new(QueueConfig::default());
        let now = Utc::now();

        queue.enqueue(Mutation::Complete { id: ItemId::new("t1"), completed: true }, Some(known), now);
        let op = queue.ready(now).remove(0);
        let outcome = block_on(backend.replay(op.clone())).unwrap();
        let after = backend.task(&ItemId::new("t1")).map(|t| t.updated_at);
        assert_ne!(after, Some(known));
        assert_eq!(outcome, ReplayOutcome::Applied { version: after });
        assert_eq!(block_on(backend.replay(op.clone())).unwrap(), ReplayOutcome::Duplicate);

        let stale = QueuedOperation { op_id: OpId::generate(), ..op };
        assert!(matches!(block_on(backend.replay(stale)).unwrap(), ReplayOutcome::Conflict { .. }));
    }

    #[test]
    fn unreachable_backend_errors() {
        let backend = seeded();
        backend.set_reachable(false);
        assert!(matches!(block_on(backend.load_tasks()), Err(TodoError::Backend(_))));
    }

    #[test]
    fn deleting_a_list_removes_its_tasks() {
        let backend = seeded();
        assert!(backend.write_from_elsewhere(Mutation::Delete { id: ItemId::new("work") }));
        assert!(backend.task(&ItemId::new("t2")).is_none());
    }
}
