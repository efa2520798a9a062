//! Durable queue of mutations made while offline.
//!
//! Each queued operation carries an [`OpId`] that the data layer uses to
//! recognise replays, and the `updated_at` of its target as the client last
//! saw it. On reconnect the app replays [`OfflineQueue::ready`] operations and
//! feeds each answer back through [`OfflineQueue::record_outcome`]:
//!
//! | Outcome      | Effect                                                      |
//! |--------------|-------------------------------------------------------------|
//! | `Applied`    | removed; later ops on the same target move onto its version |
//! | `Duplicate`  | removed (the server had already applied this op id)         |
//! | `Failed`     | retried with exponential backoff, dead-lettered at the cap  |
//! | `Conflict`   | handled per [`ConflictPolicy`]                              |
//!
//! Operations on one target replay in the order they were made: an op is not
//! ready while an earlier op on the same target is still waiting.
//!
//! The queue never touches storage on its own; callers persist it with
//! [`OfflineQueue::persist`] after each change.

use crate::domain::error::{Result, TodoError};
use crate::domain::{ItemId, Mutation, OpId};
use crate::storage::{load_json, save_json, LocalStore, OFFLINE_QUEUE_KEY};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

const SNAPSHOT_VERSION: u32 = 1;

/// Largest backoff exponent; keeps the delay finite for runaway retry counts.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// How a version conflict reported during replay is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Drop the local change.
    ServerWins,
    /// Rebase the local change onto the server version and send it again.
    ClientWins,
    /// Park the operation until the user picks a side.
    #[default]
    Manual,
}

impl ConflictPolicy {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "server_wins" | "server" => Some(Self::ServerWins),
            "client_wins" | "client" => Some(Self::ClientWins),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Retry and conflict settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Failed attempts after which an operation is dead-lettered.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further failure.
    pub base_backoff_ms: u64,
    pub conflict_policy: ConflictPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 500,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl QueueConfig {
    /// Delay before the next attempt after `attempts` failures.
    #[must_use]
    pub fn backoff(&self, attempts: u32) -> Duration {
        let shift = attempts.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        let millis = self.base_backoff_ms.saturating_mul(1_u64 << shift);
        Duration::milliseconds(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}

/// One mutation waiting to reach the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub op_id: OpId,
    pub mutation: Mutation,
    /// `updated_at` of the target when the change was made, if it existed.
    #[serde(default)]
    pub base_version: Option<DateTime<Utc>>,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    pub next_attempt_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// What the data layer said about one replayed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// Written; `version` is the target's `updated_at` afterwards, if it
    /// still exists.
    Applied {
        #[serde(default)]
        version: Option<DateTime<Utc>>,
    },
    /// The op id had already been applied.
    Duplicate,
    Failed { message: String },
    /// The target changed on the server since `base_version`.
    Conflict { server_version: DateTime<Utc> },
}

/// What the queue did with an operation after an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Applied or duplicate; gone from the queue.
    Completed,
    /// Will be retried at the given time.
    Retrying(DateTime<Utc>),
    /// Exceeded `max_attempts`.
    DeadLettered,
    /// Conflict settled in the server's favour.
    Discarded,
    /// Conflict settled in the client's favour; queued again.
    Rebased,
    /// Conflict awaiting a user decision.
    Parked,
    /// No pending operation had this id.
    Unknown,
}

/// An operation parked on a version conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub op: QueuedOperation,
    pub server_version: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
}

/// User decision for a parked conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictChoice {
    KeepMine,
    KeepServer,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueSnapshot {
    version: u32,
    #[serde(default)]
    pending: VecDeque<QueuedOperation>,
    #[serde(default)]
    dead_letters: Vec<QueuedOperation>,
    #[serde(default)]
    conflicts: Vec<ConflictRecord>,
}

/// FIFO queue of offline mutations with retry, dead-letter and conflict lanes.
#[derive(Debug, Clone, Default)]
pub struct OfflineQueue {
    config: QueueConfig,
    pending: VecDeque<QueuedOperation>,
    dead_letters: Vec<QueuedOperation>,
    conflicts: Vec<ConflictRecord>,
    dirty: bool,
}

impl OfflineQueue {
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Restores the queue saved under [`OFFLINE_QUEUE_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Queue`] if the saved payload cannot be decoded or
    /// has an unknown version, and store errors unchanged.
    pub fn load(store: &dyn LocalStore, config: QueueConfig) -> Result<Self> {
        let snapshot = match load_json::<QueueSnapshot>(store, OFFLINE_QUEUE_KEY) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(Self::new(config)),
            Err(TodoError::Serialization(e)) => {
                return Err(TodoError::Queue(format!("corrupt offline queue: {e}")));
            }
            Err(e) => return Err(e),
        };

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(TodoError::Queue(format!(
                "unsupported offline queue version {}",
                snapshot.version
            )));
        }

        tracing::debug!(
            pending = snapshot.pending.len(),
            dead_letters = snapshot.dead_letters.len(),
            conflicts = snapshot.conflicts.len(),
            "offline queue restored"
        );

        Ok(Self {
            config,
            pending: snapshot.pending,
            dead_letters: snapshot.dead_letters,
            conflicts: snapshot.conflicts,
            dirty: false,
        })
    }

    /// Writes the queue to `store` if it changed since the last write.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails; the queue
    /// stays dirty so the next call retries.
    pub fn persist(&mut self, store: &mut dyn LocalStore) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let snapshot = QueueSnapshot {
            version: SNAPSHOT_VERSION,
            pending: self.pending.clone(),
            dead_letters: self.dead_letters.clone(),
            conflicts: self.conflicts.clone(),
        };
        save_json(store, OFFLINE_QUEUE_KEY, &snapshot)?;
        self.dirty = false;
        tracing::trace!(pending = self.pending.len(), "offline queue persisted");
        Ok(())
    }

    /// Appends a mutation, ready immediately.
    pub fn enqueue(&mut self, mutation: Mutation, base_version: Option<DateTime<Utc>>, now: DateTime<Utc>) -> OpId {
        let op_id = OpId::generate();
        tracing::debug!(op_id = %op_id.as_str(), kind = mutation.kind(), "mutation queued offline");

        self.pending.push_back(QueuedOperation {
            op_id: op_id.clone(),
            mutation,
            base_version,
            enqueued_at: now,
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
        });
        self.dirty = true;
        op_id
    }

    /// Operations whose backoff has elapsed by `now`, oldest first.
    ///
    /// An operation is held back while an earlier one on the same target is
    /// not ready.
    #[must_use]
    pub fn ready(&self, now: DateTime<Utc>) -> Vec<QueuedOperation> {
        let mut waiting: HashSet<&ItemId> = HashSet::new();
        let mut ready = Vec::new();
        for op in &self.pending {
            let target = op.mutation.target();
            if op.next_attempt_at <= now && !waiting.contains(target) {
                ready.push(op.clone());
            } else {
                waiting.insert(target);
            }
        }
        ready
    }

    /// The pending operation with this id, as it currently stands.
    #[must_use]
    pub fn get(&self, op_id: &OpId) -> Option<&QueuedOperation> {
        self.pending.iter().find(|op| &op.op_id == op_id)
    }

    /// Applies the data layer's answer for `op_id`.
    pub fn record_outcome(&mut self, op_id: &OpId, outcome: ReplayOutcome, now: DateTime<Utc>) -> Disposition {
        let _span = tracing::debug_span!("queue_outcome", op_id = %op_id.as_str(), outcome = ?outcome).entered();

        let Some(index) = self.pending.iter().position(|op| &op.op_id == op_id) else {
            tracing::debug!("outcome for unknown operation ignored");
            return Disposition::Unknown;
        };
        let Some(mut op) = self.pending.remove(index) else {
            return Disposition::Unknown;
        };
        self.dirty = true;

        match outcome {
            ReplayOutcome::Applied { version } => {
                if let Some(version) = version {
                    self.advance_base(op.mutation.target(), version);
                }
                Disposition::Completed
            }
            ReplayOutcome::Duplicate => Disposition::Completed,
            ReplayOutcome::Failed { message } => {
                op.attempts = op.attempts.saturating_add(1);
                op.last_error = Some(message);
                if op.attempts >= self.config.max_attempts {
                    tracing::warn!(attempts = op.attempts, "operation dead-lettered");
                    self.dead_letters.push(op);
                    return Disposition::DeadLettered;
                }
                op.next_attempt_at = now + self.config.backoff(op.attempts);
                let at = op.next_attempt_at;
                self.pending.insert(index, op);
                Disposition::Retrying(at)
            }
            ReplayOutcome::Conflict { server_version } => match self.config.conflict_policy {
                ConflictPolicy::ServerWins => {
                    tracing::info!("conflict resolved in favour of server");
                    Disposition::Discarded
                }
                ConflictPolicy::ClientWins => {
                    op.base_version = Some(server_version);
                    op.next_attempt_at = now;
                    self.pending.insert(index, op);
                    Disposition::Rebased
                }
                ConflictPolicy::Manual => {
                    self.conflicts.push(ConflictRecord {
                        op,
                        server_version,
                        detected_at: now,
                    });
                    Disposition::Parked
                }
            },
        }
    }

    /// Moves pending operations on `target` onto `version`. Operations
    /// without a base version are left unchecked.
    fn advance_base(&mut self, target: &ItemId, version: DateTime<Utc>) {
        for op in self.pending.iter_mut().filter(|op| op.mutation.target() == target) {
            if op.base_version.is_some_and(|base| base < version) {
                op.base_version = Some(version);
            }
        }
    }

    /// Settles a parked conflict.
    ///
    /// `KeepMine` puts the operation back in front of any later operations on
    /// the same target and rebases all of them onto the server version.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Queue`] if no conflict is parked under `op_id`.
    pub fn resolve_conflict(&mut self, op_id: &OpId, choice: ConflictChoice, now: DateTime<Utc>) -> Result<()> {
        let index = self
            .conflicts
            .iter()
            .position(|record| &record.op.op_id == op_id)
            .ok_or_else(|| TodoError::Queue(format!("no conflict for operation {}", op_id.as_str())))?;

        let record = self.conflicts.remove(index);
        if choice == ConflictChoice::KeepMine {
            let mut op = record.op;
            let target = op.mutation.target().clone();
            op.base_version = Some(record.server_version);
            op.next_attempt_at = now;

            // Goes ahead of the edits to its target that were made after it.
            let at = self
                .pending
                .iter()
                .position(|pending| pending.mutation.target() == &target)
                .unwrap_or(self.pending.len());
            self.pending.insert(at, op);
            self.advance_base(&target, record.server_version);
        }
        self.dirty = true;
        tracing::debug!(op_id = %op_id.as_str(), choice = ?choice, "conflict resolved");
        Ok(())
    }

    /// Moves every dead-lettered operation back to the queue with a fresh
    /// attempt budget. Returns how many were moved.
    pub fn requeue_dead_letters(&mut self, now: DateTime<Utc>) -> usize {
        let count = self.dead_letters.len();
        for mut op in self.dead_letters.drain(..) {
            op.attempts = 0;
            op.next_attempt_at = now;
            self.pending.push_back(op);
        }
        if count > 0 {
            self.dirty = true;
        }
        count
    }

    #[must_use]
    pub fn pending(&self) -> impl ExactSizeIterator<Item = &QueuedOperation> {
        self.pending.iter()
    }

    #[must_use]
    pub fn dead_letters(&self) -> &[QueuedOperation] {
        &self.dead_letters
    }

    #[must_use]
    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }
}
