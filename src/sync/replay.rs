//! Replaying the offline queue against a data layer.

use super::queue::{Disposition, OfflineQueue, ReplayOutcome};
use crate::backend::DataLayer;
use crate::domain::{ItemId, OpId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Tally of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub completed: usize,
    pub retrying: usize,
    pub dead_lettered: usize,
    pub discarded: usize,
    pub rebased: usize,
    pub parked: usize,
}

impl ReplayReport {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Completed => self.completed += 1,
            Disposition::Retrying(_) => self.retrying += 1,
            Disposition::DeadLettered => self.dead_lettered += 1,
            Disposition::Discarded => self.discarded += 1,
            Disposition::Rebased => self.rebased += 1,
            Disposition::Parked => self.parked += 1,
            Disposition::Unknown => {}
        }
    }

    /// Operations that reached a final state in this pass.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.completed + self.discarded
    }
}

/// Sends every ready operation, oldest first, and records each answer.
///
/// Each operation is re-read from the queue just before it is sent, so one
/// applied earlier in the pass has already moved later ops on its target onto
/// the new version. Once an op on a target does not complete, the rest of
/// that target waits for the next pass.
///
/// A transport error counts as a failed attempt for that operation; it does
/// not stop the pass. Rebased operations are sent again on the next pass.
pub async fn replay_ready<D>(queue: &mut OfflineQueue, data: &D, now: DateTime<Utc>) -> ReplayReport
where
    D: DataLayer + ?Sized,
{
    let ready: Vec<OpId> = queue.ready(now).into_iter().map(|op| op.op_id).collect();
    tracing::debug!(ready = ready.len(), pending = queue.len(), "replaying offline queue");

    let mut held: HashSet<ItemId> = HashSet::new();
    let mut report = ReplayReport::default();
    for op_id in ready {
        let Some(op) = queue.get(&op_id).cloned() else {
            continue;
        };
        let target = op.mutation.target().clone();
        if held.contains(&target) {
            continue;
        }

        let outcome = match data.replay(op).await {
            Ok(outcome) => outcome,
            Err(e) => ReplayOutcome::Failed { message: e.to_string() },
        };
        let disposition = queue.record_outcome(&op_id, outcome, now);
        if !matches!(disposition, Disposition::Completed | Disposition::Discarded) {
            held.insert(target);
        }
        report.record(disposition);
    }

    tracing::debug!(report = ?report, "replay pass finished");
    report
}
