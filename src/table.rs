//! State table facade (C6): `Prepare`, `Commit`, `Apply`, and the read paths,
//! assembled from the staging list (C4), committed list (C5), and pending
//! map over the shared gate (C3).
//!
//! # Why signaling happens outside the write lock
//!
//! [`StateTable::commit`] fires completion signals for newly-drained groups
//! only after its write guard has been dropped. The gate in `gate.rs` is not
//! reentrant, and a completion waiter may itself call back into the table
//! (a dispatcher thread that, on learning its commit succeeded, immediately
//! issues a read). Firing the signal while still holding the write lock
//! would deadlock such a caller against itself.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::committed::CommittedList;
use crate::config::TableConfig;
use crate::context::ReplicationContext;
use crate::error::TableError;
use crate::gate::Gate;
use crate::snapshot::SnapshotEnumerator;
use crate::staging::StagingList;
use crate::types::{Entry, SequenceNumber};

/// The outcome of a `Commit` call: either the group was signaled
/// synchronously (it was already in the to-signal list built by this very
/// call), or the caller must await the context's own completion signal.
pub enum CommitOutcome {
    /// The commit's own group was drained and signaled by this call.
    Ready(Result<(), TableError>),
    /// The commit's own group has not yet drained; await this receiver.
    Pending(oneshot::Receiver<Result<(), TableError>>),
}

impl CommitOutcome {
    /// Awaits the outcome, whichever variant it is.
    ///
    /// # Errors
    /// Returns the group's replication failure, if any, or
    /// [`TableError::ReplicationFailed`] with a channel-closed message if the
    /// table was dropped before signaling (should not happen in practice,
    /// since the table outlives any call it returns a receiver from).
    pub async fn wait(self) -> Result<(), TableError> {
        match self {
            CommitOutcome::Ready(result) => result,
            CommitOutcome::Pending(rx) => rx
                .await
                .unwrap_or_else(|_| Err(TableError::ReplicationFailed("table dropped".to_string()))),
        }
    }
}

struct Inner<T, K, V> {
    staging: StagingList<T, K, V>,
    committed: CommittedList<T, K, V>,
    pending: HashMap<SequenceNumber, Arc<Mutex<ReplicationContext>>>,
    last_prepared_seq: SequenceNumber,
}

/// The volatile replicated state table (C6): the public facade over the
/// staging list, committed list, and per-type index.
///
/// Generic over the type discriminator `T`, key `K`, and value `V`; an actor
/// runtime would typically instantiate this with an actor-type enum, an
/// actor/state key, and a serialized state payload. `T` and `K` must be
/// equality-comparable and hashable (for the per-type index), and `K` must
/// additionally be totally ordered (for sorted-key enumeration).
pub struct StateTable<T, K, V> {
    gate: Gate<Inner<T, K, V>>,
    config: TableConfig,
}

impl<T, K, V> StateTable<T, K, V>
where
    T: Eq + Hash + Clone,
    K: Eq + Hash + Ord + Clone,
{
    /// Creates an empty table with the given configuration.
    #[must_use]
    pub fn new(config: TableConfig) -> Self {
        let committed = match config.committed_capacity_hint {
            Some(hint) => CommittedList::with_capacity(hint, hint),
            None => CommittedList::new(),
        };
        let staging = match config.staging_capacity_hint {
            Some(hint) => StagingList::with_capacity(hint),
            None => StagingList::new(),
        };
        Self {
            gate: Gate::new(Inner {
                staging,
                committed,
                pending: config
                    .staging_capacity_hint
                    .map_or_else(HashMap::new, HashMap::with_capacity),
                last_prepared_seq: SequenceNumber::UNASSIGNED,
            }),
            config,
        }
    }

    /// `Prepare` (C6): stages a batch of entries under sequence number
    /// `seq`, assigning `seq` to each entry.
    ///
    /// `seq == 0` is treated as an invalid/rejected LSN: a silent no-op, no
    /// state change, no error. A correct caller never passes `0` here; this
    /// matches the source's behavior of accepting it anyway rather than
    /// guessing at a different intent.
    ///
    /// # Errors
    /// Returns [`TableError::OrderingViolation`] if
    /// `config.assert_prepare_monotonic` is set and `seq` is not strictly
    /// greater than every seq previously passed to `prepare`.
    ///
    /// # Panics
    /// In debug builds, panics on the same ordering violation when
    /// `config.assert_prepare_monotonic` is `false` (the check still runs
    /// under `debug_assertions` even though it is compiled out of release
    /// builds in that configuration).
    pub fn prepare(&self, entries: Vec<Entry<T, K, V>>, seq: SequenceNumber) -> Result<(), TableError> {
        if seq.is_unassigned() {
            tracing::debug!("prepare called with seq 0, treated as no-op");
            return Ok(());
        }
        debug_assert!(!entries.is_empty(), "prepare requires at least one entry");

        let assigned: Vec<_> = entries.into_iter().map(|e| Arc::new(e.at_seq(seq))).collect();

        let mut inner = self.gate.write();

        if seq <= inner.last_prepared_seq && !inner.last_prepared_seq.is_unassigned() {
            tracing::error!(
                seq = %seq,
                last = %inner.last_prepared_seq,
                "prepare seq is not strictly greater than the last prepared seq"
            );
            if self.config.assert_prepare_monotonic {
                return Err(TableError::OrderingViolation {
                    seq,
                    last: inner.last_prepared_seq,
                });
            }
            debug_assert!(
                false,
                "prepare seq {seq} is not strictly greater than last prepared seq {}",
                inner.last_prepared_seq
            );
        }
        inner.last_prepared_seq = seq;

        let context = Arc::new(Mutex::new(ReplicationContext::new(assigned.len())));
        inner.staging.push_batch(assigned, Arc::clone(&context));
        inner.pending.insert(seq, context);
        Ok(())
    }

    /// `Commit` (C6, §4.3): marks the group prepared under `seq` as
    /// replication-complete (optionally with `failure`), then drains as much
    /// of the staging prefix as is now complete into the committed view.
    ///
    /// Returns an outcome the caller can `.wait()` on. This call never
    /// blocks: it only performs the drain and, if this group's own context
    /// was among those just drained, reports that synchronously.
    ///
    /// # Errors
    /// Returns [`TableError::InvalidSequenceNumber`] immediately if
    /// `seq == 0` and no `failure` was supplied — or the supplied `failure`
    /// itself, if one was given even for seq 0.
    ///
    /// Returns [`TableError::MissingContext`] if no pending context is
    /// registered for `seq` (a defensive check: this indicates `commit` was
    /// called for a seq never passed to `prepare`, or already fully drained).
    pub fn commit(&self, seq: SequenceNumber, failure: Option<String>) -> Result<CommitOutcome, TableError> {
        if seq.is_unassigned() {
            return match failure {
                Some(reason) => Err(TableError::ReplicationFailed(reason)),
                None => Err(TableError::InvalidSequenceNumber),
            };
        }

        // Entries drained this call that reached zero `associated_entries`,
        // in drain order (ascending seq, since the staging list is FIFO by
        // construction). Each is signaled after the write guard is released.
        let mut to_signal: Vec<(
            Arc<Mutex<ReplicationContext>>,
            oneshot::Sender<Result<(), TableError>>,
            Result<(), TableError>,
        )> = Vec::new();
        let this_call_context;
        let pending_rx;

        {
            let mut inner = self.gate.write();

            let Some(context) = inner.pending.get(&seq).cloned() else {
                tracing::error!(%seq, "commit for seq has no matching pending replication context");
                return Err(TableError::MissingContext(seq));
            };
            this_call_context = Arc::clone(&context);

            {
                let mut guard = context.lock().expect("context poisoned");
                guard.done = true;
                if let Some(reason) = failure {
                    tracing::warn!(%seq, reason = %reason, "commit recorded a replication failure");
                    guard.failure = Some(reason);
                }
            }

            let mut drained = 0usize;
            while inner.staging.front_is_done() {
                let node = inner.staging.pop_front().expect("front_is_done implied a front");
                let node_seq = node.entry.seq();
                let succeeded = {
                    let guard = node.context.lock().expect("context poisoned");
                    guard.failure.is_none()
                };
                if succeeded {
                    inner.committed.apply(node.entry);
                } else {
                    tracing::debug!(seq = %node_seq, "drained a replication-failed entry, discarding");
                }
                drained += 1;

                let retire = {
                    let mut guard = node.context.lock().expect("context poisoned");
                    guard.associated_entries -= 1;
                    guard.associated_entries == 0
                };
                if retire {
                    inner.pending.remove(&node_seq);
                    let mut guard = node.context.lock().expect("context poisoned");
                    if let Some((result, tx)) = guard.take_outcome() {
                        drop(guard);
                        to_signal.push((Arc::clone(&node.context), tx, result));
                    }
                }
            }
            tracing::debug!(%seq, drained, "commit drained staging prefix");

            pending_rx = if to_signal.iter().any(|(ctx, _, _)| Arc::ptr_eq(ctx, &this_call_context)) {
                None
            } else {
                context.lock().expect("context poisoned").take_receiver()
            };
        }

        // Signaling happens after the write guard above is dropped (end of
        // the block): see the module docs for why this ordering is load-bearing.
        let mut this_call_result = None;
        for (ctx, tx, result) in to_signal {
            let is_this_call = Arc::ptr_eq(&ctx, &this_call_context);
            let outcome = result.clone();
            let _ = tx.send(result);
            if is_this_call {
                this_call_result = Some(outcome);
            }
        }

        match this_call_result {
            Some(result) => Ok(CommitOutcome::Ready(result)),
            None => match pending_rx {
                Some(rx) => Ok(CommitOutcome::Pending(rx)),
                None => Ok(CommitOutcome::Ready(Ok(()))),
            },
        }
    }

    /// `Apply` (C6, §4.7): the secondary-replica path. Applies each entry
    /// directly to the committed view, in the order given, with no staging
    /// step and no replication context.
    ///
    /// The caller (the replication stream reader) is responsible for
    /// providing entries in ascending-seq order; this method does not
    /// validate that, matching the source's secondary path.
    pub fn apply_many(&self, entries: Vec<Entry<T, K, V>>) {
        let mut inner = self.gate.write();
        for entry in entries {
            inner.committed.apply(Arc::new(entry));
        }
    }

    /// `TryGet` (§4.5): a point lookup in the committed view.
    #[must_use]
    pub fn try_get(&self, ty: &T, key: &K) -> Option<Arc<V>> {
        self.gate.read().committed.try_get(ty, key)
    }

    /// `keys(type)` (§4.5): all live keys for `ty`, sorted ascending. Sorting
    /// happens after the read lock is released.
    #[must_use]
    pub fn keys(&self, ty: &T) -> Vec<K> {
        let mut keys = self.gate.read().committed.keys_for(ty);
        keys.sort();
        keys
    }

    /// `values(type)` (§4.5): all live values for `ty`. Order unspecified.
    #[must_use]
    pub fn values(&self, ty: &T) -> Vec<Arc<V>> {
        self.gate.read().committed.values_for(ty)
    }

    /// `enumerate_type(type)` (§4.5): a snapshot enumerator over `ty`'s
    /// current committed entries only (no uncommitted slice).
    #[must_use]
    pub fn enumerate_type(&self, ty: &T) -> SnapshotEnumerator<T, K, V> {
        let committed = self.gate.read().committed.entries_for_type(ty);
        SnapshotEnumerator::new(committed, Vec::new())
    }

    /// `highest_known_seq()` (§4.5): the seq of the last staging node if
    /// any, else the last committed node, else `0`.
    #[must_use]
    pub fn highest_known_seq(&self) -> SequenceNumber {
        let inner = self.gate.read();
        inner.staging.last_seq().unwrap_or_else(|| inner.committed.last_seq())
    }

    /// `highest_committed_seq()` (§4.5): the seq of the last committed node,
    /// else `0`.
    #[must_use]
    pub fn highest_committed_seq(&self) -> SequenceNumber {
        self.gate.read().committed.last_seq()
    }

    /// `snapshot_up_to(max_seq)` (C7, §4.6): a point-in-time cursor over
    /// committed entries with `seq <= max_seq`, plus (only if the committed
    /// segment didn't already reach `max_seq`) staging entries with
    /// `seq <= max_seq`, for catching up a joining secondary.
    #[must_use]
    pub fn snapshot_up_to(&self, max_seq: SequenceNumber) -> SnapshotEnumerator<T, K, V>
    where
        T: Clone,
        K: Clone,
    {
        let inner = self.gate.read();
        let (committed, highest_committed) = inner.committed.copy_up_to(max_seq);
        let uncommitted = if highest_committed < max_seq {
            inner.staging.copy_up_to(max_seq)
        } else {
            Vec::new()
        };
        SnapshotEnumerator::new(committed, uncommitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestTable = StateTable<&'static str, &'static str, i32>;

    fn table() -> TestTable {
        StateTable::new(TableConfig::testing())
    }

    fn put(ty: &'static str, key: &'static str, value: i32) -> Entry<&'static str, &'static str, i32> {
        Entry::put(ty, key, value)
    }

    fn delete(ty: &'static str, key: &'static str) -> Entry<&'static str, &'static str, i32> {
        Entry::delete(ty, key)
    }

    #[tokio::test]
    async fn scenario_1_single_prepare_commit() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(10)).unwrap();
        t.commit(SequenceNumber::new(10), None).unwrap().wait().await.unwrap();

        assert_eq!(*t.try_get(&"T", &"A").unwrap(), 1);
        assert_eq!(t.highest_committed_seq(), SequenceNumber::new(10));
    }

    #[tokio::test]
    async fn scenario_2_out_of_order_commit_drains_on_head_arrival() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(10)).unwrap();
        t.prepare(vec![put("T", "A", 2)], SequenceNumber::new(20)).unwrap();

        let outcome_20 = t.commit(SequenceNumber::new(20), None).unwrap();
        // seq 20 is not at the head (seq 10 is), so it cannot have drained yet.
        assert!(t.try_get(&"T", &"A").is_none());

        let outcome_10 = t.commit(SequenceNumber::new(10), None).unwrap();
        outcome_10.wait().await.unwrap();
        outcome_20.wait().await.unwrap();

        assert_eq!(*t.try_get(&"T", &"A").unwrap(), 2);
        assert_eq!(t.highest_committed_seq(), SequenceNumber::new(20));
    }

    #[tokio::test]
    async fn scenario_3_failure_isolation_does_not_block_later_commits() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(10)).unwrap();
        t.prepare(vec![put("T", "A", 2)], SequenceNumber::new(20)).unwrap();

        let outcome_20 = t.commit(SequenceNumber::new(20), None).unwrap();
        let outcome_10 = t
            .commit(SequenceNumber::new(10), Some("quorum lost".to_string()))
            .unwrap();

        let result_10 = outcome_10.wait().await;
        assert!(matches!(result_10, Err(TableError::ReplicationFailed(reason)) if reason == "quorum lost"));
        outcome_20.wait().await.unwrap();

        assert_eq!(*t.try_get(&"T", &"A").unwrap(), 2);
        assert_eq!(t.highest_committed_seq(), SequenceNumber::new(20));
    }

    #[tokio::test]
    async fn scenario_4_delete_removes_key_and_advances_seq() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(10)).unwrap();
        t.commit(SequenceNumber::new(10), None).unwrap().wait().await.unwrap();

        t.prepare(vec![delete("T", "A")], SequenceNumber::new(20)).unwrap();
        t.commit(SequenceNumber::new(20), None).unwrap().wait().await.unwrap();

        assert!(t.try_get(&"T", &"A").is_none());
        assert!(t.keys(&"T").is_empty());
        assert_eq!(t.highest_committed_seq(), SequenceNumber::new(20));
    }

    #[tokio::test]
    async fn scenario_5_group_atomicity() {
        let t = table();
        t.prepare(
            vec![put("T", "A", 1), put("T", "B", 2)],
            SequenceNumber::new(10),
        )
        .unwrap();
        t.commit(SequenceNumber::new(10), None).unwrap().wait().await.unwrap();

        let mut keys = t.keys(&"T");
        keys.sort_unstable();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn scenario_6_snapshot_bound_excludes_staging_beyond_bound() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(10)).unwrap();
        t.commit(SequenceNumber::new(10), None).unwrap().wait().await.unwrap();
        t.prepare(vec![put("T", "B", 2)], SequenceNumber::new(20)).unwrap();

        let snap = t.snapshot_up_to(SequenceNumber::new(15));
        assert_eq!(snap.committed_count(), 1);
        assert_eq!(snap.uncommitted_count(), 0);
    }

    #[tokio::test]
    async fn prepare_seq_zero_is_a_silent_no_op() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::UNASSIGNED).unwrap();
        assert_eq!(t.highest_known_seq(), SequenceNumber::UNASSIGNED);
        assert!(t.try_get(&"T", &"A").is_none());
    }

    #[tokio::test]
    async fn commit_seq_zero_fails_immediately() {
        let t = table();
        let result = t.commit(SequenceNumber::UNASSIGNED, None);
        assert!(matches!(result, Err(TableError::InvalidSequenceNumber)));
    }

    #[tokio::test]
    async fn commit_unknown_seq_is_a_missing_context_error() {
        let t = table();
        let result = t.commit(SequenceNumber::new(999), None);
        assert!(matches!(result, Err(TableError::MissingContext(seq)) if seq == SequenceNumber::new(999)));
    }

    #[tokio::test]
    async fn prepare_non_monotonic_seq_is_rejected_by_default() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(20)).unwrap();
        let result = t.prepare(vec![put("T", "A", 2)], SequenceNumber::new(10));
        assert!(matches!(result, Err(TableError::OrderingViolation { .. })));
    }

    #[tokio::test]
    async fn apply_many_applies_directly_without_staging() {
        let t = table();
        t.apply_many(vec![put("T", "A", 1).at_seq(SequenceNumber::new(10))]);
        assert_eq!(*t.try_get(&"T", &"A").unwrap(), 1);
        assert_eq!(t.highest_committed_seq(), SequenceNumber::new(10));
        assert_eq!(t.highest_known_seq(), SequenceNumber::new(10));
    }

    #[tokio::test]
    async fn values_returns_all_live_values_for_type() {
        let t = table();
        t.prepare(
            vec![put("T", "A", 1), put("T", "B", 2)],
            SequenceNumber::new(10),
        )
        .unwrap();
        t.commit(SequenceNumber::new(10), None).unwrap().wait().await.unwrap();

        let mut values: Vec<i32> = t.values(&"T").into_iter().map(|v| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn enumerate_type_excludes_uncommitted_entries() {
        let t = table();
        t.prepare(vec![put("T", "A", 1)], SequenceNumber::new(10)).unwrap();
        t.commit(SequenceNumber::new(10), None).unwrap().wait().await.unwrap();
        t.prepare(vec![put("T", "B", 2)], SequenceNumber::new(20)).unwrap();

        let mut cursor = t.enumerate_type(&"T");
        assert_eq!(cursor.committed_count(), 1);
        assert_eq!(cursor.uncommitted_count(), 0);
        assert_eq!(cursor.move_next().unwrap().seq(), SequenceNumber::new(10));
        assert!(cursor.move_next().is_none());
    }
}
