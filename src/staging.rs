//! Staging list (C4): the ordered queue of prepared-but-not-yet-drained
//! entries, ascending by sequence number.
//!
//! Unlike the committed list (see `committed.rs`), staging only ever needs
//! FIFO access — push a batch at the tail, peek or pop a run from the
//! head — so a plain [`VecDeque`] is the right structure; there is no
//! requirement for O(1) removal of an arbitrary interior node here.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::context::ReplicationContext;
use crate::types::{Entry, SequenceNumber};

pub(crate) struct StagingNode<T, K, V> {
    pub(crate) entry: Arc<Entry<T, K, V>>,
    pub(crate) context: Arc<Mutex<ReplicationContext>>,
}

pub(crate) struct StagingList<T, K, V> {
    nodes: VecDeque<StagingNode<T, K, V>>,
}

impl<T, K, V> StagingList<T, K, V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: VecDeque::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a full `Prepare` batch to the tail, all sharing `context`.
    pub(crate) fn push_batch(
        &mut self,
        entries: Vec<Arc<Entry<T, K, V>>>,
        context: Arc<Mutex<ReplicationContext>>,
    ) {
        for entry in entries {
            self.nodes.push_back(StagingNode {
                entry,
                context: Arc::clone(&context),
            });
        }
    }

    pub(crate) fn front_seq(&self) -> Option<SequenceNumber> {
        self.nodes.front().map(|n| n.entry.seq())
    }

    pub(crate) fn front_is_done(&self) -> bool {
        match self.nodes.front() {
            Some(node) => node.context.lock().expect("context poisoned").done,
            None => false,
        }
    }

    pub(crate) fn pop_front(&mut self) -> Option<StagingNode<T, K, V>> {
        self.nodes.pop_front()
    }

    /// Copies entries with `seq <= max_seq`, in list order, for `snapshot_up_to`.
    pub(crate) fn copy_up_to(&self, max_seq: SequenceNumber) -> Vec<Arc<Entry<T, K, V>>>
    where
        T: Clone,
        K: Clone,
    {
        self.nodes
            .iter()
            .take_while(|n| n.entry.seq() <= max_seq)
            .map(|n| Arc::clone(&n.entry))
            .collect()
    }

    pub(crate) fn last_seq(&self) -> Option<SequenceNumber> {
        self.nodes.back().map(|n| n.entry.seq())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(seq: u64) -> (Arc<Entry<&'static str, &'static str, i32>>, Arc<Mutex<ReplicationContext>>) {
        let entry = Arc::new(Entry::put("T", "A", 1).at_seq(SequenceNumber::new(seq)));
        let ctx = Arc::new(Mutex::new(ReplicationContext::new(1)));
        (entry, ctx)
    }

    #[test]
    fn fifo_order_preserved() {
        let mut list = StagingList::new();
        let (e10, c10) = node(10);
        let (e20, c20) = node(20);
        list.push_batch(vec![e10], c10);
        list.push_batch(vec![e20], c20);

        assert_eq!(list.front_seq(), Some(SequenceNumber::new(10)));
        let popped = list.pop_front().unwrap();
        assert_eq!(popped.entry.seq(), SequenceNumber::new(10));
        assert_eq!(list.front_seq(), Some(SequenceNumber::new(20)));
    }

    #[test]
    fn copy_up_to_stops_at_bound() {
        let mut list = StagingList::new();
        let (e10, c10) = node(10);
        let (e20, c20) = node(20);
        list.push_batch(vec![e10], c10);
        list.push_batch(vec![e20], c20);

        let copied = list.copy_up_to(SequenceNumber::new(15));
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].seq(), SequenceNumber::new(10));
    }
}
