//! Snapshot enumerator (C7): a cursor over a captured committed +
//! uncommitted pair, used to stream state to a catching-up secondary.
//!
//! The enumerator owns two plain buffers captured under a single read-lock
//! acquisition (see [`crate::table::StateTable::snapshot_up_to`]) and never
//! touches the table again; it is a cheap, detached, point-in-time view.

use std::sync::Arc;

use crate::types::Entry;

/// A cursor over the committed segment followed by the uncommitted segment
/// of a [`crate::table::StateTable::snapshot_up_to`] capture.
pub struct SnapshotEnumerator<T, K, V> {
    committed: Vec<Arc<Entry<T, K, V>>>,
    uncommitted: Vec<Arc<Entry<T, K, V>>>,
    position: usize,
}

impl<T, K, V> SnapshotEnumerator<T, K, V> {
    pub(crate) fn new(committed: Vec<Arc<Entry<T, K, V>>>, uncommitted: Vec<Arc<Entry<T, K, V>>>) -> Self {
        Self {
            committed,
            uncommitted,
            position: 0,
        }
    }

    /// Number of committed-segment entries. These will never be rolled back.
    #[must_use]
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// Number of uncommitted-segment entries. These are provisional: the
    /// replicating group backing them may still fail after this snapshot
    /// was taken, so a receiver must be prepared to accept them as such.
    #[must_use]
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted.len()
    }

    /// Returns the next entry without consuming it, or `None` if exhausted.
    #[must_use]
    pub fn peek_next(&self) -> Option<&Arc<Entry<T, K, V>>> {
        if self.position < self.committed.len() {
            self.committed.get(self.position)
        } else {
            self.uncommitted.get(self.position - self.committed.len())
        }
    }

    /// Advances the cursor one entry, returning what was at the front.
    pub fn move_next(&mut self) -> Option<Arc<Entry<T, K, V>>> {
        let next = if self.position < self.committed.len() {
            self.committed.get(self.position).cloned()
        } else {
            self.uncommitted.get(self.position - self.committed.len()).cloned()
        };
        if next.is_some() {
            self.position += 1;
        }
        next
    }
}
