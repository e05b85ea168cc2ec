//! Committed list + per-type index (C5): the authoritative, queryable view.
//!
//! The per-type index needs to remove an *arbitrary* interior node in O(1)
//! (when a later commit overwrites or deletes a key), addressed by a stable
//! handle. A plain `Vec` can't do that in O(1); an intrusive pointer-linked
//! list could, but only with `unsafe`, which this crate denies at the lint
//! level. Instead this is an arena with a free-list: nodes live in a
//! `Vec<Option<Slot<..>>>`, addressed by integer id, linked via `prev`/`next`
//! indices rather than pointers.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::types::{Entry, SequenceNumber};

struct Slot<T, K, V> {
    entry: Arc<Entry<T, K, V>>,
    prev: Option<usize>,
    next: Option<usize>,
}

pub(crate) struct CommittedList<T, K, V> {
    arena: Vec<Option<Slot<T, K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    /// `type -> key -> node id`. Every live (non-tombstone) committed entry
    /// appears exactly once here; tombstones never do.
    index: HashMap<T, HashMap<K, usize>>,
}

impl<T, K, V> CommittedList<T, K, V>
where
    T: Eq + Hash + Clone,
    K: Eq + Hash + Ord + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            index: HashMap::new(),
        }
    }

    pub(crate) fn with_capacity(type_hint: usize, node_hint: usize) -> Self {
        Self {
            arena: Vec::with_capacity(node_hint),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            index: HashMap::with_capacity(type_hint),
        }
    }

    fn insert_tail(&mut self, entry: Arc<Entry<T, K, V>>) -> usize {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.arena.push(None);
                self.arena.len() - 1
            }
        };
        let prev = self.tail;
        self.arena[id] = Some(Slot {
            entry,
            prev,
            next: None,
        });
        match prev {
            Some(prev_id) => {
                self.arena[prev_id]
                    .as_mut()
                    .expect("prev node must be live")
                    .next = Some(id);
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    fn remove(&mut self, id: usize) -> Arc<Entry<T, K, V>> {
        let slot = self.arena[id].take().expect("node id must reference a live node");
        match slot.prev {
            Some(p) => {
                self.arena[p].as_mut().expect("prev node must be live").next = slot.next;
            }
            None => self.head = slot.next,
        }
        match slot.next {
            Some(n) => {
                self.arena[n].as_mut().expect("next node must be live").prev = slot.prev;
            }
            None => self.tail = slot.prev,
        }
        self.free.push(id);
        self.len -= 1;
        slot.entry
    }

    fn tail_is_tombstone(&self) -> bool {
        self.tail
            .and_then(|id| self.arena[id].as_ref())
            .is_some_and(|slot| slot.entry.is_delete())
    }

    /// Applies one already-replicated entry to the committed view. This is
    /// the shared routine behind both the `Commit` drain and the secondary
    /// `apply_many` path.
    pub(crate) fn apply(&mut self, entry: Arc<Entry<T, K, V>>) {
        let ty = entry.ty().clone();
        let type_map_exists = self.index.contains_key(&ty);
        if !type_map_exists && entry.is_delete() {
            return;
        }

        if let Some(old_id) = self
            .index
            .get_mut(&ty)
            .and_then(|m| m.remove(entry.key()))
        {
            self.remove(old_id);
        }

        if self.tail_is_tombstone() {
            let tomb_id = self.tail.expect("tail_is_tombstone implies a tail exists");
            let evicted = self.remove(tomb_id);
            tracing::debug!(seq = %evicted.seq(), "evicted trailing tombstone ahead of new commit");
        }

        let is_delete = entry.is_delete();
        let key = entry.key().clone();
        let new_id = self.insert_tail(entry);

        if !is_delete {
            self.index.entry(ty).or_default().insert(key, new_id);
        } else {
            // Ensure the (possibly newly-created) empty type map exists so a
            // later `keys(ty)` on a type that has only ever seen deletes
            // still returns an empty sequence rather than nothing at all.
            self.index.entry(ty).or_default();
        }
    }

    pub(crate) fn try_get(&self, ty: &T, key: &K) -> Option<Arc<V>> {
        let id = *self.index.get(ty)?.get(key)?;
        let slot = self.arena[id].as_ref().expect("indexed node must be live");
        slot.entry.value().cloned()
    }

    pub(crate) fn keys_for(&self, ty: &T) -> Vec<K> {
        self.index
            .get(ty)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn values_for(&self, ty: &T) -> Vec<Arc<V>> {
        match self.index.get(ty) {
            Some(m) => m
                .values()
                .map(|&id| {
                    Arc::clone(
                        self.arena[id]
                            .as_ref()
                            .expect("indexed node must be live")
                            .entry
                            .value()
                            .expect("indexed node is never a tombstone"),
                    )
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Entries of `ty` in committed-list order, excluding the trailing
    /// tombstone marker if present — it is bookkeeping, not live state.
    pub(crate) fn entries_for_type(&self, ty: &T) -> Vec<Arc<Entry<T, K, V>>> {
        self.iter_in_order()
            .filter(|e| e.ty() == ty && !e.is_delete())
            .map(Arc::clone)
            .collect()
    }

    fn iter_in_order(&self) -> impl Iterator<Item = &Arc<Entry<T, K, V>>> {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let id = cur?;
            let slot = self.arena[id].as_ref().expect("node id must reference a live node");
            cur = slot.next;
            Some(&slot.entry)
        })
    }

    /// Copies entries with `seq <= max_seq` in list order, plus the highest
    /// seq copied (`UNASSIGNED` if nothing qualified). Used by `snapshot_up_to`.
    pub(crate) fn copy_up_to(&self, max_seq: SequenceNumber) -> (Vec<Arc<Entry<T, K, V>>>, SequenceNumber) {
        let mut buf = Vec::new();
        let mut highest = SequenceNumber::UNASSIGNED;
        for entry in self.iter_in_order() {
            if entry.seq() > max_seq {
                break;
            }
            highest = entry.seq();
            buf.push(Arc::clone(entry));
        }
        (buf, highest)
    }

    pub(crate) fn last_seq(&self) -> SequenceNumber {
        self.tail
            .and_then(|id| self.arena[id].as_ref())
            .map(|slot| slot.entry.seq())
            .unwrap_or(SequenceNumber::UNASSIGNED)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(seq: u64, key: &'static str, value: i32) -> Arc<Entry<&'static str, &'static str, i32>> {
        Arc::new(Entry::put("T", key, value).at_seq(SequenceNumber::new(seq)))
    }

    fn delete(seq: u64, key: &'static str) -> Arc<Entry<&'static str, &'static str, i32>> {
        Arc::new(Entry::delete("T", key).at_seq(SequenceNumber::new(seq)))
    }

    #[test]
    fn insert_then_lookup() {
        let mut list = CommittedList::new();
        list.apply(put(10, "A", 1));
        assert_eq!(*list.try_get(&"T", &"A").unwrap(), 1);
        assert_eq!(list.last_seq(), SequenceNumber::new(10));
    }

    #[test]
    fn overwrite_replaces_in_place_and_keeps_list_length() {
        let mut list = CommittedList::new();
        list.apply(put(10, "A", 1));
        list.apply(put(20, "A", 2));
        assert_eq!(*list.try_get(&"T", &"A").unwrap(), 2);
        assert_eq!(list.len(), 1);
        assert_eq!(list.last_seq(), SequenceNumber::new(20));
    }

    #[test]
    fn delete_removes_key_but_leaves_trailing_tombstone() {
        let mut list = CommittedList::new();
        list.apply(put(10, "A", 1));
        list.apply(delete(20, "A"));

        assert!(list.try_get(&"T", &"A").is_none());
        assert!(list.keys_for(&"T").is_empty());
        // the tombstone is still the tail, carrying seq 20
        assert_eq!(list.last_seq(), SequenceNumber::new(20));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn next_commit_evicts_trailing_tombstone() {
        let mut list = CommittedList::new();
        list.apply(put(10, "A", 1));
        list.apply(delete(20, "A"));
        list.apply(put(30, "B", 9));

        assert_eq!(list.len(), 1);
        assert_eq!(list.last_seq(), SequenceNumber::new(30));
        assert_eq!(*list.try_get(&"T", &"B").unwrap(), 9);
    }

    #[test]
    fn delete_of_never_seen_type_is_a_complete_no_op() {
        let mut list = CommittedList::new();
        list.apply(delete(10, "A"));
        assert_eq!(list.len(), 0);
        assert_eq!(list.last_seq(), SequenceNumber::UNASSIGNED);
    }

    #[test]
    fn keys_sorted_externally_are_stable() {
        let mut list = CommittedList::new();
        list.apply(put(10, "B", 1));
        list.apply(put(20, "A", 2));
        let mut keys = list.keys_for(&"T");
        keys.sort();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn copy_up_to_stops_at_bound_and_reports_highest() {
        let mut list = CommittedList::new();
        list.apply(put(10, "A", 1));
        list.apply(put(20, "B", 2));
        let (buf, highest) = list.copy_up_to(SequenceNumber::new(15));
        assert_eq!(buf.len(), 1);
        assert_eq!(highest, SequenceNumber::new(10));
    }
}
