//! The data model shared by every component: sequence numbers and entries.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 64-bit sequence number assigned by the external replicator.
///
/// `0` is reserved to mean "invalid / unassigned".
/// All other values are ordinary monotonically-increasing operation numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// The reserved "unassigned" sentinel.
    pub const UNASSIGNED: SequenceNumber = SequenceNumber(0);

    /// Wraps a raw `u64` as a sequence number. `0` is accepted here because
    /// callers need to be able to construct `UNASSIGNED` explicitly; it is
    /// the *use* of a zero seq in `prepare`/`commit` that carries meaning.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw `u64` value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true if this is the reserved unassigned sentinel.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SequenceNumber> for u64 {
    fn from(seq: SequenceNumber) -> Self {
        seq.0
    }
}

/// One state mutation: a type discriminator, a key within that type, and
/// either a value or a tombstone marker, tagged with the sequence number
/// that ordered it.
///
/// An `Entry` is immutable after construction except for the one-time
/// sequence-number assignment performed by [`Entry::at_seq`], which is a
/// consuming (functional) update rather than in-place mutation — `Entry`
/// never needs interior mutability.
///
/// The value is stored behind an `Arc` so that cloning an `Entry` (as the
/// table does freely when sharing it between the staging list, the
/// committed list, and snapshot enumerators) never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T, K, V> {
    ty: T,
    key: K,
    value: Option<Arc<V>>,
    is_delete: bool,
    seq: SequenceNumber,
}

impl<T, K, V> Entry<T, K, V> {
    /// Constructs a live (non-tombstone) entry. `seq` starts unassigned;
    /// callers driving `Prepare` leave it that way and let `prepare`
    /// assign it, while callers driving `apply_many` (the secondary path)
    /// must call [`Entry::at_seq`] themselves first.
    pub fn put(ty: T, key: K, value: V) -> Self {
        Self {
            ty,
            key,
            value: Some(Arc::new(value)),
            is_delete: false,
            seq: SequenceNumber::UNASSIGNED,
        }
    }

    /// Constructs a tombstone entry for `(ty, key)`.
    pub fn delete(ty: T, key: K) -> Self {
        Self {
            ty,
            key,
            value: None,
            is_delete: true,
            seq: SequenceNumber::UNASSIGNED,
        }
    }

    /// Returns a copy of this entry with `seq` assigned, leaving the
    /// original untouched. This is the "one-time sequence-number
    /// assignment" the data model describes.
    #[must_use]
    pub fn at_seq(mut self, seq: SequenceNumber) -> Self {
        self.seq = seq;
        self
    }

    #[must_use]
    pub fn ty(&self) -> &T {
        &self.ty
    }

    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> Option<&Arc<V>> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.is_delete
    }

    #[must_use]
    pub fn seq(&self) -> SequenceNumber {
        self.seq
    }
}
