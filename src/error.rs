//! Error types surfaced by the state table.
//!
//! Reads never fail: the only place these errors appear is the awaitable
//! returned by [`crate::table::StateTable::commit`], or as an eagerly
//! returned `Err` from `commit`/`prepare` themselves.

use thiserror::Error;

use crate::types::SequenceNumber;

/// Errors this crate can produce.
#[derive(Debug, Clone, Error)]
pub enum TableError {
    /// `Commit` was called with sequence number zero and no caller-supplied
    /// failure. Fatal to that call only; no state change occurred.
    #[error("commit called with invalid (zero) sequence number")]
    InvalidSequenceNumber,

    /// The replicator reported that replication for this group failed.
    /// The group's entries are discarded, never applied.
    #[error("replication failed: {0}")]
    ReplicationFailed(String),

    /// Defensive: `Prepare` was called with a sequence number not strictly
    /// greater than every sequence number previously passed to `Prepare`.
    ///
    /// Table state is unspecified after this error; it indicates a caller
    /// bug in the replicator, not a condition the table can recover from.
    #[error("prepare seq {seq} is not strictly greater than last prepared seq {last}")]
    OrderingViolation {
        seq: SequenceNumber,
        last: SequenceNumber,
    },

    /// Defensive: `Commit` was called for a sequence number that was never
    /// passed to `Prepare` (or whose group has already fully drained).
    #[error("commit for seq {0} has no matching pending replication context")]
    MissingContext(SequenceNumber),
}
