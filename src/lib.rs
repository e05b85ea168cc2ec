//! # replistate
//!
//! The volatile replicated state table used by an actor runtime to hold the
//! authoritative in-memory state of a replicated primary replica while
//! replication to secondaries is in flight.
//!
//! A replicator assigns monotonically increasing sequence numbers to
//! batches of state mutations. This table stages each batch until its
//! replication completes — and until every earlier batch has also
//! completed — then atomically advances it into a committed view that
//! supports point lookups, sorted-key scans, and consistent snapshots for
//! catching up a joining secondary.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         StateTable                           │
//! │  ┌───────────┐   ┌───────────┐   ┌─────────────────────┐     │
//! │  │  Prepare  │ → │  Staging  │ → │  Committed + index   │     │
//! │  │ (stage)   │   │   list    │   │   (TryGet, keys,     │     │
//! │  └───────────┘   └───────────┘   │    snapshot_up_to)   │     │
//! │                        ↑          └─────────────────────┘     │
//! │                     Commit (drains prefix once replicated)    │
//! │                        ↑                                      │
//! │                  Apply / apply_many (secondary path)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```
//! use replistate::{Entry, SequenceNumber, StateTable, TableConfig};
//!
//! # fn main() {
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let table: StateTable<&str, &str, i32> = StateTable::new(TableConfig::default());
//!
//! table
//!     .prepare(vec![Entry::put("counters", "visits", 1)], SequenceNumber::new(10))
//!     .unwrap();
//! table
//!     .commit(SequenceNumber::new(10), None)
//!     .unwrap()
//!     .wait()
//!     .await
//!     .unwrap();
//!
//! assert_eq!(*table.try_get(&"counters", &"visits").unwrap(), 1);
//! # });
//! # }
//! ```
//!
//! # Modules
//!
//! - **Facade**: [`StateTable`] - the public API (`prepare`/`commit`/`apply_many`/reads)
//! - **Data model**: [`Entry`], [`SequenceNumber`]
//! - **Errors & config**: [`TableError`], [`TableConfig`]
//! - **Snapshots**: [`SnapshotEnumerator`]
//! - **Naming**: [`naming`] — canonical actor/service/endpoint name derivation

mod committed;
mod config;
mod context;
mod error;
mod gate;
pub mod naming;
mod snapshot;
mod staging;
mod table;
mod types;

pub use config::TableConfig;
pub use error::TableError;
pub use snapshot::SnapshotEnumerator;
pub use table::{CommitOutcome, StateTable};
pub use types::{Entry, SequenceNumber};
