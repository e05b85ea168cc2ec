//! Single-writer / many-reader gate over the table's mutable interior (C3).
//!
//! This is a thin wrapper over [`std::sync::RwLock`] rather than a hand-rolled
//! synchronization primitive — `std::sync::RwLock` already gives many
//! concurrent readers, one exclusive writer, and scoped guards that release
//! on every exit path (including panics, which poison the lock rather than
//! leaving it held).
//!
//! # Non-reentrancy
//!
//! Acquisition is **not** reentrant. Holding a read or write guard and then
//! calling back into any operation that itself acquires the gate will
//! deadlock (write-after-read/write) or panic through lock poisoning. This
//! is why [`crate::table::StateTable::commit`] fires its completion signals
//! only after its write guard has been dropped — see the module docs on
//! `table` for the full rationale.
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) struct Gate<T> {
    inner: RwLock<T>,
}

impl<T> Gate<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquires the read side. Many readers may hold this concurrently.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::error!("state table gate poisoned by a panicking writer");
            poisoned.into_inner()
        })
    }

    /// Acquires the write side. Excludes all readers and other writers.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::error!("state table gate poisoned by a panicking writer");
            poisoned.into_inner()
        })
    }
}
