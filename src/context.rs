//! Replication context (C2): the completion state of one `Prepare` group.
//!
//! One context is created per `Prepare` call and shared, by reference, with
//! every staging node `Prepare` created for that call: a reference-counted
//! handle with interior mutability for the counter and the done/failure
//! flags, rather than an intrusive back-pointer (which would need `unsafe`
//! to be sound in safe Rust without a dedicated arena crate).

use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::TableError;

pub(crate) type CompletionResult = Result<(), TableError>;

pub(crate) struct ReplicationContext {
    /// Set once `Commit` has been called for this group's seq.
    pub(crate) done: bool,
    /// Present once `Commit` has been called with a caller-supplied
    /// failure reason; `None` means the group replicated successfully
    /// (or hasn't been committed yet).
    pub(crate) failure: Option<String>,
    /// Number of staging nodes still referencing this context. The
    /// context is retired from the pending map when this reaches zero.
    pub(crate) associated_entries: usize,
    /// Taken by the `Commit` call for this group's own seq, the first
    /// (and only) time that call runs, so it can hand the receiver back
    /// to its caller as the commit's awaitable.
    completion_rx: Option<oneshot::Receiver<CompletionResult>>,
    /// Taken and fired by whichever `Commit` call drains this context
    /// (its own, or a later one that catches the head of staging up to
    /// it), strictly after that call has released the write lock.
    completion_tx: Option<oneshot::Sender<CompletionResult>>,
}

impl ReplicationContext {
    pub(crate) fn new(associated_entries: usize) -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            done: false,
            failure: None,
            associated_entries,
            completion_rx: Some(rx),
            completion_tx: Some(tx),
        }
    }

    /// Takes the receiver half. Returns `None` if already taken (this
    /// should only ever be called once, by the `Commit` call matching
    /// this context's own seq).
    pub(crate) fn take_receiver(&mut self) -> Option<oneshot::Receiver<CompletionResult>> {
        self.completion_rx.take()
    }

    /// Computes this group's outcome and takes the sender half so the
    /// caller can fire it outside the write lock. Returns `None` if
    /// already signaled.
    pub(crate) fn take_outcome(
        &mut self,
    ) -> Option<(CompletionResult, oneshot::Sender<CompletionResult>)> {
        let tx = self.completion_tx.take()?;
        let result = match self.failure.take() {
            Some(reason) => Err(TableError::ReplicationFailed(reason)),
            None => Ok(()),
        };
        Some((result, tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_starts_undone() {
        let ctx = ReplicationContext::new(2);
        assert!(!ctx.done);
        assert!(ctx.failure.is_none());
        assert_eq!(ctx.associated_entries, 2);
    }

    #[test]
    fn take_outcome_is_single_shot() {
        let mut ctx = ReplicationContext::new(1);
        ctx.done = true;
        let first = ctx.take_outcome();
        assert!(first.is_some());
        let second = ctx.take_outcome();
        assert!(second.is_none());
    }

    #[test]
    fn failed_context_reports_replication_failed() {
        let mut ctx = ReplicationContext::new(1);
        ctx.failure = Some("quorum lost".to_string());
        let (result, _tx) = ctx.take_outcome().unwrap();
        assert!(matches!(result, Err(TableError::ReplicationFailed(reason)) if reason == "quorum lost"));
    }
}
