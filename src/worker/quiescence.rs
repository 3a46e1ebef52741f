//! Quiescence detection.
//!
//! The gate is quiescent when nothing is in flight:
//!
//! | Counter | Incremented | Decremented |
//! |---------|-------------|-------------|
//! | `pending_inbound` | by a producer, *before* enqueueing | by the loop, *after* the message is fully processed |
//! | `evaluating` | when an admission evaluation starts | when it finishes ([`EvaluationGuard`] drop) |
//! | `outstanding_jobs` | when a job is handed to the executor | on [`JobTicket::ack`] or drop |
//!
//! Because producers count a message before it is visible to the loop and the
//! loop only uncounts it once its effects have been issued, there is no window
//! in which all counters read zero while work is still pending.

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Counters {
    pending_inbound: AtomicUsize,
    evaluating: AtomicUsize,
    outstanding_jobs: AtomicUsize,
    idle: Notify,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuiescenceCounts {
    pub pending_inbound: usize,
    pub evaluating: usize,
    pub outstanding_jobs: usize,
}

impl QuiescenceCounts {
    pub fn is_zero(&self) -> bool {
        self.pending_inbound == 0 && self.evaluating == 0 && self.outstanding_jobs == 0
    }
}

/// Shared handle to the quiescence counters.
#[derive(Debug, Clone, Default)]
pub struct Quiescence {
    inner: Arc<Counters>,
}

impl Quiescence {
    pub fn new() -> Self {
        Quiescence::default()
    }

    pub fn counts(&self) -> QuiescenceCounts {
        QuiescenceCounts {
            pending_inbound: self.inner.pending_inbound.load(Ordering::SeqCst),
            evaluating: self.inner.evaluating.load(Ordering::SeqCst),
            outstanding_jobs: self.inner.outstanding_jobs.load(Ordering::SeqCst),
        }
    }

    /// Returns true if no inbound message, evaluation or job is outstanding.
    pub fn is_quiescent(&self) -> bool {
        self.counts().is_zero()
    }

    /// Waits until the gate is quiescent. Returns immediately if it already is.
    pub async fn wait_quiescent(&self) {
        loop {
            // Register interest before checking, so a transition to idle
            // between the check and the await is not missed.
            let mut notified = pin!(self.inner.idle.notified());
            notified.as_mut().enable();

            if self.is_quiescent() {
                return;
            }
            notified.await;
        }
    }

    /// Counts a message a producer is about to enqueue.
    pub(crate) fn inbound_enqueued(&self) {
        self.inner.pending_inbound.fetch_add(1, Ordering::SeqCst);
    }

    /// Uncounts a message that was processed, superseded, or never delivered.
    pub(crate) fn inbound_done(&self) {
        self.inner.pending_inbound.fetch_sub(1, Ordering::SeqCst);
        self.wake_if_quiescent();
    }

    /// Counts an admission evaluation for as long as the guard lives.
    pub(crate) fn begin_evaluation(&self) -> EvaluationGuard {
        self.inner.evaluating.fetch_add(1, Ordering::SeqCst);
        EvaluationGuard {
            quiescence: self.clone(),
        }
    }

    /// Issues a ticket for a job handed to the executor.
    pub fn job_ticket(&self) -> JobTicket {
        self.inner.outstanding_jobs.fetch_add(1, Ordering::SeqCst);
        JobTicket {
            quiescence: self.clone(),
        }
    }

    fn wake_if_quiescent(&self) {
        if self.is_quiescent() {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Marks an admission evaluation in progress.
#[derive(Debug)]
pub struct EvaluationGuard {
    quiescence: Quiescence,
}

impl Drop for EvaluationGuard {
    fn drop(&mut self) {
        self.quiescence
            .inner
            .evaluating
            .fetch_sub(1, Ordering::SeqCst);
        self.quiescence.wake_if_quiescent();
    }
}

/// Acknowledgement owed by the executor for one submitted job.
///
/// The gate is not quiescent while any ticket is alive. Executors call
/// [`JobTicket::ack`] once the job has been accepted downstream; dropping the
/// ticket has the same effect.
#[derive(Debug)]
#[must_use = "dropping a ticket acknowledges the job"]
pub struct JobTicket {
    quiescence: Quiescence,
}

impl JobTicket {
    /// Acknowledges the job.
    pub fn ack(self) {}
}

impl Drop for JobTicket {
    fn drop(&mut self) {
        self.quiescence
            .inner
            .outstanding_jobs
            .fetch_sub(1, Ordering::SeqCst);
        self.quiescence.wake_if_quiescent();
    }
}
