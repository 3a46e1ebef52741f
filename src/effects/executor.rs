//! Job executors.
//!
//! An executor receives [`JobRequest`]s from the dispatch loop. Submission is
//! fire-and-forget: `submit` must not block, and the job's result re-enters
//! the gate later as a `job-completed` event.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use super::JobRequest;
use crate::worker::JobTicket;

/// Errors an executor can report synchronously.
///
/// A failed submission releases the change's queue slot so a later qualifying
/// event can admit it again.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The execution subsystem cannot take jobs right now.
    #[error("executor unavailable: {0}")]
    Unavailable(String),

    /// The execution subsystem refused this particular job.
    #[error("job rejected: {0}")]
    Rejected(String),
}

/// Hands jobs to the external execution subsystem.
///
/// The `ticket` keeps the gate from reporting quiescence until the job has
/// been acknowledged; implementations ack or drop it once the job is safely
/// handed off.
pub trait JobExecutor: Send + 'static {
    fn submit(&self, request: JobRequest, ticket: JobTicket) -> Result<(), SubmitError>;
}

// ─── Logging Executor ─────────────────────────────────────────────────────────

/// An executor that logs requests without running anything.
///
/// Jobs submitted here never complete on their own; completion must be
/// reported through the event ingress.
#[derive(Debug, Clone, Default)]
pub struct LoggingExecutor;

impl LoggingExecutor {
    pub fn new() -> Self {
        LoggingExecutor
    }
}

impl JobExecutor for LoggingExecutor {
    fn submit(&self, request: JobRequest, ticket: JobTicket) -> Result<(), SubmitError> {
        info!(
            pipeline = %request.pipeline,
            change = %request.change,
            head = request.head.as_ref().map(|h| h.short()),
            "Job submitted (logged, not executed)"
        );
        ticket.ack();
        Ok(())
    }
}

// ─── Channel Executor ─────────────────────────────────────────────────────────

/// An executor that forwards requests, with their tickets, over a channel.
///
/// The receiving side owns the tickets and decides when each job counts as
/// acknowledged.
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    tx: mpsc::UnboundedSender<(JobRequest, JobTicket)>,
}

impl ChannelExecutor {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(JobRequest, JobTicket)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelExecutor { tx }, rx)
    }
}

impl JobExecutor for ChannelExecutor {
    fn submit(&self, request: JobRequest, ticket: JobTicket) -> Result<(), SubmitError> {
        self.tx
            .send((request, ticket))
            .map_err(|_| SubmitError::Unavailable("job receiver dropped".to_string()))
    }
}
