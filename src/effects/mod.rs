//! Effects-as-data for job submission.
//!
//! The scheduler never talks to the execution subsystem directly. It returns
//! [`Effect`] values describing what should happen, and the dispatch loop hands
//! them to a [`JobExecutor`]. This keeps admission logic synchronous and
//! lets tests observe exactly what would have been submitted.

use serde::{Deserialize, Serialize};

pub mod executor;

pub use executor::{ChannelExecutor, JobExecutor, LoggingExecutor, SubmitError};

use crate::types::{ChangeId, PipelineName, Sha};

/// A request to run a pipeline's jobs for an admitted change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRequest {
    pub pipeline: PipelineName,
    pub change: ChangeId,

    /// The change head at admission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Sha>,

    /// Target branch, if a push has reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// An outbound action produced by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect_type", rename_all = "snake_case")]
pub enum Effect {
    /// Submit a job for a freshly enqueued change.
    SubmitJob(JobRequest),
}
