//! Normalized inbound events.
//!
//! Host adapters translate whatever their code host reports into these typed
//! values. The gating core never sees raw webhook payloads.
//!
//! # Event Kinds
//!
//! | Kind | Payload | Effect on change state |
//! |------|---------|------------------------|
//! | `status-changed` | [`CommitStatus`] | replaces the `(sha, context)` entry |
//! | `review-added` | [`Review`] | replaces the reviewer's entry |
//! | `comment-added` | [`Comment`] | appended; snapshots untouched |
//! | `push` | branch + new head | moves the change head |
//! | `job-completed` | pipeline + outcome | pops the pipeline queue item |

mod envelope;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{ChangeId, Comment, CommitStatus, PipelineName, Review, Sha};

pub use envelope::{DecodeError, EventEnvelope};

/// The kind of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    StatusChanged,
    ReviewAdded,
    CommentAdded,
    Push,
    JobCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StatusChanged => "status-changed",
            EventKind::ReviewAdded => "review-added",
            EventKind::CommentAdded => "comment-added",
            EventKind::Push => "push",
            EventKind::JobCompleted => "job-completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status-changed" => Ok(EventKind::StatusChanged),
            "review-added" => Ok(EventKind::ReviewAdded),
            "comment-added" => Ok(EventKind::CommentAdded),
            "push" => Ok(EventKind::Push),
            "job-completed" => Ok(EventKind::JobCompleted),
            other => Err(other.to_string()),
        }
    }
}

/// A normalized, immutable record of one occurrence on a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A commit status was reported.
    StatusChanged(StatusChangedEvent),

    /// A review was submitted.
    ReviewAdded(ReviewAddedEvent),

    /// A comment was left on the change.
    CommentAdded(CommentAddedEvent),

    /// New commits were pushed; the change has a new head.
    Push(PushEvent),

    /// The external execution subsystem finished a job for this change.
    JobCompleted(JobCompletedEvent),
}

impl Event {
    /// Returns the change this event refers to.
    pub fn change(&self) -> &ChangeId {
        match self {
            Event::StatusChanged(e) => &e.change,
            Event::ReviewAdded(e) => &e.change,
            Event::CommentAdded(e) => &e.change,
            Event::Push(e) => &e.change,
            Event::JobCompleted(e) => &e.change,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::StatusChanged(_) => EventKind::StatusChanged,
            Event::ReviewAdded(_) => EventKind::ReviewAdded,
            Event::CommentAdded(_) => EventKind::CommentAdded,
            Event::Push(_) => EventKind::Push,
            Event::JobCompleted(_) => EventKind::JobCompleted,
        }
    }

    /// Returns the status payload if this is a status-changed event.
    pub fn status(&self) -> Option<&CommitStatus> {
        match self {
            Event::StatusChanged(e) => Some(&e.status),
            _ => None,
        }
    }

    /// Returns the review payload if this is a review-added event.
    pub fn review(&self) -> Option<&Review> {
        match self {
            Event::ReviewAdded(e) => Some(&e.review),
            _ => None,
        }
    }

    /// Returns the comment payload if this is a comment-added event.
    pub fn comment(&self) -> Option<&Comment> {
        match self {
            Event::CommentAdded(e) => Some(&e.comment),
            _ => None,
        }
    }

    /// Convenience constructor for a status-changed event.
    pub fn status_changed(change: ChangeId, status: CommitStatus) -> Self {
        Event::StatusChanged(StatusChangedEvent { change, status })
    }

    /// Convenience constructor for a review-added event.
    pub fn review_added(change: ChangeId, review: Review) -> Self {
        Event::ReviewAdded(ReviewAddedEvent { change, review })
    }

    /// Convenience constructor for a comment-added event.
    pub fn comment_added(change: ChangeId, comment: Comment) -> Self {
        Event::CommentAdded(CommentAddedEvent { change, comment })
    }

    /// Convenience constructor for a push event.
    pub fn push(change: ChangeId, branch: impl Into<String>, head: Sha) -> Self {
        Event::Push(PushEvent {
            change,
            branch: branch.into(),
            head,
        })
    }

    /// Convenience constructor for a job-completed event.
    pub fn job_completed(change: ChangeId, pipeline: PipelineName, outcome: JobOutcome) -> Self {
        Event::JobCompleted(JobCompletedEvent {
            change,
            pipeline,
            outcome,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub change: ChangeId,
    pub status: CommitStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAddedEvent {
    pub change: ChangeId,
    pub review: Review,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAddedEvent {
    pub change: ChangeId,
    pub comment: Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    pub change: ChangeId,

    /// The target branch of the change.
    pub branch: String,

    /// The new head commit.
    pub head: Sha,
}

/// How a job finished. The core only uses this for logging; any outcome
/// releases the queue slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    Success,
    Failure,
    Error,
    Aborted,
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobOutcome::Success => "success",
            JobOutcome::Failure => "failure",
            JobOutcome::Error => "error",
            JobOutcome::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCompletedEvent {
    pub change: ChangeId,
    pub pipeline: PipelineName,
    pub outcome: JobOutcome,
}
