//! The wire shape of an inbound event: `{kind, change, payload}`.
//!
//! Producers that cannot build a typed [`Event`] (the HTTP ingress, external
//! adapters) submit envelopes instead. Decoding happens on the dispatch loop so
//! that malformed input is dropped and logged in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ChangeId, Comment, CommitStatus, PipelineName, Review, Sha};

use super::{
    CommentAddedEvent, Event, EventKind, JobCompletedEvent, JobOutcome, PushEvent,
    ReviewAddedEvent, StatusChangedEvent,
};

/// Error type for envelope decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The `kind` field names no known event kind.
    #[error("unknown event kind: {0:?}")]
    UnknownKind(String),

    /// The payload does not have the shape required by its kind.
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

/// An undecoded inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub kind: String,
    pub change: ChangeId,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawPush {
    branch: String,
    head: Sha,
}

#[derive(Debug, Deserialize)]
struct RawJobCompleted {
    pipeline: PipelineName,
    outcome: JobOutcome,
}

impl EventEnvelope {
    /// Decodes the envelope into a typed event.
    ///
    /// # Returns
    ///
    /// * `Ok(event)` - The kind is known and the payload matches it
    /// * `Err(DecodeError::UnknownKind)` - Unrecognized `kind`
    /// * `Err(DecodeError::Payload)` - Missing or mistyped payload fields
    pub fn decode(self) -> Result<Event, DecodeError> {
        let kind: EventKind = self.kind.parse().map_err(DecodeError::UnknownKind)?;
        let change = self.change;
        let payload = self.payload;
        let err = |source| DecodeError::Payload { kind, source };

        let event = match kind {
            EventKind::StatusChanged => {
                let status: CommitStatus = serde_json::from_value(payload).map_err(err)?;
                Event::StatusChanged(StatusChangedEvent { change, status })
            }
            EventKind::ReviewAdded => {
                let review: Review = serde_json::from_value(payload).map_err(err)?;
                Event::ReviewAdded(ReviewAddedEvent { change, review })
            }
            EventKind::CommentAdded => {
                let comment: Comment = serde_json::from_value(payload).map_err(err)?;
                Event::CommentAdded(CommentAddedEvent { change, comment })
            }
            EventKind::Push => {
                let raw: RawPush = serde_json::from_value(payload).map_err(err)?;
                Event::Push(PushEvent {
                    change,
                    branch: raw.branch,
                    head: raw.head,
                })
            }
            EventKind::JobCompleted => {
                let raw: RawJobCompleted = serde_json::from_value(payload).map_err(err)?;
                Event::JobCompleted(JobCompletedEvent {
                    change,
                    pipeline: raw.pipeline,
                    outcome: raw.outcome,
                })
            }
        };

        Ok(event)
    }
}
