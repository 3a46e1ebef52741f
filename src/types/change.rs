//! Status, review and comment records observed on a change.
//!
//! These are the payloads carried by inbound events and retained in the
//! per-change snapshot by the state store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::Sha;

/// Error returned when a status or review state string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} state: {value:?}")]
pub struct UnknownState {
    pub kind: &'static str,
    pub value: String,
}

/// State of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

impl StatusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
            StatusState::Failure => "failure",
            StatusState::Error => "error",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(StatusState::Pending),
            "success" => Ok(StatusState::Success),
            "failure" => Ok(StatusState::Failure),
            "error" => Ok(StatusState::Error),
            _ => Err(UnknownState {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// State of a review.
///
/// Serialized in kebab-case; parsing via [`FromStr`] also accepts GitHub's
/// spellings (`APPROVED`, `CHANGES_REQUESTED`, ...), case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ReviewState {
    Approve,
    RequestChanges,
    Comment,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Approve => "approve",
            ReviewState::RequestChanges => "request-changes",
            ReviewState::Comment => "comment",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "approve" | "approved" => Ok(ReviewState::Approve),
            "request-changes" | "changes-requested" => Ok(ReviewState::RequestChanges),
            "comment" | "commented" => Ok(ReviewState::Comment),
            _ => Err(UnknownState {
                kind: "review",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for StatusState {
    type Error = UnknownState;

    fn try_from(s: String) -> Result<Self, <StatusState as TryFrom<String>>::Error> {
        s.parse()
    }
}

impl TryFrom<String> for ReviewState {
    type Error = UnknownState;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A commit status report.
///
/// Keyed by `(sha, context)`: a later report for the same key supersedes the
/// earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    /// The commit this status was reported against.
    pub sha: Sha,

    /// The status context, e.g. `"check"` or `"ci/jenkins"`.
    pub context: String,

    pub state: StatusState,

    /// Login of the identity that reported the status.
    pub reporter: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A review left on a change.
///
/// Only the latest review per reviewer participates in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Login of the reviewer.
    pub reviewer: String,

    pub state: ReviewState,

    /// Host-reported submission time. Informational only: supersession
    /// follows arrival order, never this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Arrival sequence assigned by the state store. Inbound values are
    /// overwritten.
    #[serde(default)]
    pub sequence: u64,
}

impl Review {
    pub fn new(reviewer: impl Into<String>, state: ReviewState) -> Self {
        Review {
            reviewer: reviewer.into(),
            state,
            submitted_at: None,
            sequence: 0,
        }
    }
}

/// A comment left on a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
}

impl Comment {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Comment {
            author: author.into(),
            body: body.into(),
        }
    }
}
