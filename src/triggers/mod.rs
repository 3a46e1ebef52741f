//! Trigger matching.
//!
//! A trigger decides whether an inbound event may cause its pipeline to
//! consider admitting the change. Matching proceeds in three steps, each of
//! which must pass:
//!
//! 1. The event kind is one of the trigger's `kinds`.
//! 2. Every event filter passes.
//! 3. The trigger's own requirement matches in event mode.
//!
//! # Event Filters
//!
//! | Key | Passes when |
//! |-----|-------------|
//! | `reporter` | status reporter equals the value |
//! | `context` | status context equals the value |
//! | `status` | status state equals the value |
//! | `reviewer` | review identity equals the value |
//! | `review-state` | review state equals the value |
//! | `author` | comment author equals the value |
//! | `comment` | comment body matches the regex |
//!
//! A filter applied to an event that does not carry its field fails.

use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

use crate::events::{Event, EventKind};
use crate::requirements::{MatchTarget, RequirementSpec, satisfied};
use crate::types::{ReviewState, StatusState, UnknownState};

/// Error building an [`EventFilter`] from its configured key and value.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown event filter key: {0:?}")]
    UnknownKey(String),

    #[error("invalid comment regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    UnknownState(#[from] UnknownState),
}

/// A single predicate over an event's payload fields.
#[derive(Debug, Clone)]
pub enum EventFilter {
    Reporter(String),
    Context(String),
    Status(StatusState),
    Reviewer(String),
    ReviewState(ReviewState),
    Author(String),
    Comment(Regex),
}

impl EventFilter {
    /// Builds a filter from a configuration key and its value.
    pub fn parse(key: &str, value: &str) -> Result<Self, FilterError> {
        let filter = match key {
            "reporter" => EventFilter::Reporter(value.to_string()),
            "context" => EventFilter::Context(value.to_string()),
            "status" => EventFilter::Status(value.parse()?),
            "reviewer" => EventFilter::Reviewer(value.to_string()),
            "review-state" => EventFilter::ReviewState(value.parse()?),
            "author" => EventFilter::Author(value.to_string()),
            "comment" => {
                let regex = Regex::new(value).map_err(|source| FilterError::InvalidRegex {
                    pattern: value.to_string(),
                    source,
                })?;
                EventFilter::Comment(regex)
            }
            other => return Err(FilterError::UnknownKey(other.to_string())),
        };
        Ok(filter)
    }

    /// Returns the configuration key of this filter.
    pub fn key(&self) -> &'static str {
        match self {
            EventFilter::Reporter(_) => "reporter",
            EventFilter::Context(_) => "context",
            EventFilter::Status(_) => "status",
            EventFilter::Reviewer(_) => "reviewer",
            EventFilter::ReviewState(_) => "review-state",
            EventFilter::Author(_) => "author",
            EventFilter::Comment(_) => "comment",
        }
    }

    /// Returns true if the event carries the filtered field and it passes.
    pub fn passes(&self, event: &Event) -> bool {
        match self {
            EventFilter::Reporter(reporter) => {
                event.status().is_some_and(|s| s.reporter == *reporter)
            }
            EventFilter::Context(context) => event.status().is_some_and(|s| s.context == *context),
            EventFilter::Status(state) => event.status().is_some_and(|s| s.state == *state),
            EventFilter::Reviewer(reviewer) => {
                event.review().is_some_and(|r| r.reviewer == *reviewer)
            }
            EventFilter::ReviewState(state) => event.review().is_some_and(|r| r.state == *state),
            EventFilter::Author(author) => event.comment().is_some_and(|c| c.author == *author),
            EventFilter::Comment(regex) => event.comment().is_some_and(|c| regex.is_match(&c.body)),
        }
    }
}

/// A rule describing which events may cause a pipeline to consider a change.
#[derive(Debug, Clone)]
pub struct TriggerSpec {
    /// Accepted event kinds. Never empty once loaded.
    pub kinds: BTreeSet<EventKind>,

    pub filters: Vec<EventFilter>,

    /// Evaluated in event mode against the triggering event.
    pub requirement: Option<RequirementSpec>,
}

impl TriggerSpec {
    /// A trigger on the given kinds with no filters and no requirement.
    pub fn on(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        TriggerSpec {
            kinds: kinds.into_iter().collect(),
            filters: Vec::new(),
            requirement: None,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_requirement(mut self, requirement: RequirementSpec) -> Self {
        self.requirement = Some(requirement);
        self
    }
}

/// Returns true if `event` passes the trigger's kinds, filters and
/// event-mode requirement.
pub fn match_trigger(trigger: &TriggerSpec, event: &Event) -> bool {
    trigger.kinds.contains(&event.kind())
        && trigger.filters.iter().all(|filter| filter.passes(event))
        && satisfied(trigger.requirement.as_ref(), MatchTarget::Event(event))
}
