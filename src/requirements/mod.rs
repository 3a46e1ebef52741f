//! Requirement matching.
//!
//! A [`RequirementSpec`] is a declarative predicate over either a change's
//! aggregated state ([`MatchTarget::Snapshot`]) or a single inbound event
//! ([`MatchTarget::Event`]). Pipelines evaluate their requirement in snapshot
//! mode ("is the change *currently* acceptable?"); triggers evaluate theirs in
//! event mode ("was *this event* itself acceptable?").
//!
//! Matching is total: every combination of requirement and target yields a boolean,
//! and absent filters match everything. Anything a filter cannot see fails the
//! match rather than passing it.

mod approval;
mod status;

use crate::events::Event;
use crate::state::ChangeRecord;

pub use approval::ApprovalRequirement;
pub use status::StatusRequirement;

/// What a requirement is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum MatchTarget<'a> {
    /// The change's accumulated latest state.
    Snapshot(&'a ChangeRecord),

    /// A single inbound event's own payload.
    Event(&'a Event),
}

/// A composable admission predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSpec {
    /// Gate on commit status.
    Status(StatusRequirement),

    /// Gate on reviews.
    Approval(ApprovalRequirement),

    /// Every nested requirement must match. Vacuously true when empty.
    All(Vec<RequirementSpec>),

    /// At least one nested requirement must match.
    Any(Vec<RequirementSpec>),
}

impl RequirementSpec {
    /// Evaluates the requirement against `target`.
    pub fn matches(&self, target: MatchTarget<'_>) -> bool {
        match self {
            RequirementSpec::Status(req) => req.matches(target),
            RequirementSpec::Approval(req) => req.matches(target),
            RequirementSpec::All(reqs) => reqs.iter().all(|req| req.matches(target)),
            RequirementSpec::Any(reqs) => reqs.iter().any(|req| req.matches(target)),
        }
    }
}

/// Evaluates an optional requirement; no requirement means no gating.
pub fn satisfied(requirement: Option<&RequirementSpec>, target: MatchTarget<'_>) -> bool {
    requirement.is_none_or(|req| req.matches(target))
}
