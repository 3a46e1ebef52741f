//! The admission gate.

use crate::requirements::{MatchTarget, satisfied};
use crate::state::ChangeRecord;

use super::Pipeline;

/// Outcome of evaluating a pipeline's requirement for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Reject,
}

impl Decision {
    pub fn is_admit(self) -> bool {
        self == Decision::Admit
    }
}

/// Evaluates the pipeline requirement in snapshot mode.
///
/// Callers are expected to have already established that one of the
/// pipeline's triggers accepted the causing event.
pub fn admit(pipeline: &Pipeline, change: &ChangeRecord) -> Decision {
    if satisfied(pipeline.requirement.as_ref(), MatchTarget::Snapshot(change)) {
        Decision::Admit
    } else {
        Decision::Reject
    }
}
