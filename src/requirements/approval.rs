//! Review approval requirements.

use std::collections::BTreeSet;

use crate::types::{Review, ReviewState};

use super::MatchTarget;

/// Requires a review by one of `usernames` in one of `states`.
///
/// Both filters apply to the *same* review entry: two different reviews each
/// satisfying one filter do not satisfy the requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalRequirement {
    /// Accepted reviewers. `None` accepts anyone.
    pub usernames: Option<BTreeSet<String>>,

    /// Accepted review states. `None` accepts any state.
    pub states: Option<BTreeSet<ReviewState>>,
}

impl ApprovalRequirement {
    /// Returns true if this single review passes both filters.
    pub fn accepts(&self, review: &Review) -> bool {
        self.usernames
            .as_ref()
            .is_none_or(|names| names.contains(&review.reviewer))
            && self
                .states
                .as_ref()
                .is_none_or(|states| states.contains(&review.state))
    }

    /// Snapshot mode: some latest-per-reviewer review is accepted.
    /// Event mode: the event is a review and it is accepted.
    pub fn matches(&self, target: MatchTarget<'_>) -> bool {
        match target {
            MatchTarget::Snapshot(record) => record.latest_reviews().any(|r| self.accepts(r)),
            MatchTarget::Event(event) => event.review().is_some_and(|r| self.accepts(r)),
        }
    }
}
