//! Commit status requirements.

use std::collections::BTreeSet;

use crate::types::{CommitStatus, StatusState};

use super::MatchTarget;

/// Requires a status in one of `states`, optionally restricted to a context
/// and to a reporting identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequirement {
    /// Only statuses with this context count. `None` accepts any context.
    pub context: Option<String>,

    /// Accepted states. Defaults to `{success}`.
    pub states: BTreeSet<StatusState>,

    /// Only statuses reported by this identity count. `None` accepts anyone.
    pub reporter: Option<String>,
}

impl Default for StatusRequirement {
    fn default() -> Self {
        StatusRequirement {
            context: None,
            states: BTreeSet::from([StatusState::Success]),
            reporter: None,
        }
    }
}

impl StatusRequirement {
    /// Requires `success` on the given context.
    pub fn for_context(context: impl Into<String>) -> Self {
        StatusRequirement {
            context: Some(context.into()),
            ..Self::default()
        }
    }

    /// Returns true if this single status passes every filter.
    pub fn accepts(&self, status: &CommitStatus) -> bool {
        self.context.as_ref().is_none_or(|c| *c == status.context)
            && self.reporter.as_ref().is_none_or(|r| *r == status.reporter)
            && self.states.contains(&status.state)
    }

    /// Snapshot mode: some current-head status is accepted.
    /// Event mode: the event is a status report and it is accepted.
    pub fn matches(&self, target: MatchTarget<'_>) -> bool {
        match target {
            MatchTarget::Snapshot(record) => record.current_statuses().any(|s| self.accepts(s)),
            MatchTarget::Event(event) => event.status().is_some_and(|s| self.accepts(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::state::ChangeStore;
    use crate::test_utils::{change_id, status};
    use crate::types::{Comment, Sha};

    fn sha(c: char) -> Sha {
        Sha::new(c.to_string().repeat(40))
    }

    fn snapshot_matches(req: &StatusRequirement, events: &[Event]) -> bool {
        let mut store = ChangeStore::new();
        for event in events {
            store.apply(event);
        }
        match store.get(&change_id(1)) {
            Some(record) => req.matches(MatchTarget::Snapshot(record)),
            None => false,
        }
    }

    fn status_event(state: StatusState, context: &str, reporter: &str) -> Event {
        Event::status_changed(change_id(1), status(sha('a'), context, state, reporter))
    }

    #[test]
    fn absent_status_does_not_match() {
        let req = StatusRequirement::for_context("check");
        let comment = Event::comment_added(change_id(1), Comment::new("derp", "test me"));
        assert!(!snapshot_matches(&req, &[comment]));
    }

    #[test]
    fn only_success_matches_by_default() {
        let req = StatusRequirement::for_context("check");
        for state in [StatusState::Error, StatusState::Failure, StatusState::Pending] {
            assert!(
                !snapshot_matches(&req, &[status_event(state, "check", "zuul")]),
                "{state} must not match"
            );
        }
        assert!(snapshot_matches(
            &req,
            &[status_event(StatusState::Success, "check", "zuul")]
        ));
    }

    #[test]
    fn latest_status_wins() {
        let req = StatusRequirement::for_context("check");
        assert!(!snapshot_matches(
            &req,
            &[
                status_event(StatusState::Success, "check", "zuul"),
                status_event(StatusState::Failure, "check", "zuul"),
            ]
        ));
    }

    #[test]
    fn other_context_does_not_match() {
        let req = StatusRequirement::for_context("check");
        assert!(!snapshot_matches(
            &req,
            &[status_event(StatusState::Success, "lint", "zuul")]
        ));
    }

    #[test]
    fn unfiltered_context_matches_any_context() {
        let req = StatusRequirement::default();
        assert!(snapshot_matches(
            &req,
            &[status_event(StatusState::Success, "lint", "zuul")]
        ));
    }

    #[test]
    fn stale_head_status_does_not_match() {
        let req = StatusRequirement::for_context("check");
        let events = [
            Event::push(change_id(1), "master", sha('a')),
            status_event(StatusState::Success, "check", "zuul"),
            Event::push(change_id(1), "master", sha('b')),
        ];
        assert!(!snapshot_matches(&req, &events));
    }

    #[test]
    fn event_mode_checks_reporter() {
        let req = StatusRequirement {
            reporter: Some("zuul".to_string()),
            ..StatusRequirement::default()
        };

        let foo = status_event(StatusState::Success, "check", "foo");
        assert!(!req.matches(MatchTarget::Event(&foo)));

        let zuul = status_event(StatusState::Success, "check", "zuul");
        assert!(req.matches(MatchTarget::Event(&zuul)));
    }

    #[test]
    fn event_mode_ignores_snapshot_and_non_status_events() {
        let req = StatusRequirement::default();
        let comment = Event::comment_added(change_id(1), Comment::new("zuul", "success"));
        assert!(!req.matches(MatchTarget::Event(&comment)));

        let error = status_event(StatusState::Error, "check", "zuul");
        assert!(!req.matches(MatchTarget::Event(&error)));
    }

    #[test]
    fn multiple_allowed_states() {
        let req = StatusRequirement {
            states: BTreeSet::from([StatusState::Failure, StatusState::Error]),
            ..StatusRequirement::for_context("check")
        };
        assert!(snapshot_matches(
            &req,
            &[status_event(StatusState::Error, "check", "zuul")]
        ));
        assert!(!snapshot_matches(
            &req,
            &[status_event(StatusState::Success, "check", "zuul")]
        ));
    }
}
