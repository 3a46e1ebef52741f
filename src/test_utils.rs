//! Shared test builders and arbitrary generators for property-based testing.

use crate::events::Event;
use crate::types::{
    ChangeId, Comment, CommitStatus, ProjectId, Review, ReviewState, Sha, StatusState,
};
use proptest::prelude::*;

/// The project every test pipeline listens to.
pub fn project() -> ProjectId {
    ProjectId::new("org", "project1")
}

pub fn change_id(number: u64) -> ChangeId {
    ChangeId::new(project(), number)
}

pub fn status(sha: Sha, context: &str, state: StatusState, reporter: &str) -> CommitStatus {
    CommitStatus {
        sha,
        context: context.to_string(),
        state,
        reporter: reporter.to_string(),
        target_url: None,
        description: None,
    }
}

pub fn review(reviewer: &str, state: ReviewState) -> Review {
    Review::new(reviewer, state)
}

pub fn arb_sha() -> impl Strategy<Value = Sha> {
    prop_oneof![Just('a'), Just('b')].prop_map(|c| Sha::new(c.to_string().repeat(40)))
}

pub fn arb_status_state() -> impl Strategy<Value = StatusState> {
    prop_oneof![
        Just(StatusState::Pending),
        Just(StatusState::Success),
        Just(StatusState::Failure),
        Just(StatusState::Error),
    ]
}

pub fn arb_review_state() -> impl Strategy<Value = ReviewState> {
    prop_oneof![
        Just(ReviewState::Approve),
        Just(ReviewState::RequestChanges),
        Just(ReviewState::Comment),
    ]
}

/// Status reports on a small set of shas, contexts and reporters so that
/// supersession actually happens.
pub fn arb_status_event(number: u64) -> impl Strategy<Value = Event> {
    (
        arb_sha(),
        prop_oneof![Just("check"), Just("lint")],
        arb_status_state(),
        prop_oneof![Just("zuul"), Just("foo")],
    )
        .prop_map(move |(sha, context, state, reporter)| {
            Event::status_changed(change_id(number), status(sha, context, state, reporter))
        })
}

pub fn arb_review_event(number: u64) -> impl Strategy<Value = Event> {
    (
        prop_oneof![Just("derp"), Just("herp"), Just("nobody")],
        arb_review_state(),
    )
        .prop_map(move |(reviewer, state)| {
            Event::review_added(change_id(number), review(reviewer, state))
        })
}

pub fn arb_comment_event(number: u64) -> impl Strategy<Value = Event> {
    prop_oneof![Just("test me"), Just("recheck"), Just("lgtm")].prop_map(move |body| {
        Event::comment_added(change_id(number), Comment::new("derp", body))
    })
}

pub fn arb_push_event(number: u64) -> impl Strategy<Value = Event> {
    arb_sha().prop_map(move |head| Event::push(change_id(number), "master", head))
}

/// Any non-completion event on one of three changes.
pub fn arb_event() -> impl Strategy<Value = Event> {
    (1u64..=3).prop_flat_map(|number| {
        prop_oneof![
            3 => arb_status_event(number),
            3 => arb_review_event(number),
            2 => arb_comment_event(number),
            1 => arb_push_event(number),
        ]
    })
}
