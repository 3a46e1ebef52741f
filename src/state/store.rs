//! Per-change aggregated state derived from the event history.
//!
//! The store is owned by the dispatch loop and mutated only from there, so no
//! locking is involved. Every mutation is visible to the next evaluation
//! immediately.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::events::Event;
use crate::types::{ChangeId, CommitStatus, Review, Sha};

/// Where a change's head commit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadSource {
    /// Taken from the most recent status report. A status on another commit
    /// moves it.
    Status,

    /// Set by a push. Only a later push moves it.
    Push,
}

/// Aggregated state for one change.
///
/// Holds the latest status per `(sha, context)` and the latest review per
/// reviewer, in event arrival order. Superseded entries are gone; they can
/// never participate in matching. Comments are not retained: they only ever
/// matter as triggering events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    id: ChangeId,
    branch: Option<String>,
    head: Option<(Sha, HeadSource)>,
    statuses: BTreeMap<(Sha, String), CommitStatus>,
    reviews: BTreeMap<String, Review>,
}

impl ChangeRecord {
    fn new(id: ChangeId) -> Self {
        ChangeRecord {
            id,
            branch: None,
            head: None,
            statuses: BTreeMap::new(),
            reviews: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &ChangeId {
        &self.id
    }

    /// The target branch, once a push has told us.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// The current head commit, if known.
    pub fn head(&self) -> Option<&Sha> {
        self.head.as_ref().map(|(sha, _)| sha)
    }

    /// Latest statuses reported against the current head, one per context.
    ///
    /// Statuses on earlier heads are retained but not returned.
    pub fn current_statuses(&self) -> impl Iterator<Item = &CommitStatus> {
        let head = self.head();
        self.statuses
            .values()
            .filter(move |status| Some(&status.sha) == head)
    }

    /// The latest status for `context` on the current head.
    pub fn current_status(&self, context: &str) -> Option<&CommitStatus> {
        let head = self.head()?;
        self.statuses.get(&(head.clone(), context.to_string()))
    }

    /// Latest review per reviewer.
    pub fn latest_reviews(&self) -> impl Iterator<Item = &Review> {
        self.reviews.values()
    }
}

/// Owns the [`ChangeRecord`] of every change seen so far.
#[derive(Debug, Default)]
pub struct ChangeStore {
    changes: HashMap<ChangeId, ChangeRecord>,

    /// Arrival counter stamped onto reviews.
    next_sequence: u64,
}

impl ChangeStore {
    pub fn new() -> Self {
        ChangeStore::default()
    }

    /// Returns the number of tracked changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, change: &ChangeId) -> Option<&ChangeRecord> {
        self.changes.get(change)
    }

    /// Applies an event to the referenced change, creating it if needed.
    ///
    /// | Event | Mutation |
    /// |-------|----------|
    /// | status-changed | replace the `(sha, context)` entry; follow the sha unless pushed |
    /// | review-added | replace the reviewer's entry |
    /// | comment-added | none |
    /// | push | set head and branch |
    /// | job-completed | none |
    ///
    /// A head taken from a status follows later statuses on other commits.
    /// Once a push has set it, only another push moves it.
    pub fn apply(&mut self, event: &Event) -> &ChangeRecord {
        self.next_sequence += 1;
        let sequence = self.next_sequence;

        let record = self
            .changes
            .entry(event.change().clone())
            .or_insert_with(|| ChangeRecord::new(event.change().clone()));

        match event {
            Event::StatusChanged(e) => {
                let status = &e.status;
                let adopt = match &record.head {
                    None => true,
                    Some((sha, HeadSource::Status)) => *sha != status.sha,
                    Some((_, HeadSource::Push)) => false,
                };
                if adopt {
                    trace!(
                        change = %record.id,
                        head = %status.sha.short(),
                        "Head adopted from status"
                    );
                    record.head = Some((status.sha.clone(), HeadSource::Status));
                }
                let key = (status.sha.clone(), status.context.clone());
                if let Some(previous) = record.statuses.insert(key, status.clone()) {
                    trace!(
                        change = %record.id,
                        context = %status.context,
                        previous = %previous.state,
                        current = %status.state,
                        "Status superseded"
                    );
                }
            }
            Event::ReviewAdded(e) => {
                let mut review = e.review.clone();
                review.sequence = sequence;
                if let Some(previous) = record.reviews.insert(review.reviewer.clone(), review) {
                    trace!(
                        change = %record.id,
                        reviewer = %previous.reviewer,
                        previous = %previous.state,
                        "Review superseded"
                    );
                }
            }
            Event::CommentAdded(_) => {}
            Event::Push(e) => {
                trace!(change = %record.id, head = %e.head.short(), "Head moved");
                record.head = Some((e.head.clone(), HeadSource::Push));
                record.branch = Some(e.branch.clone());
            }
            Event::JobCompleted(_) => {}
        }

        record
    }
}
