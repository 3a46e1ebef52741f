//! FIFO queue of changes admitted to a pipeline.
//!
//! Items are ordered by admission sequence. A change appears at most once:
//! re-admitting a queued change is a no-op, so re-delivered events never
//! duplicate work. Items leave the queue when their job completes.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::types::{ChangeId, Sha};

/// An admitted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueItem {
    pub change: ChangeId,

    /// The change head at admission time, if one was known.
    pub head: Option<Sha>,

    /// Admission order within this queue. Lower numbers were admitted first.
    pub sequence: u64,
}

/// A deduplicating FIFO of [`QueueItem`]s.
#[derive(Debug, Default)]
pub struct PipelineQueue {
    items: VecDeque<QueueItem>,

    /// Counter for generating sequence numbers.
    next_sequence: u64,

    /// Changes currently in the queue.
    queued: HashSet<ChangeId>,
}

impl PipelineQueue {
    pub fn new() -> Self {
        PipelineQueue::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, change: &ChangeId) -> bool {
        self.queued.contains(change)
    }

    /// Appends a change.
    ///
    /// Returns `true` if the change was enqueued, `false` if it was already
    /// in the queue.
    pub fn push(&mut self, change: ChangeId, head: Option<Sha>) -> bool {
        if self.queued.contains(&change) {
            return false;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.queued.insert(change.clone());
        self.items.push_back(QueueItem {
            change,
            head,
            sequence,
        });
        true
    }

    /// Removes the item for `change`, wherever it is in the queue.
    pub fn remove(&mut self, change: &ChangeId) -> Option<QueueItem> {
        if !self.queued.remove(change) {
            return None;
        }
        let index = self.items.iter().position(|item| item.change == *change)?;
        self.items.remove(index)
    }

    /// Items in admission order.
    pub fn items(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}
