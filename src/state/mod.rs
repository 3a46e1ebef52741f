//! Change State Store.
//!
//! Aggregates the event history of every change into a snapshot of its latest
//! statuses and reviews. See [`store::ChangeStore::apply`] for the mutation
//! rules.

pub mod store;

pub use store::{ChangeRecord, ChangeStore};
