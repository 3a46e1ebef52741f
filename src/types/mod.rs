//! Core domain types for the gating core.
//!
//! This module contains the identifiers and observed records used throughout
//! the crate, designed to encode invariants via the type system.

pub mod change;
pub mod ids;

// Re-export commonly used types at the module level
pub use change::{Comment, CommitStatus, Review, ReviewState, StatusState, UnknownState};
pub use ids::{ChangeId, PipelineName, ProjectId, ProjectIdError, Sha};
