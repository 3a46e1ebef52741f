//! Pipeline Gate - an event-driven CI gating core.
//!
//! This library ingests normalized code-review events, maintains per-change
//! status and review state, and admits changes into named pipelines whose
//! triggers and requirements they satisfy.

pub mod config;
pub mod effects;
pub mod events;
pub mod layout;
pub mod pipeline;
pub mod requirements;
pub mod server;
pub mod state;
pub mod triggers;
pub mod types;
pub mod worker;

#[cfg(test)]
mod test_utils;
