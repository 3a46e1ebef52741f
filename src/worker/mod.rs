//! The gate runtime: dispatch loop, producer handle and quiescence detection.
//!
//! # Architecture
//!
//! - One [`GateWorker`] task owns the layout, change state and queues, and
//!   processes messages serially in arrival order.
//! - Producers hold cloneable [`GateHandle`]s that enqueue onto an unbounded
//!   channel.
//! - A shared [`Quiescence`] detector tracks pending messages, in-progress
//!   admission evaluations and unacknowledged jobs.
//!
//! # Module Structure
//!
//! - [`scheduler`]: synchronous state and admission logic
//! - [`message`]: loop message types
//! - [`quiescence`]: counters and the idle wait
//! - `dispatch` / `handle`: the async loop around the scheduler and its
//!   producer side

mod dispatch;
mod handle;
pub mod message;
pub mod quiescence;
pub mod scheduler;


pub use dispatch::GateWorker;
pub use handle::{GateHandle, HandleError};
pub use message::LoopMessage;
pub use quiescence::{EvaluationGuard, JobTicket, Quiescence, QuiescenceCounts};
pub use scheduler::{GateStatus, PipelineStatus, Scheduler};
