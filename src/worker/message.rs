//! Messages accepted by the dispatch loop.

use tokio::sync::oneshot;

use crate::events::{Event, EventEnvelope};
use crate::layout::Layout;

use super::scheduler::GateStatus;

/// Messages sent to the dispatch loop.
///
/// The loop receives these via `tokio::sync::mpsc` and handles them one at a
/// time, in arrival order.
#[derive(Debug)]
pub enum LoopMessage {
    /// An already-normalized event.
    Event(Event),

    /// A raw envelope; decoded inside the loop and dropped if malformed.
    Envelope(EventEnvelope),

    /// Replace the pipeline layout.
    ///
    /// Applied immediately when the loop is idle. Received mid-burst, it is
    /// parked until the backlog is drained, and a newer request replaces a
    /// parked one.
    Reconfigure(Layout),

    /// Ask for a view of the queues.
    Inspect(oneshot::Sender<GateStatus>),

    /// Stop the loop after the current message.
    Shutdown,
}

impl LoopMessage {
    /// Returns true if the message is counted as pending inbound work.
    pub(crate) fn is_counted(&self) -> bool {
        matches!(
            self,
            LoopMessage::Event(_) | LoopMessage::Envelope(_) | LoopMessage::Reconfigure(_)
        )
    }
}
