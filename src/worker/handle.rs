//! Producer-side handle to the dispatch loop.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::events::{Event, EventEnvelope};
use crate::layout::Layout;

use super::message::LoopMessage;
use super::quiescence::Quiescence;
use super::scheduler::GateStatus;

/// Error returned when the dispatch loop is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("dispatch loop has stopped")]
    Closed,
}

/// Cloneable handle for submitting work to a running gate.
///
/// Every counted message is registered with the quiescence detector before it
/// is enqueued, so a caller that sends and then waits for quiescence always
/// observes the effects of what it sent.
#[derive(Debug, Clone)]
pub struct GateHandle {
    tx: mpsc::UnboundedSender<LoopMessage>,
    quiescence: Quiescence,
}

impl GateHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<LoopMessage>, quiescence: Quiescence) -> Self {
        GateHandle { tx, quiescence }
    }

    /// Enqueues a normalized event.
    pub fn send(&self, event: Event) -> Result<(), HandleError> {
        self.enqueue(LoopMessage::Event(event))
    }

    /// Enqueues a raw envelope for decoding inside the loop.
    pub fn send_envelope(&self, envelope: EventEnvelope) -> Result<(), HandleError> {
        self.enqueue(LoopMessage::Envelope(envelope))
    }

    /// Requests a layout swap at the loop's next idle point.
    pub fn reconfigure(&self, layout: Layout) -> Result<(), HandleError> {
        self.enqueue(LoopMessage::Reconfigure(layout))
    }

    /// Enqueues an inspection request and returns the reply channel.
    ///
    /// The reply reflects every message enqueued before this one.
    pub fn request_status(&self) -> Result<oneshot::Receiver<GateStatus>, HandleError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(LoopMessage::Inspect(reply))
            .map_err(|_| HandleError::Closed)?;
        Ok(rx)
    }

    /// Returns a view of the queues once every earlier message is processed.
    pub async fn status(&self) -> Result<GateStatus, HandleError> {
        self.request_status()?
            .await
            .map_err(|_| HandleError::Closed)
    }

    /// Asks the loop to stop.
    pub fn shutdown(&self) -> Result<(), HandleError> {
        self.tx
            .send(LoopMessage::Shutdown)
            .map_err(|_| HandleError::Closed)
    }

    pub fn is_quiescent(&self) -> bool {
        self.quiescence.is_quiescent()
    }

    /// Waits until no event, evaluation or job acknowledgement is outstanding.
    pub async fn wait_quiescent(&self) {
        self.quiescence.wait_quiescent().await
    }

    pub fn quiescence(&self) -> &Quiescence {
        &self.quiescence
    }

    fn enqueue(&self, message: LoopMessage) -> Result<(), HandleError> {
        self.quiescence.inbound_enqueued();
        if self.tx.send(message).is_err() {
            self.quiescence.inbound_done();
            return Err(HandleError::Closed);
        }
        Ok(())
    }
}
