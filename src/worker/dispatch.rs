//! The event dispatch loop.
//!
//! A single [`GateWorker`] task owns all mutable gate state and processes
//! messages strictly one at a time, in arrival order. Producers talk to it
//! through [`GateHandle`]s.
//!
//! # Phases
//!
//! The loop is `Idle` while blocked on an empty channel and `Processing` while
//! working through a burst of messages. The first message of a burst is taken
//! at an idle point; everything after it, up to the point the channel is empty
//! again, is taken while processing.
//!
//! Reconfiguration requests are phase-sensitive:
//! - taken at an idle point, a new layout applies immediately;
//! - taken while processing, it is parked, replacing any layout already
//!   parked, and applied once the burst has drained.
//!
//! # Shutdown
//!
//! The loop stops on a cancelled token, a `Shutdown` message, or when every
//! handle has been dropped. Messages still in the channel are discarded and
//! uncounted so quiescence waiters are released.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::effects::{Effect, JobExecutor};
use crate::events::Event;
use crate::layout::Layout;

use super::handle::GateHandle;
use super::message::LoopMessage;
use super::quiescence::Quiescence;
use super::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Processing,
}

/// The dispatch loop.
pub struct GateWorker<E> {
    scheduler: Scheduler,
    executor: E,
    rx: mpsc::UnboundedReceiver<LoopMessage>,
    quiescence: Quiescence,
    phase: Phase,

    /// Latest reconfiguration received while processing.
    parked: Option<Layout>,
}

impl<E: JobExecutor> GateWorker<E> {
    /// Creates a worker and the handle that feeds it.
    ///
    /// Messages sent through the handle before [`GateWorker::run`] is spawned
    /// are buffered and handled as one burst once it starts.
    pub fn new(layout: Layout, executor: E) -> (Self, GateHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let quiescence = Quiescence::new();
        let worker = GateWorker {
            scheduler: Scheduler::new(layout, quiescence.clone()),
            executor,
            rx,
            quiescence: quiescence.clone(),
            phase: Phase::Idle,
            parked: None,
        };
        (worker, GateHandle::new(tx, quiescence))
    }

    // ─── Async Event Loop ─────────────────────────────────────────────────────────

    /// Runs the loop until shutdown.
    #[instrument(skip_all)]
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            pipelines = self.scheduler.layout().pipelines().len(),
            "Dispatch loop started"
        );

        'outer: loop {
            self.enter_idle();

            let first = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping dispatch loop");
                    break;
                }

                msg = self.rx.recv() => match msg {
                    Some(msg) => msg,
                    None => {
                        info!("All handles dropped, stopping dispatch loop");
                        break;
                    }
                },
            };

            let mut next = Some(first);
            while let Some(msg) = next {
                if let LoopMessage::Shutdown = msg {
                    info!("Shutdown message received");
                    break 'outer;
                }
                self.handle_message(msg);
                self.phase = Phase::Processing;

                if shutdown.is_cancelled() {
                    info!("Shutdown signal received mid-burst, stopping dispatch loop");
                    break 'outer;
                }
                next = self.rx.try_recv().ok();
            }
        }

        self.discard_backlog();
        info!("Dispatch loop stopped");
    }

    /// Reaches an idle point: applies a parked layout, if any.
    fn enter_idle(&mut self) {
        self.phase = Phase::Idle;
        if let Some(layout) = self.parked.take() {
            debug!("Applying parked layout");
            self.scheduler.apply_layout(layout);
            self.quiescence.inbound_done();
        }
    }

    fn handle_message(&mut self, msg: LoopMessage) {
        match msg {
            LoopMessage::Event(event) => {
                self.process_event(&event);
                self.quiescence.inbound_done();
            }
            LoopMessage::Envelope(envelope) => {
                let change = envelope.change.clone();
                match envelope.decode() {
                    Ok(event) => self.process_event(&event),
                    Err(e) => warn!(change = %change, error = %e, "Dropping undecodable event"),
                }
                self.quiescence.inbound_done();
            }
            LoopMessage::Reconfigure(layout) => self.handle_reconfigure(layout),
            LoopMessage::Inspect(reply) => {
                if reply.send(self.scheduler.status()).is_err() {
                    debug!("Status requester went away");
                }
            }
            LoopMessage::Shutdown => {
                // Handled in run()
            }
        }
    }

    fn handle_reconfigure(&mut self, layout: Layout) {
        match self.phase {
            Phase::Idle => {
                self.scheduler.apply_layout(layout);
                self.quiescence.inbound_done();
            }
            Phase::Processing => {
                if self.parked.replace(layout).is_some() {
                    debug!("Parked layout superseded");
                    self.quiescence.inbound_done();
                } else {
                    debug!("Layout parked until idle");
                }
            }
        }
    }

    #[instrument(skip(self, event), fields(change = %event.change(), kind = %event.kind()))]
    fn process_event(&mut self, event: &Event) {
        let effects = self.scheduler.handle_event(event);
        self.execute_effects(effects);
    }

    /// Hands effects to the executor. A rejected submission releases the
    /// change's queue slot.
    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitJob(request) => {
                    let ticket = self.quiescence.job_ticket();
                    if let Err(e) = self.executor.submit(request.clone(), ticket) {
                        warn!(
                            pipeline = %request.pipeline,
                            change = %request.change,
                            error = %e,
                            "Job submission failed, releasing change"
                        );
                        self.scheduler.release(&request.pipeline, &request.change);
                    }
                }
            }
        }
    }

    /// Drops everything still queued, uncounting it.
    fn discard_backlog(&mut self) {
        self.rx.close();
        let mut discarded = 0usize;
        while let Ok(msg) = self.rx.try_recv() {
            if msg.is_counted() {
                self.quiescence.inbound_done();
                discarded += 1;
            }
        }
        if self.parked.take().is_some() {
            self.quiescence.inbound_done();
            discarded += 1;
        }
        if discarded > 0 {
            warn!(discarded, "Discarded unprocessed messages on shutdown");
        }
    }
}
