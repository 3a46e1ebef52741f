//! Synchronous scheduling core.
//!
//! The [`Scheduler`] owns every piece of mutable gate state: the layout, the
//! change store and one queue per pipeline. It is driven one event at a time
//! by the dispatch loop and returns effects as data; it performs no I/O.
//!
//! # Event Handling
//!
//! 1. A `job-completed` event releases the change from the named pipeline's
//!    queue. Naming an unknown pipeline drops the event.
//! 2. Events for a project no pipeline lists are dropped without creating a
//!    change.
//! 3. The event is applied to the change store.
//! 4. For each pipeline listing the project, the first trigger that accepts
//!    the event leads to the admission gate. An admitted change that was not
//!    already queued is enqueued and a [`Effect::SubmitJob`] is emitted.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::effects::{Effect, JobRequest};
use crate::events::Event;
use crate::layout::Layout;
use crate::pipeline::{PipelineQueue, QueueItem, admit};
use crate::state::ChangeStore;
use crate::types::{ChangeId, PipelineName};

use super::quiescence::{Quiescence, QuiescenceCounts};

/// Queue contents of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub name: PipelineName,
    pub queue: Vec<QueueItem>,
}

/// Read-only view of the gate, answered in order by the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateStatus {
    /// Pipelines in configuration order.
    pub pipelines: Vec<PipelineStatus>,

    /// Number of changes with recorded state.
    pub changes: usize,

    pub quiescence: QuiescenceCounts,
}

impl GateStatus {
    pub fn pipeline(&self, name: &str) -> Option<&PipelineStatus> {
        self.pipelines.iter().find(|p| p.name.as_str() == name)
    }
}

/// The single-writer gate state.
#[derive(Debug)]
pub struct Scheduler {
    layout: Layout,
    store: ChangeStore,
    queues: BTreeMap<PipelineName, PipelineQueue>,
    quiescence: Quiescence,
}

impl Scheduler {
    pub fn new(layout: Layout, quiescence: Quiescence) -> Self {
        let queues = layout
            .pipelines()
            .iter()
            .map(|p| (p.name.clone(), PipelineQueue::new()))
            .collect();
        Scheduler {
            layout,
            store: ChangeStore::new(),
            queues,
            quiescence,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn store(&self) -> &ChangeStore {
        &self.store
    }

    pub fn queue(&self, pipeline: &PipelineName) -> Option<&PipelineQueue> {
        self.queues.get(pipeline)
    }

    /// Processes one event and returns the effects it produced.
    pub fn handle_event(&mut self, event: &Event) -> Vec<Effect> {
        let change = event.change();

        if let Event::JobCompleted(completed) = event {
            let Some(queue) = self.queues.get_mut(&completed.pipeline) else {
                warn!(
                    pipeline = %completed.pipeline,
                    change = %change,
                    "Dropping job completion for unknown pipeline"
                );
                return Vec::new();
            };
            match queue.remove(change) {
                Some(item) => info!(
                    pipeline = %completed.pipeline,
                    change = %change,
                    outcome = %completed.outcome,
                    sequence = item.sequence,
                    "Job completed, change released"
                ),
                None => debug!(
                    pipeline = %completed.pipeline,
                    change = %change,
                    "Job completion for change not in queue"
                ),
            }
        }

        if !self.layout.knows_project(&change.project) {
            debug!(
                change = %change,
                kind = %event.kind(),
                "Dropping event for project without pipelines"
            );
            return Vec::new();
        }

        let record = self.store.apply(event);

        let mut effects = Vec::new();
        for pipeline in self.layout.pipelines_for(&change.project) {
            let Some(trigger) = pipeline.first_matching_trigger(event) else {
                continue;
            };

            let decision = {
                let _evaluation = self.quiescence.begin_evaluation();
                admit(pipeline, record)
            };
            if !decision.is_admit() {
                debug!(
                    pipeline = %pipeline.name,
                    change = %change,
                    trigger,
                    "Change does not meet pipeline requirement"
                );
                continue;
            }

            let queue = self.queues.entry(pipeline.name.clone()).or_default();
            if queue.push(change.clone(), record.head().cloned()) {
                info!(
                    pipeline = %pipeline.name,
                    change = %change,
                    trigger,
                    queued = queue.len(),
                    "Change admitted"
                );
                effects.push(Effect::SubmitJob(JobRequest {
                    pipeline: pipeline.name.clone(),
                    change: change.clone(),
                    head: record.head().cloned(),
                    branch: record.branch().map(str::to_string),
                }));
            } else {
                debug!(
                    pipeline = %pipeline.name,
                    change = %change,
                    "Change already queued"
                );
            }
        }
        effects
    }

    /// Releases a change whose job could not be submitted.
    pub fn release(&mut self, pipeline: &PipelineName, change: &ChangeId) -> Option<QueueItem> {
        self.queues.get_mut(pipeline)?.remove(change)
    }

    /// Swaps in a new layout.
    ///
    /// Queues of pipelines whose names survive are kept, new pipelines start
    /// with empty queues and queues of removed pipelines are dropped. Change
    /// state is untouched.
    pub fn apply_layout(&mut self, layout: Layout) {
        let mut queues = std::mem::take(&mut self.queues);
        for pipeline in layout.pipelines() {
            let queue = queues.remove(&pipeline.name).unwrap_or_default();
            self.queues.insert(pipeline.name.clone(), queue);
        }
        for (name, queue) in queues {
            if !queue.is_empty() {
                warn!(
                    pipeline = %name,
                    dropped = queue.len(),
                    "Pipeline removed with queued changes"
                );
            }
        }

        info!(pipelines = layout.pipelines().len(), "Layout applied");
        self.layout = layout;
    }

    pub fn status(&self) -> GateStatus {
        let pipelines = self
            .layout
            .pipelines()
            .iter()
            .map(|p| PipelineStatus {
                name: p.name.clone(),
                queue: self
                    .queues
                    .get(&p.name)
                    .map(|q| q.items().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect();
        GateStatus {
            pipelines,
            changes: self.store.len(),
            quiescence: self.quiescence.counts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, JobOutcome};
    use crate::pipeline::Pipeline;
    use crate::requirements::{RequirementSpec, StatusRequirement};
    use crate::test_utils::{arb_event, change_id, project, review, status};
    use crate::triggers::TriggerSpec;
    use crate::types::{ProjectId, ReviewState, Sha, StatusState};
    use proptest::prelude::*;

    fn on_review(name: &str) -> Pipeline {
        Pipeline::new(name)
            .with_project(project())
            .with_trigger(TriggerSpec::on([EventKind::ReviewAdded]))
    }

    fn scheduler(pipelines: Vec<Pipeline>) -> Scheduler {
        Scheduler::new(Layout::new(pipelines).unwrap(), Quiescence::new())
    }

    fn approve(n: u64) -> Event {
        Event::review_added(change_id(n), review("derp", ReviewState::Approve))
    }

    fn queued(scheduler: &Scheduler, name: &str) -> Vec<u64> {
        scheduler
            .queue(&PipelineName::new(name))
            .map(|q| q.items().map(|item| item.change.number).collect())
            .unwrap_or_default()
    }

    // ─── Admission ───

    #[test]
    fn admission_emits_submit_job() {
        let mut s = scheduler(vec![on_review("check")]);
        let effects = s.handle_event(&approve(1));

        assert_eq!(
            effects,
            vec![Effect::SubmitJob(JobRequest {
                pipeline: PipelineName::new("check"),
                change: change_id(1),
                head: None,
                branch: None,
            })]
        );
        assert_eq!(queued(&s, "check"), vec![1]);
    }

    #[test]
    fn redelivery_does_not_duplicate() {
        let mut s = scheduler(vec![on_review("check")]);
        s.handle_event(&approve(1));
        let effects = s.handle_event(&approve(1));

        assert!(effects.is_empty());
        assert_eq!(queued(&s, "check"), vec![1]);
    }

    #[test]
    fn every_listening_pipeline_is_considered() {
        let gated = on_review("gate").with_requirement(RequirementSpec::Status(
            StatusRequirement::for_context("check"),
        ));
        let mut s = scheduler(vec![on_review("check"), gated]);

        let effects = s.handle_event(&approve(1));
        assert_eq!(effects.len(), 1);
        assert_eq!(queued(&s, "check"), vec![1]);
        assert!(queued(&s, "gate").is_empty());
    }

    #[test]
    fn non_matching_trigger_skips_gate() {
        let mut s = scheduler(vec![on_review("check")]);
        let effects = s.handle_event(&Event::push(change_id(1), "master", Sha::new("a")));
        assert!(effects.is_empty());
        assert_eq!(s.status().quiescence.evaluating, 0);
    }

    #[test]
    fn head_and_branch_are_recorded_at_admission() {
        let mut s = scheduler(vec![on_review("check")]);
        s.handle_event(&Event::push(change_id(1), "master", Sha::new("a")));
        let effects = s.handle_event(&approve(1));

        let Effect::SubmitJob(request) = &effects[0];
        assert_eq!(request.head, Some(Sha::new("a")));
        assert_eq!(request.branch.as_deref(), Some("master"));
    }

    // ─── Drops ───

    #[test]
    fn unknown_project_creates_no_change() {
        let mut s = scheduler(vec![on_review("check")]);
        let other = ChangeId::new(ProjectId::new("org", "elsewhere"), 1);
        let effects = s.handle_event(&Event::review_added(
            other,
            review("derp", ReviewState::Approve),
        ));

        assert!(effects.is_empty());
        assert!(s.store().is_empty());
    }

    #[test]
    fn completion_for_unknown_pipeline_is_dropped() {
        let mut s = scheduler(vec![on_review("check")]);
        s.handle_event(&Event::job_completed(
            change_id(1),
            PipelineName::new("gate"),
            JobOutcome::Success,
        ));
        assert!(s.store().is_empty());
    }

    // ─── Completion ───

    #[test]
    fn completion_releases_queue_slot() {
        let mut s = scheduler(vec![on_review("check")]);
        s.handle_event(&approve(1));
        s.handle_event(&approve(2));

        s.handle_event(&Event::job_completed(
            change_id(1),
            PipelineName::new("check"),
            JobOutcome::Failure,
        ));
        assert_eq!(queued(&s, "check"), vec![2]);

        // Released changes can be admitted again.
        assert_eq!(s.handle_event(&approve(1)).len(), 1);
        assert_eq!(queued(&s, "check"), vec![2, 1]);
    }

    #[test]
    fn release_after_failed_submission() {
        let mut s = scheduler(vec![on_review("check")]);
        s.handle_event(&approve(1));

        let item = s.release(&PipelineName::new("check"), &change_id(1)).unwrap();
        assert_eq!(item.change, change_id(1));
        assert!(queued(&s, "check").is_empty());
        assert!(s.release(&PipelineName::new("gate"), &change_id(1)).is_none());
    }

    // ─── Reconfiguration ───

    #[test]
    fn layout_swap_keeps_surviving_queues_and_state() {
        let mut s = scheduler(vec![on_review("check"), on_review("gate")]);
        s.handle_event(&approve(1));

        s.apply_layout(Layout::new(vec![on_review("check"), on_review("post")]).unwrap());

        assert_eq!(queued(&s, "check"), vec![1]);
        assert!(s.queue(&PipelineName::new("post")).unwrap().is_empty());
        assert!(s.queue(&PipelineName::new("gate")).is_none());
        assert!(s.store().get(&change_id(1)).is_some());

        let names: Vec<_> = s.status().pipelines.into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![PipelineName::new("check"), PipelineName::new("post")]
        );
    }

    #[test]
    fn status_reports_queues_in_layout_order() {
        let mut s = scheduler(vec![on_review("gate"), on_review("check")]);
        s.handle_event(&Event::status_changed(
            change_id(3),
            status(Sha::new("a"), "check", StatusState::Success, "zuul"),
        ));
        s.handle_event(&approve(1));

        let view = s.status();
        assert_eq!(view.changes, 2);
        assert_eq!(view.pipelines[0].name, PipelineName::new("gate"));
        assert_eq!(view.pipeline("check").unwrap().queue.len(), 1);
        assert!(view.pipeline("post").is_none());
    }

    // ─── Property-based tests ───

    fn replay(events: &[Event]) -> Vec<(PipelineName, Vec<QueueItem>)> {
        let mut s = scheduler(vec![
            Pipeline::new("check")
                .with_project(project())
                .with_trigger(TriggerSpec::on([
                    EventKind::StatusChanged,
                    EventKind::ReviewAdded,
                    EventKind::CommentAdded,
                ]))
                .with_requirement(RequirementSpec::Status(StatusRequirement::for_context(
                    "check",
                ))),
            on_review("review"),
        ]);
        for event in events {
            s.handle_event(event);
        }
        s.status()
            .pipelines
            .into_iter()
            .map(|p| (p.name, p.queue))
            .collect()
    }

    proptest! {
        /// Queue contents are a pure function of the event sequence.
        #[test]
        fn prop_replay_is_deterministic(events in prop::collection::vec(arb_event(), 0..40)) {
            prop_assert_eq!(replay(&events), replay(&events));
        }

        /// No change is ever queued twice in one pipeline.
        #[test]
        fn prop_queue_has_no_duplicates(events in prop::collection::vec(arb_event(), 0..40)) {
            for (_, items) in replay(&events) {
                let mut changes: Vec<_> = items.iter().map(|i| i.change.clone()).collect();
                let total = changes.len();
                changes.sort();
                changes.dedup();
                prop_assert_eq!(changes.len(), total);
            }
        }
    }
}
