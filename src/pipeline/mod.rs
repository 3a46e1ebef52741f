//! Pipelines: named gates with triggers, an admission requirement and a queue.

pub mod gate;
pub mod queue;

use std::collections::BTreeSet;

use crate::events::Event;
use crate::requirements::RequirementSpec;
use crate::triggers::{TriggerSpec, match_trigger};
use crate::types::{PipelineName, ProjectId};

pub use gate::{Decision, admit};
pub use queue::{PipelineQueue, QueueItem};

/// A configured pipeline.
///
/// The queue is not part of the definition; the scheduler owns one
/// [`PipelineQueue`] per pipeline name so queues survive reconfiguration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub name: PipelineName,

    /// Projects whose changes this pipeline considers.
    pub projects: BTreeSet<ProjectId>,

    pub triggers: Vec<TriggerSpec>,

    /// Evaluated in snapshot mode against the change's aggregated state.
    pub requirement: Option<RequirementSpec>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Pipeline {
            name: PipelineName::new(name),
            projects: BTreeSet::new(),
            triggers: Vec::new(),
            requirement: None,
        }
    }

    pub fn with_project(mut self, project: ProjectId) -> Self {
        self.projects.insert(project);
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerSpec) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_requirement(mut self, requirement: RequirementSpec) -> Self {
        self.requirement = Some(requirement);
        self
    }

    pub fn handles(&self, project: &ProjectId) -> bool {
        self.projects.contains(project)
    }

    /// Returns the index of the first trigger that accepts `event`.
    pub fn first_matching_trigger(&self, event: &Event) -> Option<usize> {
        self.triggers
            .iter()
            .position(|trigger| match_trigger(trigger, event))
    }
}
