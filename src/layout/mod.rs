//! The pipeline layout: every configured pipeline, in configuration order.
//!
//! A layout is immutable once built. Reconfiguration replaces the whole
//! layout at the dispatch loop's next idle point.

mod config;

use std::collections::HashSet;

use crate::pipeline::Pipeline;
use crate::types::{PipelineName, ProjectId};

pub use config::{ConfigError, LayoutConfig};

/// A validated set of pipelines with unique names.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pipelines: Vec<Pipeline>,
}

impl Layout {
    /// Builds a layout, rejecting duplicate pipeline names.
    pub fn new(pipelines: Vec<Pipeline>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for pipeline in &pipelines {
            if !seen.insert(&pipeline.name) {
                return Err(ConfigError::DuplicatePipeline(pipeline.name.to_string()));
            }
        }
        Ok(Layout { pipelines })
    }

    /// All pipelines in configuration order.
    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn pipeline(&self, name: &PipelineName) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name == *name)
    }

    /// Pipelines that consider changes of `project`, in configuration order.
    pub fn pipelines_for<'a>(
        &'a self,
        project: &'a ProjectId,
    ) -> impl Iterator<Item = &'a Pipeline> {
        self.pipelines.iter().filter(move |p| p.handles(project))
    }

    /// Returns true if at least one pipeline lists `project`.
    pub fn knows_project(&self, project: &ProjectId) -> bool {
        self.pipelines_for(project).next().is_some()
    }
}
