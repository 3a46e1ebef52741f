//! Layout configuration loading.
//!
//! The layout file is JSON:
//!
//! ```json
//! {"pipelines": [{
//!   "name": "check",
//!   "projects": ["org/project1"],
//!   "triggers": [{"kinds": ["comment-added"],
//!                 "eventFilters": {"comment": "(?i)^\\s*test me\\s*$"}}],
//!   "requirement": {"status": {"context": "check"}}
//! }]}
//! ```
//!
//! Requirements are written as `{"status": {..}}`, `{"approval": {..}}`,
//! `{"all": [..]}` or `{"any": [..]}`. Everything that can be wrong with a
//! layout is caught here; matching at runtime never fails.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use super::Layout;
use crate::events::EventKind;
use crate::pipeline::Pipeline;
use crate::requirements::{ApprovalRequirement, RequirementSpec, StatusRequirement};
use crate::triggers::{EventFilter, FilterError, TriggerSpec};
use crate::types::{PipelineName, ProjectId, ProjectIdError, UnknownState};

/// Errors that make a layout unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate pipeline name: {0}")]
    DuplicatePipeline(String),

    #[error("pipeline {pipeline}: {source}")]
    InvalidProject {
        pipeline: String,
        #[source]
        source: ProjectIdError,
    },

    #[error("pipeline {pipeline}: trigger {trigger} has no event kinds")]
    EmptyKinds { pipeline: String, trigger: usize },

    #[error("pipeline {pipeline}: unknown event kind {kind:?}")]
    UnknownEventKind { pipeline: String, kind: String },

    #[error("pipeline {pipeline}: {source}")]
    Filter {
        pipeline: String,
        #[source]
        source: FilterError,
    },

    #[error("pipeline {pipeline}: {source}")]
    UnknownState {
        pipeline: String,
        #[source]
        source: UnknownState,
    },

    #[error("pipeline {pipeline}: {field} must not be empty")]
    EmptySet {
        pipeline: String,
        field: &'static str,
    },

    #[error("pipeline {pipeline}: \"any\" needs at least one requirement")]
    EmptyAny { pipeline: String },
}

/// Raw layout document as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    pub pipelines: Vec<PipelineConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: String,

    #[serde(default)]
    pub projects: Vec<String>,

    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,

    #[serde(default)]
    pub requirement: Option<RequirementConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    pub kinds: Vec<String>,

    #[serde(default, rename = "eventFilters")]
    pub event_filters: BTreeMap<String, String>,

    #[serde(default)]
    pub requirement: Option<RequirementConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementConfig {
    Status(StatusConfig),
    Approval(ApprovalConfig),
    All(Vec<RequirementConfig>),
    Any(Vec<RequirementConfig>),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    pub context: Option<String>,
    pub states: Option<Vec<String>>,
    pub reporter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalConfig {
    pub usernames: Option<Vec<String>>,
    pub states: Option<Vec<String>>,
}

impl Layout {
    /// Reads and validates a layout file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses and validates a layout document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Validates a parsed layout document.
    pub fn from_config(config: LayoutConfig) -> Result<Self, ConfigError> {
        let pipelines = config
            .pipelines
            .into_iter()
            .map(build_pipeline)
            .collect::<Result<Vec<_>, _>>()?;
        Layout::new(pipelines)
    }
}

fn build_pipeline(config: PipelineConfig) -> Result<Pipeline, ConfigError> {
    let name = config.name;

    let projects = config
        .projects
        .iter()
        .map(|p| {
            ProjectId::parse(p).map_err(|source| ConfigError::InvalidProject {
                pipeline: name.clone(),
                source,
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    let triggers = config
        .triggers
        .into_iter()
        .enumerate()
        .map(|(index, trigger)| build_trigger(&name, index, trigger))
        .collect::<Result<Vec<_>, _>>()?;

    let requirement = config
        .requirement
        .map(|r| build_requirement(&name, r))
        .transpose()?;

    Ok(Pipeline {
        name: PipelineName::new(name),
        projects,
        triggers,
        requirement,
    })
}

fn build_trigger(
    pipeline: &str,
    index: usize,
    config: TriggerConfig,
) -> Result<TriggerSpec, ConfigError> {
    if config.kinds.is_empty() {
        return Err(ConfigError::EmptyKinds {
            pipeline: pipeline.to_string(),
            trigger: index,
        });
    }

    let kinds = config
        .kinds
        .iter()
        .map(|kind| {
            EventKind::from_str(kind).map_err(|kind| ConfigError::UnknownEventKind {
                pipeline: pipeline.to_string(),
                kind,
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    let filters = config
        .event_filters
        .iter()
        .map(|(key, value)| {
            EventFilter::parse(key, value).map_err(|source| ConfigError::Filter {
                pipeline: pipeline.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let requirement = config
        .requirement
        .map(|r| build_requirement(pipeline, r))
        .transpose()?;

    Ok(TriggerSpec {
        kinds,
        filters,
        requirement,
    })
}

fn build_requirement(
    pipeline: &str,
    config: RequirementConfig,
) -> Result<RequirementSpec, ConfigError> {
    let spec = match config {
        RequirementConfig::Status(status) => {
            let mut requirement = StatusRequirement {
                context: status.context,
                reporter: status.reporter,
                ..StatusRequirement::default()
            };
            if let Some(states) = status.states {
                requirement.states = parse_states(pipeline, "status states", &states)?;
            }
            RequirementSpec::Status(requirement)
        }
        RequirementConfig::Approval(approval) => {
            let usernames = match approval.usernames {
                Some(names) if names.is_empty() => {
                    return Err(ConfigError::EmptySet {
                        pipeline: pipeline.to_string(),
                        field: "approval usernames",
                    });
                }
                Some(names) => Some(names.into_iter().collect()),
                None => None,
            };
            let states = approval
                .states
                .map(|states| parse_states(pipeline, "approval states", &states))
                .transpose()?;
            RequirementSpec::Approval(ApprovalRequirement { usernames, states })
        }
        RequirementConfig::All(children) => RequirementSpec::All(
            children
                .into_iter()
                .map(|child| build_requirement(pipeline, child))
                .collect::<Result<_, _>>()?,
        ),
        RequirementConfig::Any(children) => {
            if children.is_empty() {
                return Err(ConfigError::EmptyAny {
                    pipeline: pipeline.to_string(),
                });
            }
            RequirementSpec::Any(
                children
                    .into_iter()
                    .map(|child| build_requirement(pipeline, child))
                    .collect::<Result<_, _>>()?,
            )
        }
    };
    Ok(spec)
}

/// Parses a non-empty list of state names into a set.
fn parse_states<S>(
    pipeline: &str,
    field: &'static str,
    values: &[String],
) -> Result<BTreeSet<S>, ConfigError>
where
    S: FromStr<Err = UnknownState> + Ord,
{
    if values.is_empty() {
        return Err(ConfigError::EmptySet {
            pipeline: pipeline.to_string(),
            field,
        });
    }
    values
        .iter()
        .map(|value| {
            value.parse().map_err(|source| ConfigError::UnknownState {
                pipeline: pipeline.to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::types::{ReviewState, StatusState};

    const CHECK_LAYOUT: &str = r#"{
        "pipelines": [{
            "name": "check",
            "projects": ["org/project1"],
            "triggers": [{
                "kinds": ["comment-added"],
                "eventFilters": {"comment": "(?i)^\\s*test me\\s*$"}
            }],
            "requirement": {"status": {"context": "check"}}
        }]
    }"#;

    fn pipeline_json(body: &str) -> String {
        format!(r#"{{"pipelines": [{{"name": "check", {body}}}]}}"#)
    }

    // ─── Valid layouts ───

    #[test]
    fn parses_full_pipeline() {
        let layout = Layout::from_json(CHECK_LAYOUT).unwrap();
        let pipeline = layout.pipeline(&PipelineName::new("check")).unwrap();

        assert!(pipeline.handles(&ProjectId::new("org", "project1")));
        assert_eq!(pipeline.triggers.len(), 1);
        assert_eq!(
            pipeline.triggers[0].kinds,
            BTreeSet::from([EventKind::CommentAdded])
        );
        assert_eq!(pipeline.triggers[0].filters[0].key(), "comment");
        assert_eq!(
            pipeline.requirement,
            Some(RequirementSpec::Status(StatusRequirement::for_context(
                "check"
            )))
        );
    }

    #[test]
    fn parses_nested_requirements() {
        let json = pipeline_json(
            r#""requirement": {"all": [
                {"status": {"context": "check", "states": ["success", "pending"], "reporter": "zuul"}},
                {"any": [{"approval": {"usernames": ["derp"], "states": ["APPROVED"]}}]}
            ]}"#,
        );
        let layout = Layout::from_json(&json).unwrap();
        let expected = RequirementSpec::All(vec![
            RequirementSpec::Status(StatusRequirement {
                context: Some("check".to_string()),
                states: BTreeSet::from([StatusState::Success, StatusState::Pending]),
                reporter: Some("zuul".to_string()),
            }),
            RequirementSpec::Any(vec![RequirementSpec::Approval(ApprovalRequirement {
                usernames: Some(BTreeSet::from(["derp".to_string()])),
                states: Some(BTreeSet::from([ReviewState::Approve])),
            })]),
        ]);
        assert_eq!(layout.pipelines()[0].requirement, Some(expected));
    }

    #[test]
    fn approval_without_states_accepts_any_state() {
        let json = pipeline_json(r#""requirement": {"approval": {"usernames": ["derp"]}}"#);
        let layout = Layout::from_json(&json).unwrap();
        assert_eq!(
            layout.pipelines()[0].requirement,
            Some(RequirementSpec::Approval(ApprovalRequirement {
                usernames: Some(BTreeSet::from(["derp".to_string()])),
                states: None,
            }))
        );
    }

    #[test]
    fn empty_all_is_allowed() {
        let json = pipeline_json(r#""requirement": {"all": []}"#);
        assert!(Layout::from_json(&json).is_ok());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CHECK_LAYOUT.as_bytes()).unwrap();

        let layout = Layout::load(file.path()).unwrap();
        assert_eq!(layout.pipelines().len(), 1);
    }

    // ─── Invalid layouts ───

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Layout::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            Layout::from_json("{\"pipelines\": ["),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn duplicate_pipeline_name() {
        let json = r#"{"pipelines": [{"name": "check"}, {"name": "check"}]}"#;
        assert!(matches!(
            Layout::from_json(json),
            Err(ConfigError::DuplicatePipeline(_))
        ));
    }

    #[test]
    fn invalid_project() {
        let json = pipeline_json(r#""projects": ["project1"]"#);
        assert!(matches!(
            Layout::from_json(&json),
            Err(ConfigError::InvalidProject { .. })
        ));
    }

    #[test]
    fn empty_kinds() {
        let json = pipeline_json(r#""triggers": [{"kinds": []}]"#);
        assert!(matches!(
            Layout::from_json(&json),
            Err(ConfigError::EmptyKinds { trigger: 0, .. })
        ));
    }

    #[test]
    fn unknown_event_kind() {
        let json = pipeline_json(r#""triggers": [{"kinds": ["label-added"]}]"#);
        let err = Layout::from_json(&json).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEventKind { kind, .. } if kind == "label-added"));
    }

    #[test]
    fn unknown_filter_key() {
        let json =
            pipeline_json(r#""triggers": [{"kinds": ["push"], "eventFilters": {"label": "x"}}]"#);
        assert!(matches!(
            Layout::from_json(&json),
            Err(ConfigError::Filter {
                source: FilterError::UnknownKey(_),
                ..
            })
        ));
    }

    #[test]
    fn invalid_regex() {
        let json = pipeline_json(
            r#""triggers": [{"kinds": ["comment-added"], "eventFilters": {"comment": "(oops"}}]"#,
        );
        assert!(matches!(
            Layout::from_json(&json),
            Err(ConfigError::Filter {
                source: FilterError::InvalidRegex { .. },
                ..
            })
        ));
    }

    #[test]
    fn unknown_state() {
        let json = pipeline_json(r#""requirement": {"status": {"states": ["green"]}}"#);
        assert!(matches!(
            Layout::from_json(&json),
            Err(ConfigError::UnknownState { .. })
        ));
    }

    #[test]
    fn empty_sets() {
        for requirement in [
            r#"{"status": {"states": []}}"#,
            r#"{"approval": {"states": []}}"#,
            r#"{"approval": {"usernames": []}}"#,
        ] {
            let json = pipeline_json(&format!(r#""requirement": {requirement}"#));
            assert!(
                matches!(Layout::from_json(&json), Err(ConfigError::EmptySet { .. })),
                "{requirement} should be rejected"
            );
        }
    }

    #[test]
    fn empty_any() {
        let json = pipeline_json(r#""requirement": {"all": [{"any": []}]}"#);
        assert!(matches!(
            Layout::from_json(&json),
            Err(ConfigError::EmptyAny { .. })
        ));
    }

    #[test]
    fn error_messages_name_the_pipeline() {
        let json = pipeline_json(r#""triggers": [{"kinds": ["label-added"]}]"#);
        let err = Layout::from_json(&json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "pipeline check: unknown event kind \"label-added\""
        );
    }
}
