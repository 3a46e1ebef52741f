//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different identifiers (e.g., using a
//! pipeline name where a reviewer login is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a project identifier is not in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid project id {0:?}: expected owner/name")]
pub struct ProjectIdError(pub String);

/// A project (repository) identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId {
    pub owner: String,
    pub name: String,
}

impl ProjectId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        ProjectId {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/name`. Both halves must be non-empty and there must be
    /// exactly one separator.
    pub fn parse(s: &str) -> Result<Self, ProjectIdError> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(ProjectId::new(owner, name))
            }
            _ => Err(ProjectIdError(s.to_string())),
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for ProjectId {
    type Err = ProjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectId::parse(s)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = ProjectIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ProjectId::parse(&s)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.to_string()
    }
}

/// Identifies a reviewable change: a pull request number within a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChangeId {
    pub project: ProjectId,
    pub number: u64,
}

impl ChangeId {
    pub fn new(project: ProjectId, number: u64) -> Self {
        ChangeId { project, number }
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.project, self.number)
    }
}

/// A git commit SHA.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

impl Sha {
    /// Creates a new Sha from a string.
    ///
    /// Note: This does not validate the format; host adapters hand us whatever
    /// the code host reported.
    pub fn new(s: impl Into<String>) -> Self {
        Sha(s.into())
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short (7-character) version of the SHA for display.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Sha(s.to_string())
    }
}

/// The name of a configured pipeline (e.g., `"check"`, `"gate"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineName(pub String);

impl PipelineName {
    pub fn new(s: impl Into<String>) -> Self {
        PipelineName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PipelineName {
    fn from(s: &str) -> Self {
        PipelineName(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod project_id {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_display_roundtrip(
                owner in "[a-zA-Z][a-zA-Z0-9-]{0,38}",
                name in "[a-zA-Z][a-zA-Z0-9_.-]{0,99}"
            ) {
                let id = ProjectId::parse(&format!("{}/{}", owner, name)).unwrap();
                prop_assert_eq!(&id.owner, &owner);
                prop_assert_eq!(&id.name, &name);
                prop_assert_eq!(id.to_string(), format!("{}/{}", owner, name));
            }
        }

        #[test]
        fn rejects_missing_separator() {
            assert!(ProjectId::parse("project1").is_err());
        }

        #[test]
        fn rejects_empty_halves() {
            assert!(ProjectId::parse("/project1").is_err());
            assert!(ProjectId::parse("org/").is_err());
        }

        #[test]
        fn rejects_nested_paths() {
            assert!(ProjectId::parse("org/group/project").is_err());
        }

        #[test]
        fn serializes_as_plain_string() {
            let id = ProjectId::new("org", "project1");
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"org/project1\"");

            let parsed: ProjectId = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, id);
        }

        #[test]
        fn deserialize_rejects_bad_id() {
            let result: Result<ProjectId, _> = serde_json::from_str("\"nope\"");
            assert!(result.is_err());
        }
    }

    mod change_id {
        use super::*;

        #[test]
        fn display_format() {
            let id = ChangeId::new(ProjectId::new("org", "project1"), 42);
            assert_eq!(id.to_string(), "org/project1#42");
        }

        #[test]
        fn orders_by_project_then_number() {
            let a = ChangeId::new(ProjectId::new("org", "a"), 9);
            let b = ChangeId::new(ProjectId::new("org", "b"), 1);
            let a2 = ChangeId::new(ProjectId::new("org", "a"), 10);
            assert!(a < b);
            assert!(a < a2);
        }
    }

    mod sha {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn short_returns_7_chars(s in "[0-9a-f]{40}") {
                let sha = Sha::new(&s);
                prop_assert_eq!(sha.short(), &s[..7]);
            }
        }

        #[test]
        fn short_handles_short_input() {
            assert_eq!(Sha::new("abc").short(), "abc");
        }
    }
}
