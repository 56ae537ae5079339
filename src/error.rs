//! Error types shared by the library and the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout eksforge.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading config, assembling stacks, or synthesizing templates.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML input could not be parsed.
    #[error("YAML parse error: {0}")]
    Yaml(String),

    /// JSON could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config validation failed; details were reported per error.
    #[error("{0} validation error(s)")]
    Validation(usize),

    /// A leaf already carries a different condition.
    #[error("resource '{path}' already has condition '{existing}', refusing to replace it with '{requested}'")]
    ConditionConflict {
        path: String,
        existing: String,
        requested: String,
    },

    /// A leaf references a condition the stack does not declare.
    #[error("resource '{path}' uses undeclared condition '{condition}'")]
    UnknownCondition { path: String, condition: String },

    /// A property token points at a path with no leaf below it.
    #[error("resource '{path}' references unknown node '{target}'")]
    UnknownReference { path: String, target: String },

    /// A depends_on entry points at a path with no leaf below it.
    #[error("node '{path}' depends on unknown node '{dependency}'")]
    UnknownDependency { path: String, dependency: String },

    /// Two leaves hash to the same logical id.
    #[error("duplicate logical id '{logical_id}' for '{path}'")]
    DuplicateLogicalId { logical_id: String, path: String },

    /// DependsOn edges form a cycle.
    #[error("dependency cycle detected involving: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// A parameter override names a parameter the template does not declare.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// A parameter value is outside its allowed values.
    #[error("parameter '{name}' does not allow '{value}' (allowed: {})", allowed.join(", "))]
    InvalidParameterValue {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A required deployment setting is missing from config and environment.
    #[error("missing {0}: set it in the config or the environment")]
    MissingEnvironment(String),

    /// A CLI argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_yaml_ng::Error> for Error {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_conditions() {
        let e = Error::ConditionConflict {
            path: "Stack/Chart".to_string(),
            existing: "a".to_string(),
            requested: "b".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Stack/Chart"));
        assert!(msg.contains("'a'"));
        assert!(msg.contains("'b'"));
    }

    #[test]
    fn test_cycle_message_lists_members() {
        let e = Error::DependencyCycle(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(e.to_string(), "dependency cycle detected involving: A, B");
    }

    #[test]
    fn test_invalid_parameter_lists_allowed() {
        let e = Error::InvalidParameterValue {
            name: "ebsDriver".to_string(),
            value: "yes".to_string(),
            allowed: vec!["true".to_string(), "false".to_string()],
        };
        assert!(e.to_string().contains("true, false"));
    }
}
