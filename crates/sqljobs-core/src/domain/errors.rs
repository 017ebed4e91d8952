//! Error types for spec validation, template rendering, and submission.

use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

use super::keys::TaskKey;

/// A local invariant violation in a job spec.
///
/// These are the checks that can be decided from the document alone; anything
/// that needs service-side state (warehouse liveness, authorization, path
/// existence) is deliberately left to the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("job has no tasks")]
    EmptyJob,

    #[error("task #{index} has an empty task_key")]
    EmptyTaskKey { index: usize },

    #[error("duplicate task_key {0}")]
    DuplicateTaskKey(TaskKey),

    #[error("task {task} depends on unknown task_key {dependency}")]
    UnknownDependency { task: TaskKey, dependency: TaskKey },

    #[error("task {0} depends on itself")]
    SelfDependency(TaskKey),

    #[error("dependency cycle: {}", cycle_path(.0))]
    DependencyCycle(Vec<TaskKey>),

    #[error("task {0} uses a GIT-sourced file but the job has no git_source")]
    MissingGitSource(TaskKey),

    #[error("run_as must name exactly one of user_name or service_principal_name")]
    AmbiguousRunAs,

    #[error("task {0} has an empty warehouse_id")]
    EmptyWarehouseId(TaskKey),
}

fn cycle_path(keys: &[TaskKey]) -> String {
    keys.iter()
        .map(TaskKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A placeholder that survived rendering, with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPlaceholder {
    /// Name inside the angle brackets, e.g. `DBSQL warehouse_id`.
    pub name: String,
    /// JSON-pointer-style location of the leaf, e.g. `/tasks/0/sql_task/warehouse_id`.
    pub location: String,
}

impl fmt::Display for UnresolvedPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> at {}", self.name, self.location)
    }
}

/// Failure while rendering a placeholder template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("{} unresolved placeholder(s) remain", .0.len())]
    Unresolved(Vec<UnresolvedPlaceholder>),
}

impl TemplateError {
    /// The placeholders left unfilled, in document order.
    pub fn unresolved(&self) -> &[UnresolvedPlaceholder] {
        match self {
            TemplateError::Unresolved(list) => list,
        }
    }
}

/// Failure while handing a job spec to the external CLI.
///
/// There is deliberately no taxonomy of service-side failures here: malformed
/// references, unknown warehouses, and authorization problems all come back as
/// whatever the CLI printed, carried verbatim in `CliFailed`.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to run {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{bin} exited with {status}: {stderr}")]
    CliFailed {
        bin: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("could not parse job-creation response {response:?}: {source}")]
    MalformedResponse {
        response: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_displays_witness_path() {
        let err = SpecError::DependencyCycle(vec![
            TaskKey::new("a"),
            TaskKey::new("b"),
            TaskKey::new("a"),
        ]);
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }

    #[test]
    fn unresolved_placeholder_displays_name_and_location() {
        let err = TemplateError::Unresolved(vec![UnresolvedPlaceholder {
            name: "GITPATH".into(),
            location: "/tasks/0/sql_task/file/path".into(),
        }]);
        assert_eq!(err.to_string(), "1 unresolved placeholder(s) remain");
        assert_eq!(
            err.unresolved()[0].to_string(),
            "<GITPATH> at /tasks/0/sql_task/file/path"
        );
    }
}
