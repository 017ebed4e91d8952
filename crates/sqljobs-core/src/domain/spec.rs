//! Wire model for the job specification accepted by the orchestration service.
//!
//! Field names and enum spellings are fixed by the external JSON interface and
//! must round-trip exactly; everything here is `serde` over that format. Local
//! invariant checks (unique keys, acyclic `depends_on`, ...) live in
//! `crate::validate`, not in the types themselves, so malformed documents can
//! still be parsed and reported on precisely.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::keys::{TaskKey, WarehouseId};

/// A job: named collection of SQL tasks plus the context they resolve against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Human-readable job name (the service does not require uniqueness).
    pub name: String,

    /// Tasks in authoring order. Order is cosmetic; execution order is decided
    /// by `depends_on`.
    pub tasks: Vec<TaskSpec>,

    /// Repository context for tasks whose file source is `GIT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_source: Option<GitSource>,

    /// Identity the job runs as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as: Option<RunAs>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, tasks: Vec<TaskSpec>) -> Self {
        Self {
            name: name.into(),
            tasks,
            git_source: None,
            run_as: None,
        }
    }

    pub fn with_git_source(mut self, git_source: GitSource) -> Self {
        self.git_source = Some(git_source);
        self
    }

    pub fn with_run_as(mut self, run_as: RunAs) -> Self {
        self.run_as = Some(run_as);
        self
    }

    /// Look up a task by key.
    pub fn task(&self, key: &TaskKey) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| &t.task_key == key)
    }

    /// The comparable skeleton of this spec: key set, edge set, and per-task
    /// execution policy. Two documents describe the same task graph iff their
    /// structures are equal, whatever their leaf strings say.
    pub fn structure(&self) -> JobStructure {
        let mut task_keys = BTreeSet::new();
        let mut edges = BTreeSet::new();
        let mut run_if = BTreeMap::new();
        let mut sources = BTreeMap::new();
        for task in &self.tasks {
            task_keys.insert(task.task_key.clone());
            run_if.insert(task.task_key.clone(), task.run_if);
            sources.insert(task.task_key.clone(), task.sql_task.file.source);
            for dep in &task.depends_on {
                edges.insert((task.task_key.clone(), dep.task_key.clone()));
            }
        }
        JobStructure {
            task_keys,
            edges,
            run_if,
            sources,
        }
    }
}

/// One unit of work: a SQL file executed on a warehouse, gated by the outcome
/// of the tasks it depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_key: TaskKey,

    /// Upstream tasks this one waits for. Serialized as
    /// `[{"task_key": "..."}]` and omitted entirely when empty, matching what
    /// the service emits for root tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<TaskDependency>,

    /// Outcome policy evaluated by the service over `depends_on`.
    #[serde(default)]
    pub run_if: RunIf,

    pub sql_task: SqlTask,
}

impl TaskSpec {
    pub fn new(task_key: impl Into<TaskKey>, sql_task: SqlTask) -> Self {
        Self {
            task_key: task_key.into(),
            depends_on: Vec::new(),
            run_if: RunIf::default(),
            sql_task,
        }
    }

    /// Add an upstream dependency.
    pub fn depends_on(mut self, key: impl Into<TaskKey>) -> Self {
        self.depends_on.push(TaskDependency {
            task_key: key.into(),
        });
        self
    }

    pub fn run_if(mut self, run_if: RunIf) -> Self {
        self.run_if = run_if;
        self
    }
}

/// Reference to an upstream task by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub task_key: TaskKey,
}

/// Execution-condition policy over a task's dependencies.
///
/// The semantics belong to the service; this crate only carries the value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunIf {
    /// Run only when every dependency succeeded (the service default).
    #[default]
    AllSuccess,
    AtLeastOneSuccess,
    NoneFailed,
    AllDone,
    AtLeastOneFailed,
    AllFailed,
}

/// The work itself: which SQL file, and which warehouse executes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlTask {
    pub file: SqlFileRef,
    pub warehouse_id: WarehouseId,
}

impl SqlTask {
    /// File resolved against the job's `git_source` checkout.
    pub fn git_file(path: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        Self {
            file: SqlFileRef {
                path: path.into(),
                source: FileSource::Git,
            },
            warehouse_id: WarehouseId::new(warehouse_id),
        }
    }

    /// File stored in the workspace tree.
    pub fn workspace_file(path: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        Self {
            file: SqlFileRef {
                path: path.into(),
                source: FileSource::Workspace,
            },
            warehouse_id: WarehouseId::new(warehouse_id),
        }
    }
}

/// Path of a SQL file plus where that path is rooted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlFileRef {
    pub path: String,
    pub source: FileSource,
}

/// Origin of a task's SQL file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileSource {
    /// Path relative to the repository named in the job's `git_source`.
    Git,
    /// Absolute path in the workspace file tree.
    Workspace,
}

/// Repository the service checks out to resolve `GIT`-sourced file paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    pub git_url: String,
    pub git_provider: GitProvider,
    pub git_branch: String,
}

impl GitSource {
    pub fn new(
        git_url: impl Into<String>,
        git_provider: GitProvider,
        git_branch: impl Into<String>,
    ) -> Self {
        Self {
            git_url: git_url.into(),
            git_provider,
            git_branch: git_branch.into(),
        }
    }
}

/// Hosting provider, in the service's camelCase spelling (`"gitHub"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GitProvider {
    GitHub,
    GitLab,
    BitbucketCloud,
    AzureDevOpsServices,
}

/// Identity the job executes as: a user or a service principal.
///
/// Modeled as two optional fields rather than an enum so a document naming
/// both (or neither) still parses and fails validation with a precise error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_principal_name: Option<String>,
}

impl RunAs {
    pub fn user(user_name: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            service_principal_name: None,
        }
    }

    pub fn service_principal(name: impl Into<String>) -> Self {
        Self {
            user_name: None,
            service_principal_name: Some(name.into()),
        }
    }
}

/// Comparable skeleton of a job spec (see [`JobSpec::structure`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStructure {
    pub task_keys: BTreeSet<TaskKey>,
    /// Directed edges, `(task, dependency)`.
    pub edges: BTreeSet<(TaskKey, TaskKey)>,
    pub run_if: BTreeMap<TaskKey, RunIf>,
    pub sources: BTreeMap<TaskKey, FileSource>,
}

/// The three-task chain from the service's own tutorial, verbatim wire format:
/// one GIT-sourced task, two WORKSPACE-sourced ones, a single warehouse,
/// `run_as` as a plain user. Shared fixture for tests across the crate.
#[cfg(test)]
pub(crate) const TUTORIAL_JOB: &str = r#"
{
  "name": "Orchestrating_SQL_Files_on_DBSQL_WAREHOUSE",
  "tasks": [
    {
      "task_key": "Create_Tables",
      "run_if": "ALL_SUCCESS",
      "sql_task": {
        "file": {
          "path": "tutorials/1.Create_Tables.sql",
          "source": "GIT"
        },
        "warehouse_id": "d1184b8c2a8a87eb"
      }
    },
    {
      "task_key": "Load_Data",
      "depends_on": [
        { "task_key": "Create_Tables" }
      ],
      "run_if": "ALL_SUCCESS",
      "sql_task": {
        "file": {
          "path": "/Workspace/tutorials/2.Load_Data.sql",
          "source": "WORKSPACE"
        },
        "warehouse_id": "d1184b8c2a8a87eb"
      }
    },
    {
      "task_key": "Query_Fact_Sales",
      "depends_on": [
        { "task_key": "Load_Data" }
      ],
      "run_if": "ALL_SUCCESS",
      "sql_task": {
        "file": {
          "path": "/Workspace/tutorials/3.Query_Fact_Sales.sql",
          "source": "WORKSPACE"
        },
        "warehouse_id": "d1184b8c2a8a87eb"
      }
    }
  ],
  "git_source": {
    "git_url": "https://github.com/example-org/dbsql-demos.git",
    "git_provider": "gitHub",
    "git_branch": "main"
  },
  "run_as": {
    "user_name": "analyst@example.com"
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutorial_job_parses() {
        let job: JobSpec = serde_json::from_str(TUTORIAL_JOB).expect("deserialize");
        assert_eq!(job.name, "Orchestrating_SQL_Files_on_DBSQL_WAREHOUSE");
        assert_eq!(job.tasks.len(), 3);

        let create = &job.tasks[0];
        assert_eq!(create.task_key.as_str(), "Create_Tables");
        assert!(create.depends_on.is_empty());
        assert_eq!(create.run_if, RunIf::AllSuccess);
        assert_eq!(create.sql_task.file.source, FileSource::Git);

        let load = &job.tasks[1];
        assert_eq!(load.depends_on.len(), 1);
        assert_eq!(load.depends_on[0].task_key.as_str(), "Create_Tables");
        assert_eq!(load.sql_task.file.source, FileSource::Workspace);

        let git = job.git_source.expect("git_source present");
        assert_eq!(git.git_provider, GitProvider::GitHub);
        assert_eq!(git.git_branch, "main");

        let run_as = job.run_as.expect("run_as present");
        assert_eq!(run_as.user_name.as_deref(), Some("analyst@example.com"));
        assert_eq!(run_as.service_principal_name, None);
    }

    #[test]
    fn reserialized_job_preserves_structure() {
        let job: JobSpec = serde_json::from_str(TUTORIAL_JOB).expect("deserialize");
        let s = serde_json::to_string_pretty(&job).expect("serialize");
        let again: JobSpec = serde_json::from_str(&s).expect("re-deserialize");
        assert_eq!(job.structure(), again.structure());
    }

    #[test]
    fn missing_depends_on_defaults_to_empty() {
        let json = r#"
        {
          "task_key": "Create_Tables",
          "sql_task": {
            "file": { "path": "a.sql", "source": "GIT" },
            "warehouse_id": "w1"
          }
        }"#;
        let task: TaskSpec = serde_json::from_str(json).expect("deserialize");
        assert!(task.depends_on.is_empty());
        assert_eq!(task.run_if, RunIf::AllSuccess);
    }

    #[test]
    fn empty_depends_on_is_omitted_on_serialize() {
        let task = TaskSpec::new("Create_Tables", SqlTask::git_file("a.sql", "w1"));
        let v = serde_json::to_value(&task).expect("serialize");
        assert!(v.get("depends_on").is_none());
    }

    #[test]
    fn run_if_uses_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&RunIf::AllSuccess).unwrap(),
            "\"ALL_SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&RunIf::AtLeastOneFailed).unwrap(),
            "\"AT_LEAST_ONE_FAILED\""
        );
        let parsed: RunIf = serde_json::from_str("\"NONE_FAILED\"").unwrap();
        assert_eq!(parsed, RunIf::NoneFailed);
    }

    #[test]
    fn file_source_uses_wire_spelling() {
        assert_eq!(serde_json::to_string(&FileSource::Git).unwrap(), "\"GIT\"");
        assert_eq!(
            serde_json::to_string(&FileSource::Workspace).unwrap(),
            "\"WORKSPACE\""
        );
        assert!(serde_json::from_str::<FileSource>("\"git\"").is_err());
    }

    #[test]
    fn git_provider_uses_camel_case_spelling() {
        assert_eq!(
            serde_json::to_string(&GitProvider::GitHub).unwrap(),
            "\"gitHub\""
        );
        assert_eq!(
            serde_json::to_string(&GitProvider::AzureDevOpsServices).unwrap(),
            "\"azureDevOpsServices\""
        );
    }

    #[test]
    fn builder_matches_parsed_structure() {
        let wh = "d1184b8c2a8a87eb";
        let job = JobSpec::new(
            "Orchestrating_SQL_Files_on_DBSQL_WAREHOUSE",
            vec![
                TaskSpec::new(
                    "Create_Tables",
                    SqlTask::git_file("tutorials/1.Create_Tables.sql", wh),
                ),
                TaskSpec::new(
                    "Load_Data",
                    SqlTask::workspace_file("/Workspace/tutorials/2.Load_Data.sql", wh),
                )
                .depends_on("Create_Tables"),
                TaskSpec::new(
                    "Query_Fact_Sales",
                    SqlTask::workspace_file("/Workspace/tutorials/3.Query_Fact_Sales.sql", wh),
                )
                .depends_on("Load_Data"),
            ],
        )
        .with_git_source(GitSource::new(
            "https://github.com/example-org/dbsql-demos.git",
            GitProvider::GitHub,
            "main",
        ))
        .with_run_as(RunAs::user("analyst@example.com"));

        let parsed: JobSpec = serde_json::from_str(TUTORIAL_JOB).expect("deserialize");
        assert_eq!(job.structure(), parsed.structure());
    }

    #[test]
    fn structure_distinguishes_different_edges() {
        let wh = "w1";
        let chain = JobSpec::new(
            "j",
            vec![
                TaskSpec::new("a", SqlTask::git_file("a.sql", wh)),
                TaskSpec::new("b", SqlTask::git_file("b.sql", wh)).depends_on("a"),
            ],
        );
        let flat = JobSpec::new(
            "j",
            vec![
                TaskSpec::new("a", SqlTask::git_file("a.sql", wh)),
                TaskSpec::new("b", SqlTask::git_file("b.sql", wh)),
            ],
        );
        assert_ne!(chain.structure(), flat.structure());
    }
}
