//! Local invariant checks over a parsed job spec.
//!
//! Fail-fast before submission: everything here can be decided from the
//! document alone, so a broken spec never reaches the external CLI. Checks
//! that need service-side state (live warehouse, repo access, authorization)
//! are out of scope and stay with the service.

use std::collections::HashSet;

use crate::domain::{FileSource, JobSpec, SpecError};
use crate::graph::DependencyGraph;

impl JobSpec {
    /// All invariant violations in this spec, in a stable order:
    /// task-shape problems first, then reference problems, then the
    /// cycle check (run once per spec, not per task).
    pub fn violations(&self) -> Vec<SpecError> {
        let mut violations = Vec::new();

        if self.tasks.is_empty() {
            violations.push(SpecError::EmptyJob);
        }

        let mut seen = HashSet::new();
        for (index, task) in self.tasks.iter().enumerate() {
            if task.task_key.is_empty() {
                violations.push(SpecError::EmptyTaskKey { index });
            }
            if !seen.insert(&task.task_key) {
                violations.push(SpecError::DuplicateTaskKey(task.task_key.clone()));
            }
        }

        for task in &self.tasks {
            for dep in &task.depends_on {
                if dep.task_key == task.task_key {
                    violations.push(SpecError::SelfDependency(task.task_key.clone()));
                } else if !seen.contains(&dep.task_key) {
                    violations.push(SpecError::UnknownDependency {
                        task: task.task_key.clone(),
                        dependency: dep.task_key.clone(),
                    });
                }
            }

            if task.sql_task.file.source == FileSource::Git && self.git_source.is_none() {
                violations.push(SpecError::MissingGitSource(task.task_key.clone()));
            }
            if task.sql_task.warehouse_id.is_empty() {
                violations.push(SpecError::EmptyWarehouseId(task.task_key.clone()));
            }
        }

        if let Some(run_as) = &self.run_as {
            let identities =
                run_as.user_name.is_some() as usize + run_as.service_principal_name.is_some() as usize;
            if identities != 1 {
                violations.push(SpecError::AmbiguousRunAs);
            }
        }

        // Self-dependencies are already reported above; only look for wider
        // cycles so a witness like "a -> b -> a" is not drowned out.
        if let Some(cycle) = DependencyGraph::from_spec(self).detect_cycle() {
            if cycle.len() > 2 {
                violations.push(SpecError::DependencyCycle(cycle));
            }
        }

        violations
    }

    /// First violation, if any. Convenience for callers that only need a
    /// yes/no answer; the CLI prints the full list from [`violations`].
    ///
    /// [`violations`]: JobSpec::violations
    pub fn validate(&self) -> Result<(), SpecError> {
        match self.violations().into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spec::TUTORIAL_JOB;
    use crate::domain::{GitProvider, GitSource, RunAs, SqlTask, TaskKey, TaskSpec};

    fn chain_job() -> JobSpec {
        JobSpec::new(
            "chain",
            vec![
                TaskSpec::new("a", SqlTask::workspace_file("/sql/a.sql", "w1")),
                TaskSpec::new("b", SqlTask::workspace_file("/sql/b.sql", "w1")).depends_on("a"),
            ],
        )
    }

    #[test]
    fn tutorial_job_is_valid() {
        let job: JobSpec = serde_json::from_str(TUTORIAL_JOB).expect("deserialize");
        assert_eq!(job.violations(), vec![]);
        assert!(job.validate().is_ok());
    }

    #[test]
    fn empty_job_is_rejected() {
        let job = JobSpec::new("empty", vec![]);
        assert_eq!(job.violations(), vec![SpecError::EmptyJob]);
    }

    #[test]
    fn duplicate_task_keys_are_rejected() {
        let mut job = chain_job();
        job.tasks
            .push(TaskSpec::new("a", SqlTask::workspace_file("/sql/c.sql", "w1")));

        assert_eq!(
            job.violations(),
            vec![SpecError::DuplicateTaskKey(TaskKey::new("a"))]
        );
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut job = chain_job();
        job.tasks[1] = TaskSpec::new("b", SqlTask::workspace_file("/sql/b.sql", "w1"))
            .depends_on("does_not_exist");

        assert_eq!(
            job.violations(),
            vec![SpecError::UnknownDependency {
                task: TaskKey::new("b"),
                dependency: TaskKey::new("does_not_exist"),
            }]
        );
    }

    #[test]
    fn self_dependency_is_rejected() {
        let mut job = chain_job();
        job.tasks[1] =
            TaskSpec::new("b", SqlTask::workspace_file("/sql/b.sql", "w1")).depends_on("b");

        assert_eq!(
            job.violations(),
            vec![SpecError::SelfDependency(TaskKey::new("b"))]
        );
    }

    #[test]
    fn cycle_is_reported_with_witness() {
        let mut job = chain_job();
        job.tasks[0] =
            TaskSpec::new("a", SqlTask::workspace_file("/sql/a.sql", "w1")).depends_on("b");

        let violations = job.violations();
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            SpecError::DependencyCycle(cycle) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.len() == 3, "a <-> b witness: {cycle:?}");
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn git_task_without_git_source_is_rejected() {
        let job = JobSpec::new(
            "git-job",
            vec![TaskSpec::new("a", SqlTask::git_file("sql/a.sql", "w1"))],
        );

        assert_eq!(
            job.violations(),
            vec![SpecError::MissingGitSource(TaskKey::new("a"))]
        );
    }

    #[test]
    fn git_task_with_git_source_is_accepted() {
        let job = JobSpec::new(
            "git-job",
            vec![TaskSpec::new("a", SqlTask::git_file("sql/a.sql", "w1"))],
        )
        .with_git_source(GitSource::new(
            "https://github.com/example-org/dbsql-demos.git",
            GitProvider::GitHub,
            "main",
        ));

        assert_eq!(job.violations(), vec![]);
    }

    #[test]
    fn run_as_with_no_identity_is_rejected() {
        let job = chain_job().with_run_as(RunAs::default());
        assert_eq!(job.violations(), vec![SpecError::AmbiguousRunAs]);
    }

    #[test]
    fn run_as_with_both_identities_is_rejected() {
        let mut run_as = RunAs::user("analyst@example.com");
        run_as.service_principal_name = Some("11111111-2222-3333-4444-555555555555".into());
        let job = chain_job().with_run_as(run_as);

        assert_eq!(job.violations(), vec![SpecError::AmbiguousRunAs]);
    }

    #[test]
    fn run_as_service_principal_is_accepted() {
        let job = chain_job().with_run_as(RunAs::service_principal(
            "11111111-2222-3333-4444-555555555555",
        ));
        assert_eq!(job.violations(), vec![]);
    }

    #[test]
    fn empty_warehouse_id_is_rejected() {
        let job = JobSpec::new(
            "no-warehouse",
            vec![TaskSpec::new("a", SqlTask::workspace_file("/sql/a.sql", ""))],
        );

        assert_eq!(
            job.violations(),
            vec![SpecError::EmptyWarehouseId(TaskKey::new("a"))]
        );
    }

    #[test]
    fn multiple_violations_are_all_reported() {
        let job = JobSpec::new(
            "broken",
            vec![
                TaskSpec::new("a", SqlTask::git_file("sql/a.sql", "w1")),
                TaskSpec::new("a", SqlTask::workspace_file("/sql/b.sql", ""))
                    .depends_on("missing"),
            ],
        );

        let violations = job.violations();
        assert!(violations.contains(&SpecError::DuplicateTaskKey(TaskKey::new("a"))));
        assert!(violations.contains(&SpecError::MissingGitSource(TaskKey::new("a"))));
        assert!(violations.contains(&SpecError::EmptyWarehouseId(TaskKey::new("a"))));
        assert!(violations.contains(&SpecError::UnknownDependency {
            task: TaskKey::new("a"),
            dependency: TaskKey::new("missing"),
        }));
        assert!(job.validate().is_err());
    }
}
