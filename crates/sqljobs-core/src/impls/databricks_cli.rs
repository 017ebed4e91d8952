//! JobsService backed by the external `databricks` CLI.
//!
//! The CLI is a black box: this impl serializes the spec, runs
//! `databricks jobs create --json <document>`, and reads the `{"job_id": N}`
//! response back. Every service-side failure (bad reference, unknown
//! warehouse, authorization) comes out of the CLI's exit status and stderr,
//! which are passed through verbatim.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::{JobId, JobSpec, SubmitError};
use crate::ports::{JobsService, SubmissionReceipt};

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_BIN: &str = "databricks";

/// Handle to the external CLI.
#[derive(Debug, Clone)]
pub struct DatabricksCli {
    bin: String,
    profile: Option<String>,
}

impl DatabricksCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            profile: None,
        }
    }

    /// Named connection profile, forwarded as `--profile`.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Argument vector for one submission, exactly as handed to the binary.
    fn create_args(&self, payload: &str) -> Vec<String> {
        let mut args = vec![
            "jobs".to_string(),
            "create".to_string(),
            "--json".to_string(),
            payload.to_string(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

impl Default for DatabricksCli {
    fn default() -> Self {
        Self::new(DEFAULT_BIN)
    }
}

#[async_trait]
impl JobsService for DatabricksCli {
    async fn create_job(&self, spec: &JobSpec) -> Result<SubmissionReceipt, SubmitError> {
        let payload = serde_json::to_string(spec).expect("job spec serializes");
        debug!(job_name = %spec.name, tasks = spec.tasks.len(), "submitting job spec");

        let output = Command::new(&self.bin)
            .args(self.create_args(&payload))
            .output()
            .await
            .map_err(|source| SubmitError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SubmitError::CliFailed {
                bin: self.bin.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let job_id = parse_create_response(&stdout)?;
        info!(%job_id, job_name = %spec.name, "job created");
        Ok(SubmissionReceipt::new(job_id))
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    job_id: u64,
}

/// Parse the CLI's job-creation response.
///
/// The response is a JSON object carrying at least `job_id`; extra fields
/// from newer CLI versions are ignored.
fn parse_create_response(stdout: &str) -> Result<JobId, SubmitError> {
    let response: CreateResponse =
        serde_json::from_str(stdout.trim()).map_err(|source| SubmitError::MalformedResponse {
            response: stdout.trim().to_string(),
            source,
        })?;
    Ok(JobId::new(response.job_id))
}
