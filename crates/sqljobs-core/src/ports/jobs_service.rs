//! Port for handing a job spec to the orchestration service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{JobId, JobSpec, SubmitError};

/// Something that can register a job definition with the service.
///
/// The service owns the job from the moment this returns; the receipt is the
/// only thing that flows back. Implementations: `impls::DatabricksCli` (the
/// real CLI), `impls::RecordingService` (tests).
#[async_trait]
pub trait JobsService: Send + Sync {
    async fn create_job(&self, spec: &JobSpec) -> Result<SubmissionReceipt, SubmitError>;
}

/// Proof of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub job_id: JobId,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            submitted_at: Utc::now(),
        }
    }
}
