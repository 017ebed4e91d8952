//! In-memory JobsService for tests and dry wiring.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{JobId, JobSpec, SubmitError};
use crate::ports::{JobsService, SubmissionReceipt};

/// Records every submitted spec and mints sequential job ids starting at 1.
///
/// Stands in for the external CLI wherever a test needs to observe what would
/// have been submitted.
#[derive(Debug, Default)]
pub struct RecordingService {
    submitted: Mutex<Vec<JobSpec>>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Specs received so far, in submission order.
    pub fn submitted(&self) -> Vec<JobSpec> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobsService for RecordingService {
    async fn create_job(&self, spec: &JobSpec) -> Result<SubmissionReceipt, SubmitError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(spec.clone());
        Ok(SubmissionReceipt::new(JobId::new(submitted.len() as u64)))
    }
}
