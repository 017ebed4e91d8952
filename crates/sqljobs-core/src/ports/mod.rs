//! Abstractions over the external orchestration service.

pub mod jobs_service;

pub use jobs_service::{JobsService, SubmissionReceipt};
