//! Strongly-typed identifiers used across the job-spec model.
//!
//! `TaskKey` and `WarehouseId` are author-chosen strings carried on the wire
//! verbatim. `JobId` is minted by the orchestration service on submission and
//! only ever flows back toward the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a task, unique within one job spec.
///
/// Other tasks reference it from their `depends_on` lists, so equality and
/// ordering are defined (ordering is used for deterministic reporting).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a SQL warehouse (external compute resource).
///
/// Opaque to this crate; whether it names a live warehouse is only decided by
/// the service at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehouseId(String);

impl WarehouseId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WarehouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for WarehouseId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a created job, returned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(u64);

impl JobId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
