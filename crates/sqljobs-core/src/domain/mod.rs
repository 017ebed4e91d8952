//! Domain model: identifiers, the job-spec wire format, and error types.

pub mod errors;
pub mod keys;
pub mod spec;

pub use errors::{SpecError, SubmitError, TemplateError, UnresolvedPlaceholder};
pub use keys::{JobId, TaskKey, WarehouseId};
pub use spec::{
    FileSource, GitProvider, GitSource, JobSpec, JobStructure, RunAs, RunIf, SqlFileRef, SqlTask,
    TaskDependency, TaskSpec,
};
