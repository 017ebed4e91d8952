//! sqljobs-core
//!
//! Building blocks for authoring SQL-task job specifications and handing them
//! to an external orchestration service through its CLI.
//!
//! - **domain**: the wire model (job, tasks, `run_if`, file sources, identities)
//! - **graph**: the `depends_on` relation as a checkable DAG
//! - **validate**: local invariant checks before anything leaves the machine
//! - **template**: `<NAME>` placeholder documents and their rendering
//! - **ports** / **impls**: the service boundary (`databricks` CLI, test fake)
//!
//! The service schedules, retries, and evaluates `run_if` on its own; this
//! crate stops at the submission boundary.

pub mod domain;
pub mod graph;
pub mod impls;
pub mod ports;
pub mod template;
pub mod validate;
