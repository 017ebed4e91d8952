//! Implementations of the service ports.

pub mod databricks_cli;
pub mod recording;

pub use databricks_cli::DatabricksCli;
pub use recording::RecordingService;
