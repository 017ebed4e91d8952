//! CLI configuration, read from `sqljobs.toml`.
//!
//! ```toml
//! [cli]
//! bin = "databricks"
//! profile = "dev"
//!
//! [substitutions]
//! "DBSQL warehouse_id" = "d1184b8c2a8a87eb"
//! GITPATH = "tutorials"
//! ```
//!
//! `[substitutions]` seeds `render`; `--set` flags override it per run.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// File looked for in the working directory when `--config` is absent.
pub const DEFAULT_PATH: &str = "sqljobs.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cli: CliSection,

    /// Default placeholder values for `render`.
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliSection {
    /// External CLI binary, resolved through `PATH` unless absolute.
    pub bin: String,

    /// Connection profile forwarded as `--profile`.
    pub profile: Option<String>,
}

impl Default for CliSection {
    fn default() -> Self {
        Self {
            bin: sqljobs_core::impls::databricks_cli::DEFAULT_BIN.to_string(),
            profile: None,
        }
    }
}

impl Config {
    /// Load the explicit path, else `sqljobs.toml` if present, else defaults.
    ///
    /// An explicit `--config` path that does not exist is an error; the
    /// implicit default file is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
