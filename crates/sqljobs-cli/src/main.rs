//! sqljobs: author, check, and submit SQL-task job specs from the terminal.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sqljobs_core::domain::JobSpec;
use sqljobs_core::graph::DependencyGraph;
use sqljobs_core::impls::DatabricksCli;
use sqljobs_core::ports::JobsService;
use sqljobs_core::template::{self, Substitutions};

mod config;
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "sqljobs")]
#[command(about = "Author, validate, and submit SQL-file job specs to a warehouse scheduler.")]
struct Cli {
    /// Config file (default: ./sqljobs.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a job spec against the local invariants; print the execution order.
    Validate {
        /// Job spec JSON document.
        #[arg(long)]
        file: PathBuf,
    },

    /// List the placeholder names found in a templated spec.
    Placeholders {
        /// Templated spec JSON document.
        #[arg(long)]
        file: PathBuf,
    },

    /// Fill a template's placeholders and print (or write) the rendered spec.
    Render {
        /// Templated spec JSON document.
        #[arg(long)]
        file: PathBuf,

        /// Placeholder value, repeatable. Overrides [substitutions] from config.
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Write the rendered spec here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a job spec, then register it with the service.
    Submit {
        /// Job spec JSON document.
        #[arg(long)]
        file: PathBuf,

        /// Connection profile, forwarded to the external CLI. Overrides config.
        #[arg(long)]
        profile: Option<String>,

        /// Print the exact payload instead of calling the external CLI.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { file } => validate(&file),
        Commands::Placeholders { file } => placeholders(&file),
        Commands::Render { file, set, output } => render(&file, &set, output.as_deref(), &config),
        Commands::Submit {
            file,
            profile,
            dry_run,
        } => submit(&file, profile, dry_run, &config).await,
    }
}

fn read_doc(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_spec(path: &Path) -> anyhow::Result<JobSpec> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a job spec document", path.display()))
}

/// Report all violations, or show the order the service may run the tasks in.
fn validate(file: &Path) -> anyhow::Result<()> {
    let spec = read_spec(file)?;
    let violations = spec.violations();
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("error: {violation}");
        }
        bail!("{} violation(s) in {}", violations.len(), file.display());
    }

    let order = DependencyGraph::from_spec(&spec)
        .execution_order()
        .context("validated specs are acyclic")?;
    println!("{}: ok ({} tasks)", spec.name, spec.tasks.len());
    for (position, key) in order.iter().enumerate() {
        println!("  {}. {key}", position + 1);
    }
    Ok(())
}

fn placeholders(file: &Path) -> anyhow::Result<()> {
    let doc = read_doc(file)?;
    let names = template::placeholders(&doc);
    if names.is_empty() {
        println!("no placeholders");
    } else {
        for name in names {
            println!("<{name}>");
        }
    }
    Ok(())
}

fn render(
    file: &Path,
    set: &[String],
    output: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let doc = read_doc(file)?;

    let mut subs = Substitutions::from(config.substitutions.clone());
    for pair in set {
        let (name, value) = parse_substitution(pair)?;
        subs.insert(name, value);
    }

    let rendered = match template::render(&doc, &subs) {
        Ok(rendered) => rendered,
        Err(err) => {
            for gap in err.unresolved() {
                eprintln!("error: unresolved {gap}");
            }
            bail!("{err}");
        }
    };

    let spec: JobSpec = serde_json::from_value(rendered.clone())
        .context("rendered document is not a job spec")?;
    let violations = spec.violations();
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("error: {violation}");
        }
        bail!("rendered spec has {} violation(s)", violations.len());
    }

    let pretty = serde_json::to_string_pretty(&rendered).expect("rendered doc serializes");
    match output {
        Some(path) => {
            fs::write(path, format!("{pretty}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote rendered spec");
        }
        None => println!("{pretty}"),
    }
    Ok(())
}

async fn submit(
    file: &Path,
    profile: Option<String>,
    dry_run: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let spec = read_spec(file)?;
    let violations = spec.violations();
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("error: {violation}");
        }
        bail!("refusing to submit: {} violation(s)", violations.len());
    }

    if dry_run {
        println!(
            "{}",
            serde_json::to_string_pretty(&spec).expect("job spec serializes")
        );
        return Ok(());
    }

    let mut service = DatabricksCli::new(&config.cli.bin);
    if let Some(profile) = profile.or_else(|| config.cli.profile.clone()) {
        service = service.with_profile(profile);
    }

    let receipt = service
        .create_job(&spec)
        .await
        .with_context(|| format!("submitting {}", file.display()))?;
    println!("job_id: {}", receipt.job_id);
    Ok(())
}

fn parse_substitution(pair: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = pair
        .split_once('=')
        .with_context(|| format!("--set {pair:?}: expected NAME=VALUE"))?;
    if name.is_empty() {
        bail!("--set {pair:?}: placeholder name is empty");
    }
    Ok((name.to_string(), value.to_string()))
}
