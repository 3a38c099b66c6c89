//! Check command - Validate one provider source.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use provcheck_core::{CheckConfig, CheckPipeline, CheckRequest};
use provcheck_runner::{Cancellation, ProcessRunner};

use super::{load_config, print_report};

#[derive(Args)]
pub struct CheckArgs {
    /// Provider source identifier (e.g. hashicorp/random)
    #[arg(long)]
    source: String,

    /// Pin the provider version
    #[arg(long = "version")]
    provider_version: Option<String>,

    /// Directory reports are written under
    #[arg(long, env = "PROVCHECK_ROOT")]
    root: Option<PathBuf>,

    /// Host tool program
    #[arg(long, env = "PROVCHECK_TOOL")]
    tool: Option<String>,

    /// Language to validate (repeatable, replaces the configured list)
    #[arg(short, long = "language")]
    languages: Vec<String>,

    /// Per-command timeout in seconds (0 = unbounded)
    #[arg(long)]
    timeout: Option<u64>,

    /// Validate languages one after another
    #[arg(long)]
    sequential: bool,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CheckArgs {
    /// Configuration file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<CheckConfig> {
        let mut config = load_config(self.config.as_ref())?;

        if let Some(root) = &self.root {
            config.report_root = root.clone();
        }
        if let Some(tool) = &self.tool {
            config.tool = tool.clone();
        }
        if !self.languages.is_empty() {
            config.languages = self.languages.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if self.sequential {
            config.parallel_languages = false;
        }
        Ok(config)
    }

    fn request(&self) -> CheckRequest {
        let request = CheckRequest::new(&self.source);
        match &self.provider_version {
            Some(version) => request.with_version(version),
            None => request,
        }
    }
}

pub async fn execute(args: CheckArgs, cancel: Cancellation) -> Result<()> {
    let config = args.resolve_config()?;
    let pipeline = CheckPipeline::from_config(&config, Arc::new(ProcessRunner::default()))
        .context("Invalid check configuration")?;

    info!("Checking provider source: {}", args.source);
    println!("🔍 Checking {} ({})", args.source, config.languages.join(", "));

    let outcome = pipeline
        .run(&args.request(), &cancel)
        .await
        .with_context(|| format!("Check of {} failed", args.source))?;

    print_report(&outcome.report);
    println!();
    println!("📁 Report written to {}", outcome.report_dir.display());

    Ok(())
}
