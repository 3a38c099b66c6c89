//! Languages command - List validatable languages.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use provcheck_core::{CheckConfig, HostTool};
use provcheck_runner::ProcessRunner;

use super::load_config;

#[derive(Args)]
pub struct LanguagesArgs {
    /// YAML configuration file with custom languages
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// `(name, build command, selected by default)` for every registered language.
fn listing(config: &CheckConfig) -> Result<Vec<(String, String, bool)>> {
    let host = HostTool::new(config.tool.clone(), Arc::new(ProcessRunner::default()));
    let registry = config.registry(&host).context("Invalid configuration")?;

    Ok(registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let toolchain = registry.get(name)?;
            let selected = config.languages.iter().any(|l| l == name);
            Some((name.to_string(), toolchain.build_command(), selected))
        })
        .collect())
}

pub fn execute(args: LanguagesArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;

    println!("🧰 Registered languages:");
    for (name, build, selected) in listing(&config)? {
        let marker = if selected { "*" } else { " " };
        println!("  {} {:<10} {}", marker, name, build);
    }
    println!();
    println!("  * selected by default");
    Ok(())
}
