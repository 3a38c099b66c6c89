//! Show command - Print a stored report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use provcheck_report::ReportReader;

use super::print_report;

#[derive(Args)]
pub struct ShowArgs {
    /// Report directory (the one holding metadata.json)
    #[arg(short, long)]
    path: PathBuf,
}

pub fn execute(args: ShowArgs) -> Result<()> {
    let report = ReportReader::read(&args.path)
        .with_context(|| format!("Failed to read report at {}", args.path.display()))?;

    println!("📋 Report {}", args.path.display());
    print_report(&report);
    Ok(())
}
