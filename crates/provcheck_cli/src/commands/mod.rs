//! CLI command definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use provcheck_core::CheckConfig;
use provcheck_report::ProviderReport;

pub mod check;
pub mod languages;
pub mod show;

/// provcheck - provider schema and SDK validation
#[derive(Parser)]
#[command(name = "provcheck")]
#[command(version, about = "Validate provider schemas and generated SDKs")]
#[command(long_about = r#"
provcheck fetches a provider's schema through the host provisioning tool,
generates an SDK for each configured language, builds it, and records the
outcome in a report tree:

  <root>/<tool version>/<source>/<schema version>/     successful fetch
  <root>/<tool version>/failures/<invocation args>/    failed fetch

COMMANDS:
  check       → Run the full check for one provider source
  show        → Print the summary of a stored report
  languages   → List the languages that can be validated

EXIT CODES:
  0 - Report written
  1 - Fatal error (version resolution, configuration, report write)
"#)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a provider schema and validate its SDKs
    Check(check::CheckArgs),

    /// Print the summary of a stored report
    Show(show::ShowArgs),

    /// List the registered languages and their build commands
    Languages(languages::LanguagesArgs),
}

/// Load `--config` if given, otherwise start from defaults.
pub fn load_config(path: Option<&PathBuf>) -> Result<CheckConfig> {
    match path {
        Some(path) => CheckConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CheckConfig::default()),
    }
}

/// One line per language: `<lang>: generated=<bool>, built=<bool>`.
pub fn summary_lines(report: &ProviderReport) -> Vec<String> {
    report
        .languages()
        .map(|(language, outcome)| {
            format!(
                "{}: generated={}, built={}",
                language,
                outcome.generated(),
                outcome.succeeded()
            )
        })
        .collect()
}

/// Print the schema stage and per-language outcome of a report.
pub fn print_report(report: &ProviderReport) {
    println!("   Source: {}", report.source());
    println!("   Host tool version: {}", report.host_tool_version);
    if !report.resolved_version.is_empty() {
        println!("   Bridge version: {}", report.resolved_version);
    }

    match (report.schema(), report.schema_failure()) {
        (Some(schema), _) => println!("   ✅ Schema {} {}", schema.name(), schema.version()),
        (None, Some(failure)) => println!("   ❌ Schema fetch failed ({}): {}", failure.kind, failure.message),
        (None, None) => println!("   ❌ No schema"),
    }

    for line in summary_lines(report) {
        println!("   {}", line);
    }
}
