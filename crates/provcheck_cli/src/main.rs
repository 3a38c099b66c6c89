//! provcheck CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success (a report was written, whatever it records)
//! - 1: Fatal error (version resolution, configuration or report write)

use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use provcheck_runner::cancellation;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "provcheck=debug,info"
    } else {
        "provcheck=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running commands");
            handle.cancel();
        }
    });

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args, cancel).await,
        Commands::Show(args) => commands::show::execute(args),
        Commands::Languages(args) => commands::languages::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(ExitCodes::FAILURE)
        }
    }
}
