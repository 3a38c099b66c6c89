//! # provcheck_runner
//!
//! Subprocess execution wrapper for provcheck.
//!
//! Every external tool the checker drives (the host provisioning CLI and the
//! per-language build toolchains) is invoked through the [`CommandRunner`]
//! trait, which captures stdout and stderr independently and never blocks
//! past the run's [`Cancellation`] signal.
//!
//! # Features
//!
//! - **Process Runner**: real child processes via `tokio::process`
//! - **Cancellation**: one run-wide token, children and their process
//!   groups are killed when it fires
//! - **Timeouts**: optional per-command bound
//! - **Mock Runner**: scripted responses for tests without external tools
//!
//! # Example
//!
//! ```rust,no_run
//! use provcheck_runner::{Cancellation, CommandRunner, CommandSpec, ProcessRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ProcessRunner::default();
//!     let spec = CommandSpec::new("pulumi").arg("version");
//!
//!     let result = runner.run(&spec, &Cancellation::never()).await?;
//!     println!("{}", result.stdout_lossy().trim());
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use config::CommandSpec;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockEffect, MockResponse, MockRunner};
pub use process::ProcessRunner;
pub use runner::{CommandRunner, ExecutionResult, Termination};
