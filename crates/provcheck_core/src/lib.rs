//! # provcheck Core
//!
//! The validation pipeline for provcheck.
//!
//! A check resolves the bridged provider and host tool versions, fetches the
//! provider schema for a source identifier, and validates SDK generation and
//! build for every selected language. The result is a
//! [`provcheck_report::ProviderReport`] written to a deterministic location.
//!
//! Languages form an open registry: each is a [`LanguageToolchain`]
//! registered under its name in a [`LanguageRegistry`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use provcheck_core::{CheckConfig, CheckPipeline, CheckRequest};
//! use provcheck_runner::{Cancellation, ProcessRunner};
//!
//! # async fn example() -> provcheck_core::CheckResult<()> {
//! let pipeline = CheckPipeline::from_config(&CheckConfig::default(), Arc::new(ProcessRunner::default()))?;
//! let outcome = pipeline
//!     .run(&CheckRequest::new("hashicorp/random"), &Cancellation::never())
//!     .await?;
//! println!("report at {}", outcome.report_dir.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod language;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod validator;
pub mod version;

pub use config::{CheckConfig, CustomLanguage};
pub use error::{CheckError, CheckResult};
pub use host::{HostTool, DEFAULT_TOOL};
pub use language::{presets, Built, GenSdkToolchain, Generated, LanguageToolchain};
pub use pipeline::{CheckOutcome, CheckPipeline, CheckRequest};
pub use registry::LanguageRegistry;
pub use schema::{SchemaFetch, SchemaFetcher};
pub use validator::LanguageValidator;
pub use version::{ResolvedVersions, VersionResolver};
