//! Schema fetching.

use tracing::{info, warn};

use provcheck_report::{SchemaDocument, SchemaFailure, SchemaFailureKind};
use provcheck_runner::Cancellation;

use crate::host::HostTool;

/// Outcome of a schema fetch. Stderr is kept whatever the result.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFetch {
    pub diagnostics: Vec<u8>,
    pub result: Result<SchemaDocument, SchemaFailure>,
}

impl SchemaFetch {
    fn failed(diagnostics: Vec<u8>, kind: SchemaFailureKind, message: impl Into<String>) -> Self {
        Self {
            diagnostics,
            result: Err(SchemaFailure::new(kind, message)),
        }
    }
}

/// Fetches a provider schema through the host tool.
#[derive(Debug, Clone)]
pub struct SchemaFetcher {
    host: HostTool,
}

impl SchemaFetcher {
    pub fn new(host: HostTool) -> Self {
        Self { host }
    }

    /// Fetch the schema for `source`, optionally pinned to `version`.
    ///
    /// Never fails: subprocess and parse failures are returned as data.
    pub async fn fetch(
        &self,
        source: &str,
        version: Option<&str>,
        cancel: &Cancellation,
    ) -> SchemaFetch {
        let spec = self.host.provider_schema_command(Some(source), version);

        let result = match self.host.run(&spec, cancel).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Unable to run schema fetch for {}: {}", source, e);
                return SchemaFetch::failed(Vec::new(), SchemaFailureKind::Invocation, e.to_string());
            }
        };

        if let Some(err) = result.failure() {
            warn!("Schema fetch for {} failed: {}", source, err);
            let kind = if err.is_cancelled() {
                SchemaFailureKind::Cancelled
            } else {
                SchemaFailureKind::Invocation
            };
            return SchemaFetch::failed(result.stderr, kind, err.to_string());
        }

        match SchemaDocument::from_slice(&result.stdout) {
            Ok(schema) => {
                info!(
                    "Fetched schema {} version {} for {}",
                    schema.name(),
                    schema.version(),
                    source
                );
                SchemaFetch {
                    diagnostics: result.stderr,
                    result: Ok(schema),
                }
            }
            Err(e) => {
                warn!("Schema output for {} is not a schema: {}", source, e);
                SchemaFetch::failed(result.stderr, SchemaFailureKind::Parse, e.to_string())
            }
        }
    }
}
