//! Per-language SDK validation.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use provcheck_report::LanguageReport;
use provcheck_runner::Cancellation;

use crate::language::LanguageToolchain;

/// Validates one language: generate, then build if generation succeeded.
pub struct LanguageValidator {
    language: String,
    toolchain: Arc<dyn LanguageToolchain>,
}

impl LanguageValidator {
    pub fn new(language: impl Into<String>, toolchain: Arc<dyn LanguageToolchain>) -> Self {
        Self {
            language: language.into(),
            toolchain,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Run the validation. Failures are recorded in the returned report.
    pub async fn validate(
        &self,
        schema_path: &Path,
        scratch_dir: &Path,
        cancel: &Cancellation,
    ) -> LanguageReport {
        info!("[{}] Validating SDK", self.language);

        let generated = self.toolchain.generate(schema_path, scratch_dir, cancel).await;
        if generated.error.is_some() {
            return LanguageReport::generation_failed(generated.diagnostics);
        }

        let built = self.toolchain.build(&generated.sdk_path, cancel).await;
        LanguageReport::build_attempted(
            generated.sdk_path,
            generated.diagnostics,
            built.command,
            built.diagnostics,
            built.error.is_none(),
        )
    }
}
