//! Check configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, CheckResult};
use crate::host::{HostTool, DEFAULT_TOOL};
use crate::language::GenSdkToolchain;
use crate::registry::LanguageRegistry;

/// An additional gen-sdk language with its own build command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLanguage {
    /// Language name passed to `gen-sdk --language`
    pub name: String,
    /// Build program followed by its arguments
    pub build: Vec<String>,
}

/// Configuration for a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Host tool program
    pub tool: String,
    /// Directory reports are written under
    pub report_root: PathBuf,
    /// Languages to validate, in order
    pub languages: Vec<String>,
    /// Languages registered on top of the presets
    pub custom_languages: Vec<CustomLanguage>,
    /// Per-subprocess bound in seconds (0 = unbounded)
    pub timeout_seconds: u64,
    /// Validate languages concurrently
    pub parallel_languages: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            report_root: PathBuf::from("providers"),
            languages: vec!["dotnet".to_string()],
            custom_languages: Vec::new(),
            timeout_seconds: 0,
            parallel_languages: true,
        }
    }
}

impl CheckConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> CheckResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> CheckResult<Self> {
        let config: CheckConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Check everything that does not need a registry.
    pub fn validate(&self) -> CheckResult<()> {
        if self.tool.trim().is_empty() {
            return Err(CheckError::Config("tool must not be empty".to_string()));
        }
        if self.report_root.as_os_str().is_empty() {
            return Err(CheckError::Config("report_root must not be empty".to_string()));
        }
        if self.languages.is_empty() {
            return Err(CheckError::Config("no languages selected".to_string()));
        }
        for custom in &self.custom_languages {
            if custom.name.trim().is_empty() {
                return Err(CheckError::Config("custom language without a name".to_string()));
            }
            if custom.build.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(CheckError::Config(format!(
                    "custom language '{}' has no build command",
                    custom.name
                )));
            }
        }
        Ok(())
    }

    /// Presets plus custom languages, with every selected language present.
    pub fn registry(&self, host: &HostTool) -> CheckResult<LanguageRegistry> {
        self.validate()?;

        let mut registry = LanguageRegistry::with_presets(host);
        for custom in &self.custom_languages {
            registry.register(
                custom.name.clone(),
                Arc::new(GenSdkToolchain::new(
                    custom.name.clone(),
                    host.clone(),
                    custom.build.clone(),
                )),
            );
        }

        if let Some(unknown) = self.languages.iter().find(|l| !registry.contains(l)) {
            return Err(CheckError::Config(format!(
                "unknown language '{}' (known: {})",
                unknown,
                registry.names().join(", ")
            )));
        }
        Ok(registry)
    }
}
