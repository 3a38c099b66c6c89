//! Language registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CheckError, CheckResult};
use crate::host::HostTool;
use crate::language::{presets, GenSdkToolchain, LanguageToolchain};

/// Maps language names to their toolchains.
///
/// Adding a language means registering a toolchain; nothing else in the
/// pipeline refers to a language by name.
#[derive(Default, Clone)]
pub struct LanguageRegistry {
    toolchains: BTreeMap<String, Arc<dyn LanguageToolchain>>,
}

impl LanguageRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            toolchains: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in gen-sdk languages.
    pub fn with_presets(host: &HostTool) -> Self {
        let mut registry = Self::new();
        for (language, build) in presets() {
            registry.register(
                language,
                Arc::new(GenSdkToolchain::new(language, host.clone(), build)),
            );
        }
        registry
    }

    /// Register a toolchain, replacing any existing one of the same name.
    pub fn register(&mut self, language: impl Into<String>, toolchain: Arc<dyn LanguageToolchain>) {
        let language = language.into();
        debug!("Registering language: {}", language);
        self.toolchains.insert(language, toolchain);
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn LanguageToolchain>> {
        self.toolchains.get(language).cloned()
    }

    /// Get a toolchain, returning an error if not registered.
    pub fn get_required(&self, language: &str) -> CheckResult<Arc<dyn LanguageToolchain>> {
        self.get(language)
            .ok_or_else(|| CheckError::UnknownLanguage(language.to_string()))
    }

    pub fn contains(&self, language: &str) -> bool {
        self.toolchains.contains_key(language)
    }

    /// Registered language names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.toolchains.keys().map(String::as_str).collect()
    }

    /// Resolve `languages` to toolchains, failing on the first unknown name.
    pub fn select(&self, languages: &[String]) -> CheckResult<Vec<(String, Arc<dyn LanguageToolchain>)>> {
        languages
            .iter()
            .map(|language| Ok((language.clone(), self.get_required(language)?)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.toolchains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolchains.is_empty()
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.names())
            .finish()
    }
}
