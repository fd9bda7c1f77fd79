//! Extractor registry.

use crate::core::formats::FileKind;
use crate::plugins::DocumentExtractor;
use crate::{Result, TextbatchError};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each [`FileKind`] to the extractor that handles it.
///
/// Registering a second extractor for a kind replaces the first.
pub struct ExtractorRegistry {
    extractors: HashMap<FileKind, Arc<dyn DocumentExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty extractor registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor for every kind it supports.
    ///
    /// # Errors
    ///
    /// Fails if the extractor's `initialize` fails, or if it claims
    /// [`FileKind::Unsupported`].
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) -> Result<()> {
        let kinds = extractor.supported_kinds().to_vec();
        if kinds.is_empty() || kinds.contains(&FileKind::Unsupported) {
            return Err(TextbatchError::validation(format!(
                "Extractor '{}' must support at least one concrete file kind",
                extractor.name()
            )));
        }

        extractor.initialize()?;

        for kind in kinds {
            if let Some(previous) = self.extractors.insert(kind, Arc::clone(&extractor)) {
                tracing::debug!(
                    kind = %kind,
                    replaced = previous.name(),
                    extractor = extractor.name(),
                    "Replaced registered extractor"
                );
            }
        }
        Ok(())
    }

    /// Get the extractor for a kind.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when nothing is registered for `kind`.
    pub fn get(&self, kind: FileKind) -> Result<Arc<dyn DocumentExtractor>> {
        self.extractors
            .get(&kind)
            .cloned()
            .ok_or_else(|| TextbatchError::UnsupportedFormat(kind.to_string()))
    }

    /// Names of registered extractors, sorted and deduplicated.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extractors.values().map(|e| e.name().to_string()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn shutdown_all(&mut self) -> Result<()> {
        let mut seen = Vec::new();
        for extractor in self.extractors.values() {
            let name = extractor.name().to_string();
            if !seen.contains(&name) {
                extractor.shutdown()?;
                seen.push(name);
            }
        }
        self.extractors.clear();
        Ok(())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
