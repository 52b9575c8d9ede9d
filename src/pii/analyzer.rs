//! Analyzer engine: runs recognizers over a text and resolves their spans

use super::registry::RecognizerRegistry;
use super::{conflict, AnalyzerError, PiiEntity};

pub struct AnalyzerEngine {
    registry: RecognizerRegistry,
}

impl AnalyzerEngine {
    pub fn new(registry: RecognizerRegistry) -> Self {
        Self { registry }
    }

    /// Analyzer with the predefined and Indian recognizers registered
    pub fn with_defaults() -> Result<Self, AnalyzerError> {
        Ok(Self::new(RecognizerRegistry::with_defaults()?))
    }

    pub fn registry(&self) -> &RecognizerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RecognizerRegistry {
        &mut self.registry
    }

    /// Find PII spans in `text`.
    ///
    /// Every recognizer registered for `language` runs over the text. When
    /// `entities` is given only those entity types are reported. Overlapping
    /// candidates are resolved so the result holds non-overlapping spans
    /// ordered by start offset.
    pub fn analyze(
        &self,
        text: &str,
        language: &str,
        entities: Option<&[String]>,
    ) -> Result<Vec<PiiEntity>, AnalyzerError> {
        if !self.registry.supports_language(language) {
            return Err(AnalyzerError::UnsupportedLanguage(language.to_string()));
        }
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for recognizer in self.registry.recognizers(language, entities) {
            let found = recognizer.analyze(text)?;
            tracing::trace!("{} produced {} candidates", recognizer.name(), found.len());
            candidates.extend(found);
        }

        if let Some(wanted) = entities {
            candidates.retain(|c| wanted.contains(&c.entity_type));
        }

        let resolved = conflict::resolve(candidates);
        tracing::debug!("Analysis found {} entities", resolved.len());
        Ok(resolved)
    }
}
