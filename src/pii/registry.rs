//! Recognizer registry

use super::recognizer::{EntityRecognizer, Pattern, PatternRecognizer};
use super::{custom, predefined, AnalyzerError, DEFAULT_LANGUAGE};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Recognizer definitions loaded from TOML
#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    recognizers: Vec<RecognizerDefinition>,
}

#[derive(Debug, Deserialize)]
struct RecognizerDefinition {
    entity: String,
    name: Option<String>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    context: Vec<String>,
    patterns: Vec<PatternDefinition>,
}

#[derive(Debug, Deserialize)]
struct PatternDefinition {
    name: String,
    regex: String,
    score: f32,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Holds every recognizer the analyzer may run
#[derive(Default)]
pub struct RecognizerRegistry {
    recognizers: Vec<Arc<dyn EntityRecognizer>>,
}

impl RecognizerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the predefined recognizers
    pub fn with_predefined() -> Result<Self, AnalyzerError> {
        let mut registry = Self::new();
        for recognizer in predefined::all()? {
            registry.add_recognizer(recognizer);
        }
        Ok(registry)
    }

    /// Predefined recognizers plus the Indian identity recognizers
    pub fn with_defaults() -> Result<Self, AnalyzerError> {
        let mut registry = Self::with_predefined()?;
        for recognizer in custom::indian_recognizers()? {
            registry.add_recognizer(recognizer);
        }
        Ok(registry)
    }

    pub fn add_recognizer<R: EntityRecognizer + 'static>(&mut self, recognizer: R) {
        tracing::debug!(
            "Registering recognizer {} ({})",
            recognizer.name(),
            recognizer.supported_entities().join(", ")
        );
        self.recognizers.push(Arc::new(recognizer));
    }

    /// Remove every recognizer named `name`, returning how many were removed
    pub fn remove_recognizer(&mut self, name: &str) -> usize {
        let before = self.recognizers.len();
        self.recognizers.retain(|r| r.name() != name);
        before - self.recognizers.len()
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Recognizers for `language`, optionally restricted to some entity types
    pub fn recognizers(
        &self,
        language: &str,
        entities: Option<&[String]>,
    ) -> Vec<Arc<dyn EntityRecognizer>> {
        self.recognizers
            .iter()
            .filter(|r| r.supported_language() == language)
            .filter(|r| match entities {
                Some(wanted) => r.supported_entities().iter().any(|e| wanted.contains(e)),
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn supports_language(&self, language: &str) -> bool {
        self.recognizers
            .iter()
            .any(|r| r.supported_language() == language)
    }

    /// Sorted, de-duplicated entity labels available for `language`
    pub fn supported_entities(&self, language: &str) -> Vec<String> {
        let mut entities: Vec<String> = self
            .recognizers
            .iter()
            .filter(|r| r.supported_language() == language)
            .flat_map(|r| r.supported_entities())
            .collect();
        entities.sort();
        entities.dedup();
        entities
    }

    /// Add pattern recognizers described in a TOML file
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, AnalyzerError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AnalyzerError::PatternFile(format!("{}: {}", path.as_ref().display(), e))
        })?;
        self.load_toml(&content)
    }

    /// Add pattern recognizers described in TOML content.
    ///
    /// ```toml
    /// [[recognizers]]
    /// entity = "IND_VOTER_ID"
    /// context = ["voter", "epic"]
    ///
    /// [[recognizers.patterns]]
    /// name = "EPIC"
    /// regex = '\b[A-Z]{3}\d{7}\b'
    /// score = 0.6
    /// ```
    pub fn load_toml(&mut self, content: &str) -> Result<usize, AnalyzerError> {
        let file: PatternFile =
            toml::from_str(content).map_err(|e| AnalyzerError::PatternFile(e.to_string()))?;

        let mut built = Vec::with_capacity(file.recognizers.len());
        for def in file.recognizers {
            if def.patterns.is_empty() {
                return Err(AnalyzerError::PatternFile(format!(
                    "recognizer for {} has no patterns",
                    def.entity
                )));
            }
            let patterns = def
                .patterns
                .iter()
                .map(|p| Pattern::new(&p.name, &p.regex, p.score))
                .collect::<Result<Vec<_>, _>>()?;

            let mut recognizer = PatternRecognizer::new(&def.entity, patterns)
                .with_language(&def.language)
                .with_context(&def.context);
            if let Some(name) = &def.name {
                recognizer = recognizer.with_name(name);
            }
            built.push(recognizer);
        }

        let count = built.len();
        for recognizer in built {
            self.add_recognizer(recognizer);
        }
        Ok(count)
    }
}
