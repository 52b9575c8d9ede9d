//! Text recognition engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

mod download;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::PipelineError;
use serde::Serialize;
use std::sync::Arc;

/// Information about an available engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub supported_languages: Vec<String>,
}

/// Registry of available OCR engines
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Create a new engine registry with all available engines initialized
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        #[allow(unused_mut)]
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        Self::from_engines(engines, config.engine.as_deref())
    }

    /// Build a registry from already constructed engines.
    /// `preferred` selects the default engine; otherwise the first one wins.
    pub fn from_engines(
        engines: Vec<Arc<dyn OcrEngine>>,
        preferred: Option<&str>,
    ) -> Result<Self, PipelineError> {
        if engines.is_empty() {
            return Err(PipelineError::InitializationError(
                "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string()
            ));
        }

        let default_engine = match preferred {
            Some(name) => engines
                .iter()
                .find(|e| e.name() == name)
                .map(|e| e.name().to_string())
                .ok_or_else(|| {
                    PipelineError::InitializationError(format!(
                        "Engine '{}' is not available (compiled engines: {})",
                        name,
                        engines.iter().map(|e| e.name()).collect::<Vec<_>>().join(", ")
                    ))
                })?,
            None => engines[0].name().to_string(),
        };

        Ok(Self {
            engines,
            default_engine,
        })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Get the default engine
    pub fn default_engine(&self) -> Option<Arc<dyn OcrEngine>> {
        self.get(&self.default_engine)
    }

    /// Get the default engine name
    pub fn default_name(&self) -> &str {
        &self.default_engine
    }

    /// Get info about all available engines
    pub fn info(&self) -> Vec<EngineInfo> {
        self.engines
            .iter()
            .map(|e| EngineInfo {
                name: e.name(),
                description: e.description(),
                supported_languages: e.supported_languages(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecognizedText;
    use image::RgbImage;

    struct NamedEngine(&'static str);

    impl OcrEngine for NamedEngine {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "test engine"
        }

        fn recognize(
            &self,
            _crop: &RgbImage,
            _languages: &[String],
        ) -> Result<Vec<RecognizedText>, PipelineError> {
            Ok(Vec::new())
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["en".to_string()]
        }
    }

    fn engines() -> Vec<Arc<dyn OcrEngine>> {
        vec![Arc::new(NamedEngine("first")), Arc::new(NamedEngine("second"))]
    }

    #[test]
    fn test_first_engine_is_default() {
        let registry = EngineRegistry::from_engines(engines(), None).unwrap();
        assert_eq!(registry.default_name(), "first");
        assert_eq!(registry.info().len(), 2);
    }

    #[test]
    fn test_preferred_engine_is_selected() {
        let registry = EngineRegistry::from_engines(engines(), Some("second")).unwrap();
        assert_eq!(registry.default_engine().unwrap().name(), "second");
    }

    #[test]
    fn test_unknown_preferred_engine_fails() {
        assert!(EngineRegistry::from_engines(engines(), Some("missing")).is_err());
        assert!(EngineRegistry::from_engines(Vec::new(), None).is_err());
    }
}
