//! End-to-end document processing
//!
//! image -> segmentation -> per-region recognition -> assembly -> PII
//! analysis -> record. Batches run each image in its own blocking task so a
//! failure, panic or timeout in one image never affects the others.

use crate::aggregator::{self, BatchOutcome, ConfidencePolicy, DocumentRecord};
use crate::assembler;
use crate::config::Config;
use crate::engine::OcrEngine;
use crate::engines::EngineRegistry;
use crate::error::PipelineError;
use crate::pii::{AnalyzerEngine, DEFAULT_LANGUAGE};
use crate::recognition::{self, DEFAULT_MIN_CONFIDENCE};
use crate::segmentation::{Segmenter, SegmenterConfig};
use crate::source::ImageSource;
use futures::stream::{self, StreamExt};
use image::{DynamicImage, RgbImage};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Languages read by default: English and Spanish
pub const DEFAULT_RECOGNITION_LANGUAGES: &[&str] = &["en", "es"];

/// Tunables for one pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Languages passed to the text recognition engine (ISO 639-1)
    pub languages: Vec<String>,
    /// Language the PII analyzer runs with
    pub analysis_language: String,
    pub min_fragment_confidence: f32,
    pub policy: ConfidencePolicy,
    pub segmenter: SegmenterConfig,
    pub image_timeout: Duration,
    pub max_concurrent_images: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            languages: DEFAULT_RECOGNITION_LANGUAGES
                .iter()
                .map(|l| l.to_string())
                .collect(),
            analysis_language: DEFAULT_LANGUAGE.to_string(),
            min_fragment_confidence: DEFAULT_MIN_CONFIDENCE,
            policy: ConfidencePolicy::default(),
            segmenter: SegmenterConfig::default(),
            image_timeout: Duration::from_secs(120),
            max_concurrent_images: 1,
        }
    }
}

pub struct Pipeline {
    engine: Arc<dyn OcrEngine>,
    analyzer: Arc<AnalyzerEngine>,
    segmenter: Segmenter,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        analyzer: Arc<AnalyzerEngine>,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        if !analyzer.registry().supports_language(&settings.analysis_language) {
            return Err(PipelineError::InitializationError(format!(
                "No PII recognizers registered for language '{}'",
                settings.analysis_language
            )));
        }
        let segmenter = Segmenter::new(settings.segmenter.clone())?;

        Ok(Self {
            engine,
            analyzer,
            segmenter,
            settings,
        })
    }

    /// Pipeline using the registry's default engine, the default recognizers
    /// and any extra patterns named in `config`
    pub fn from_config(config: &Config, engines: &EngineRegistry) -> Result<Self, PipelineError> {
        let engine = engines.default_engine().ok_or_else(|| {
            PipelineError::InitializationError("No default OCR engine".to_string())
        })?;

        let mut analyzer = AnalyzerEngine::with_defaults()?;
        if let Some(path) = &config.patterns_file {
            let added = analyzer.registry_mut().load_file(path)?;
            tracing::info!("Loaded {} recognizers from {}", added, path.display());
        }

        Self::new(engine, Arc::new(analyzer), PipelineSettings::from(config))
    }

    pub fn engine(&self) -> &dyn OcrEngine {
        self.engine.as_ref()
    }

    pub fn analyzer(&self) -> &AnalyzerEngine {
        &self.analyzer
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run every stage over one decoded image
    pub fn process_image(
        &self,
        image_name: &str,
        image: &DynamicImage,
    ) -> Result<DocumentRecord, PipelineError> {
        let start = Instant::now();

        let segmentation = self.segmenter.segment(image);
        let rgb: Cow<'_, RgbImage> = match image {
            DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
            other => Cow::Owned(other.to_rgb8()),
        };

        let fragments = recognition::recognize_regions(
            self.engine.as_ref(),
            &rgb,
            &segmentation.regions,
            &self.settings.languages,
            self.settings.min_fragment_confidence,
        )?;
        let text = assembler::assemble(&fragments);
        tracing::debug!("{} text: {:?}", image_name, text.as_str());

        let entities = self
            .analyzer
            .analyze(text.as_str(), &self.settings.analysis_language, None)?;
        let record = aggregator::aggregate(image_name, &text, entities, &self.settings.policy);

        tracing::info!(
            "Processed {} in {}ms: {} regions, {} fragments, {} entities",
            image_name,
            start.elapsed().as_millis(),
            segmentation.regions.len(),
            fragments.len(),
            record.entities.len()
        );

        Ok(record)
    }

    /// Load an image from `source` and process it
    pub fn process_source(
        &self,
        source: &dyn ImageSource,
    ) -> Result<DocumentRecord, PipelineError> {
        let image = source.load()?;
        self.process_image(source.name(), &image)
    }

    /// Process a batch of images.
    ///
    /// Up to `max_concurrent_images` images are in flight at once; records and
    /// failures come back in input order.
    pub async fn process_batch(
        self: &Arc<Self>,
        sources: Vec<Box<dyn ImageSource>>,
    ) -> BatchOutcome {
        let start = Instant::now();
        let total = sources.len();
        let limit = self.settings.max_concurrent_images.max(1);

        let jobs: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let pipeline = Arc::clone(self);
                async move {
                    let name = source.name().to_string();
                    let result = pipeline.run_isolated(source).await;
                    (name, result)
                }
            })
            .collect();

        let results: Vec<(String, Result<DocumentRecord, PipelineError>)> =
            stream::iter(jobs).buffered(limit).collect().await;

        let mut outcome = BatchOutcome::default();
        for (name, result) in results {
            outcome.push(&name, result);
        }

        tracing::info!(
            "Batch of {} images finished in {}ms: {} records, {} failures",
            total,
            start.elapsed().as_millis(),
            outcome.records.len(),
            outcome.errors.len()
        );

        outcome
    }

    async fn run_isolated(
        self: &Arc<Self>,
        source: Box<dyn ImageSource>,
    ) -> Result<DocumentRecord, PipelineError> {
        let pipeline = Arc::clone(self);
        let timeout = self.settings.image_timeout;
        let task = tokio::task::spawn_blocking(move || pipeline.process_source(source.as_ref()));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::RecognitionFailure(format!(
                "Image worker failed: {}",
                e
            ))),
            Err(_) => Err(PipelineError::Timeout(timeout.as_millis() as u64)),
        }
    }
}
