use crate::error::PipelineError;
use image::RgbImage;

/// A piece of text recognized inside one image crop
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Trait that all text recognition engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize the text in an image crop.
    ///
    /// `languages` holds ISO 639-1 codes ("en", "es"); engines map them to
    /// their own identifiers and ignore the ones they cannot handle.
    fn recognize(
        &self,
        crop: &RgbImage,
        languages: &[String],
    ) -> Result<Vec<RecognizedText>, PipelineError>;

    /// Get supported languages as ISO 639-1 codes
    fn supported_languages(&self) -> Vec<String>;
}
