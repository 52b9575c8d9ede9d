//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Better for noisy/messy images like phone photos,
//! and the only engine here that reads Spanish.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) automatically on first use.

use super::download::{cache_dir, ensure_downloaded};
use crate::config::Config;
use crate::engine::{OcrEngine, RecognizedText};
use crate::error::PipelineError;
use image::RgbImage;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// ISO 639-1 codes mapped to Tesseract language identifiers
const LANGUAGE_MAP: &[(&str, &str)] = &[
    ("en", "eng"),
    ("es", "spa"),
    ("de", "deu"),
    ("fr", "fra"),
    ("it", "ita"),
    ("pt", "por"),
    ("nl", "nld"),
    ("hi", "hin"),
];

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Languages with traineddata available, as ISO 639-1 codes
    languages: Vec<String>,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        let tessdata_dir = match &config.tessdata_path {
            Some(path) => PathBuf::from(path),
            None => cache_dir(Some("tessdata"))?,
        };

        let mut languages = Vec::new();
        for code in &config.languages {
            let Some(tess_lang) = tesseract_language(code) else {
                tracing::warn!("No Tesseract language for '{}', skipping", code);
                continue;
            };
            ensure_downloaded(
                &tessdata_url(tess_lang),
                &tessdata_dir,
                &format!("{}.traineddata", tess_lang),
            )?;
            languages.push(code.clone());
        }

        if languages.is_empty() {
            return Err(PipelineError::InitializationError(
                "No usable Tesseract languages configured".to_string(),
            ));
        }

        let tessdata_path = tessdata_dir
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PipelineError::InitializationError("Invalid tessdata path".to_string())
            })?;

        // Validate that tessdata is accessible by doing a test initialization
        let spec = language_spec(&languages);
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&spec)).map_err(|e| {
            PipelineError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, languages: {})",
            tessdata_path,
            spec
        );

        Ok(Self {
            tessdata_path,
            languages,
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - multi-language, better for noisy/messy images"
    }

    fn recognize(
        &self,
        crop: &RgbImage,
        languages: &[String],
    ) -> Result<Vec<RecognizedText>, PipelineError> {
        let (width, height) = crop.dimensions();

        let requested: Vec<String> = languages
            .iter()
            .filter(|l| self.languages.contains(l))
            .cloned()
            .collect();
        let spec = if requested.is_empty() {
            language_spec(&self.languages)
        } else {
            language_spec(&requested)
        };

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        crop.write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| {
                PipelineError::RecognitionFailure(format!("Failed to convert to BMP: {}", e))
            })?;

        tracing::trace!("Tesseract crop {}x{} ({})", width, height, spec);

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&spec)).map_err(|e| {
            PipelineError::RecognitionFailure(format!("Failed to create Tesseract: {}", e))
        })?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            PipelineError::RecognitionFailure(format!(
                "Failed to set image ({}x{}): {}",
                width, height, e
            ))
        })?;

        tess = tess.recognize().map_err(|e| {
            PipelineError::RecognitionFailure(format!("Failed to recognize text: {}", e))
        })?;

        let text = tess.get_text().map_err(|e| {
            PipelineError::RecognitionFailure(format!("Failed to get text: {}", e))
        })?;

        // Mean confidence is on a 0-100 scale and shared by every line of the crop
        let confidence = (tess.mean_text_conf() as f32 / 100.0).clamp(0.0, 1.0);

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| RecognizedText::new(line, confidence))
            .collect())
    }

    fn supported_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}

fn tesseract_language(code: &str) -> Option<&'static str> {
    LANGUAGE_MAP
        .iter()
        .find(|(iso, _)| *iso == code)
        .map(|(_, tess)| *tess)
}

/// Tesseract's multi-language syntax: "eng+spa"
fn language_spec(codes: &[String]) -> String {
    codes
        .iter()
        .filter_map(|c| tesseract_language(c))
        .collect::<Vec<_>>()
        .join("+")
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}
