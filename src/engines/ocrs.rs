//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use super::download::{cache_dir, ensure_downloaded};
use crate::config::Config;
use crate::engine::{OcrEngine, RecognizedText};
use crate::error::PipelineError;
use image::RgbImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Create a new engine, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, PipelineError> {
        tracing::info!("Initializing ocrs OCR engine...");

        let models_dir = cache_dir(Some("models"))?;
        let detection_model_path =
            ensure_downloaded(DETECTION_MODEL_URL, &models_dir, "text-detection.rten")?;
        let recognition_model_path =
            ensure_downloaded(RECOGNITION_MODEL_URL, &models_dir, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            PipelineError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            PipelineError::InitializationError(format!(
                "Failed to load recognition model: {}",
                e
            ))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            PipelineError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn recognize(
        &self,
        crop: &RgbImage,
        _languages: &[String],
    ) -> Result<Vec<RecognizedText>, PipelineError> {
        // ocrs reads the Latin alphabet only, so the language hint is ignored
        let img_source = ImageSource::from_bytes(crop.as_raw(), crop.dimensions()).map_err(|e| {
            PipelineError::RecognitionFailure(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self.engine.prepare_input(img_source).map_err(|e| {
            PipelineError::RecognitionFailure(format!("Failed to prepare input: {}", e))
        })?;

        let word_rects = self.engine.detect_words(&ocr_input).map_err(|e| {
            PipelineError::RecognitionFailure(format!("Failed to detect words: {}", e))
        })?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| {
                PipelineError::RecognitionFailure(format!("Failed to recognize text: {}", e))
            })?;

        // One fragment per recognized line
        let fragments = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.trim().is_empty())
            .map(|text| {
                let confidence = calculate_confidence(&text);
                RecognizedText { text, confidence }
            })
            .collect();

        Ok(fragments)
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["en".to_string()]
    }
}

// ============================================================================
// Confidence scoring heuristics
// ============================================================================

/// Calculate confidence score based on text quality heuristics.
///
/// ocrs doesn't report per-line scores, so the recognized text is analyzed
/// for patterns that indicate OCR quality.
fn calculate_confidence(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    if text.len() < 5 {
        return 0.5; // Too short to judge accurately
    }

    let char_score = analyze_char_frequency(text);
    let word_score = analyze_word_lengths(text);
    let whitespace_score = analyze_whitespace(text);
    let repetition_score = detect_repetition(text);

    let confidence =
        0.40 * char_score + 0.30 * word_score + 0.15 * whitespace_score + 0.15 * repetition_score;

    confidence.clamp(0.0, 1.0)
}

/// Analyze character frequency for signs of garbled OCR.
///
/// Penalizes text with too many special/control characters. Digits count as
/// content here since identity numbers are what the pipeline looks for.
fn analyze_char_frequency(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let content = text.chars().filter(|c| c.is_alphanumeric()).count();
    let special = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
        .count();

    let special_ratio = special as f32 / total as f32;
    let special_penalty = 1.0 - (special_ratio * 10.0).min(1.0);

    let content_ratio = content as f32 / total as f32;
    let content_score = (content_ratio * 1.5).min(1.0);

    special_penalty * 0.6 + content_score * 0.4
}

/// Analyze word length distribution.
///
/// Garbled OCR often produces single-character "words" or very long sequences.
fn analyze_word_lengths(text: &str) -> f32 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.5;
    }

    let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
    let avg_len = total_len as f32 / words.len() as f32;

    let avg_score = match avg_len as usize {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=13 => 0.8,
        _ => 0.4,
    };

    let single_count = words.iter().filter(|w| w.chars().count() == 1).count();
    let single_ratio = single_count as f32 / words.len() as f32;
    let single_penalty = 1.0 - (single_ratio * 1.5).min(0.5);

    avg_score * single_penalty
}

/// Analyze whitespace ratio.
///
/// Normal text has ~10-25% whitespace. Too dense or too sparse indicates issues.
fn analyze_whitespace(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let whitespace = text.chars().filter(|c| c.is_whitespace()).count();
    let ratio = (whitespace as f32 / total as f32) * 100.0;

    match ratio as usize {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

/// Detect repeated character sequences.
///
/// Patterns like "aaaa" or "####" often indicate OCR confusion.
fn detect_repetition(text: &str) -> f32 {
    let mut max_repeat = 1;
    let mut current = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev && !c.is_whitespace() && !c.is_ascii_digit() {
            current += 1;
            max_repeat = max_repeat.max(current);
        } else {
            current = 1;
        }
        prev = Some(c);
    }

    match max_repeat {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_returns_zero() {
        assert_eq!(calculate_confidence(""), 0.0);
    }

    #[test]
    fn test_short_text_returns_half() {
        assert_eq!(calculate_confidence("Hi"), 0.5);
        assert_eq!(calculate_confidence("Name"), 0.5);
    }

    #[test]
    fn test_identity_card_line_passes_fragment_filter() {
        let confidence = calculate_confidence("Aadhaar No 1234 5678 9012");
        assert!(confidence > 0.7, "Expected > 0.7, got {}", confidence);
    }

    #[test]
    fn test_garbled_text_low_confidence() {
        let confidence = calculate_confidence("§±®©¥€£¢¤");
        assert!(confidence < 0.5, "Expected < 0.5, got {}", confidence);
    }

    #[test]
    fn test_repeated_chars_lower_confidence() {
        let confidence = calculate_confidence("Hello aaaaaaaaaaaa World");
        assert!(confidence < 0.9, "Expected < 0.9, got {}", confidence);
    }

    #[test]
    fn test_repeated_digits_not_penalized() {
        assert_eq!(detect_repetition("PIN 560001"), 1.0);
        assert_eq!(detect_repetition("Phone 9999999999"), 1.0);
    }

    #[test]
    fn test_single_char_words_lower_confidence() {
        let confidence = calculate_confidence("a b c d e f g h i j k l m n o p");
        assert!(confidence < 0.7, "Expected < 0.7, got {}", confidence);
    }

    #[test]
    fn test_normal_sentence_good_confidence() {
        let confidence = calculate_confidence("The quick brown fox jumps over the lazy dog.");
        assert!(confidence > 0.75, "Expected > 0.75, got {}", confidence);
    }

    #[test]
    fn test_analyze_char_frequency_counts_digits() {
        let score = analyze_char_frequency("9812345670");
        assert!(score > 0.9, "Expected > 0.9, got {}", score);
    }

    #[test]
    fn test_analyze_whitespace_normal() {
        let score = analyze_whitespace("Hello World Test String");
        assert!(score > 0.7, "Expected > 0.7, got {}", score);
    }
}
