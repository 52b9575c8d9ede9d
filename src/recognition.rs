//! Region-level text recognition
//!
//! Crops each segmented region out of the page, hands it to the configured
//! [`OcrEngine`] and keeps only fragments the engine is reasonably sure of.

use crate::engine::OcrEngine;
use crate::error::PipelineError;
use crate::segmentation::Region;
use image::{imageops, RgbImage};
use serde::Serialize;

/// Fragments at or below this confidence are discarded
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;

/// Text recognized inside one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    pub region: Region,
    pub text: String,
    pub confidence: f32,
}

/// Recognize text in a single region of `image`.
///
/// Regions falling outside the image, or clamped down to nothing, yield no
/// fragments and never reach the engine.
pub fn recognize_region(
    engine: &dyn OcrEngine,
    image: &RgbImage,
    region: Region,
    languages: &[String],
    min_confidence: f32,
) -> Result<Vec<TextFragment>, PipelineError> {
    let Some(bounds) = region.clamp_to(image.width(), image.height()) else {
        tracing::debug!("Skipping degenerate region {:?}", region);
        return Ok(Vec::new());
    };

    let crop = imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height).to_image();
    let recognized = engine.recognize(&crop, languages)?;

    let total = recognized.len();
    let fragments: Vec<TextFragment> = recognized
        .into_iter()
        .filter(|r| r.confidence > min_confidence)
        .map(|r| TextFragment {
            region,
            text: r.text,
            confidence: r.confidence,
        })
        .collect();

    if fragments.len() < total {
        tracing::trace!(
            "Dropped {} low-confidence fragments in region {:?}",
            total - fragments.len(),
            region
        );
    }

    Ok(fragments)
}

/// Recognize all regions in order, concatenating their fragments
pub fn recognize_regions(
    engine: &dyn OcrEngine,
    image: &RgbImage,
    regions: &[Region],
    languages: &[String],
    min_confidence: f32,
) -> Result<Vec<TextFragment>, PipelineError> {
    let mut fragments = Vec::new();
    for region in regions {
        fragments.extend(recognize_region(
            engine,
            image,
            *region,
            languages,
            min_confidence,
        )?);
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecognizedText;
    use std::sync::Mutex;

    /// Returns canned results and records the crop sizes it was given
    struct ScriptedEngine {
        results: Vec<RecognizedText>,
        crops: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedEngine {
        fn new(results: Vec<RecognizedText>) -> Self {
            Self {
                results,
                crops: Mutex::new(Vec::new()),
            }
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn description(&self) -> &'static str {
            "returns canned text"
        }

        fn recognize(
            &self,
            crop: &RgbImage,
            _languages: &[String],
        ) -> Result<Vec<RecognizedText>, PipelineError> {
            self.crops.lock().unwrap().push(crop.dimensions());
            Ok(self.results.clone())
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["en".to_string()]
        }
    }

    fn languages() -> Vec<String> {
        vec!["en".to_string(), "es".to_string()]
    }

    #[test]
    fn test_low_confidence_fragments_are_dropped() {
        let engine = ScriptedEngine::new(vec![
            RecognizedText::new("kept", 0.9),
            RecognizedText::new("boundary", 0.25),
            RecognizedText::new("noise", 0.1),
        ]);
        let image = RgbImage::new(200, 100);

        let fragments = recognize_region(
            &engine,
            &image,
            Region::new(10, 10, 80, 30),
            &languages(),
            DEFAULT_MIN_CONFIDENCE,
        )
        .unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "kept");
        assert_eq!(fragments[0].region, Region::new(10, 10, 80, 30));
    }

    #[test]
    fn test_crop_matches_region() {
        let engine = ScriptedEngine::new(Vec::new());
        let image = RgbImage::new(200, 100);

        recognize_region(&engine, &image, Region::new(150, 60, 80, 30), &languages(), 0.25)
            .unwrap();

        // Clamped at the right edge
        assert_eq!(*engine.crops.lock().unwrap(), vec![(50, 30)]);
    }

    #[test]
    fn test_degenerate_region_never_reaches_engine() {
        let engine = ScriptedEngine::new(vec![RecognizedText::new("ghost", 0.99)]);
        let image = RgbImage::new(100, 100);

        let fragments =
            recognize_region(&engine, &image, Region::new(120, 0, 60, 30), &languages(), 0.25)
                .unwrap();

        assert!(fragments.is_empty());
        assert!(engine.crops.lock().unwrap().is_empty());
    }

    #[test]
    fn test_regions_are_recognized_in_order() {
        let engine = ScriptedEngine::new(vec![RecognizedText::new("text", 0.8)]);
        let image = RgbImage::new(300, 300);
        let regions = vec![Region::new(0, 200, 60, 25), Region::new(0, 0, 100, 40)];

        let fragments = recognize_regions(&engine, &image, &regions, &languages(), 0.25).unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].region, regions[0]);
        assert_eq!(fragments[1].region, regions[1]);
        assert_eq!(*engine.crops.lock().unwrap(), vec![(60, 25), (100, 40)]);
    }
}
