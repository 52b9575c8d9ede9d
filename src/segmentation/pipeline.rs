use crate::error::PipelineError;
use image::DynamicImage;
use serde::Serialize;
use std::time::Instant;

use super::regions::{self, Region, RegionOrder};
use super::steps;

/// Segmentation parameters
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Side of the local neighbourhood used by adaptive thresholding (odd)
    pub block_size: u32,
    /// Constant subtracted from the local mean
    pub offset: f32,
    /// Side of the square dilation element
    pub kernel_size: u32,
    /// Boxes must be strictly wider than this
    pub min_width: u32,
    /// Boxes must be strictly taller than this
    pub min_height: u32,
    pub order: RegionOrder,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            block_size: 11,
            offset: 2.0,
            kernel_size: 5,
            min_width: 50,
            min_height: 20,
            order: RegionOrder::Discovery,
        }
    }
}

/// Timing information for a single segmentation step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Regions found in one image, with timing stats
#[derive(Debug, Clone, Serialize)]
pub struct Segmentation {
    pub regions: Vec<Region>,
    /// Contours found before the size filter
    pub candidates: usize,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Finds candidate text blocks in a decoded image
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self, PipelineError> {
        if config.block_size < 3 || config.block_size % 2 == 0 {
            return Err(PipelineError::InitializationError(format!(
                "Threshold block size must be odd and at least 3, got {}",
                config.block_size
            )));
        }
        if config.kernel_size == 0 {
            return Err(PipelineError::InitializationError(
                "Dilation kernel size must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Segment an image into text-sized regions
    pub fn segment(&self, image: &DynamicImage) -> Segmentation {
        let start = Instant::now();
        let mut timings = Vec::new();

        let gray = run_step("grayscale", &mut timings, || steps::grayscale::apply(image));
        let mask = run_step("threshold", &mut timings, || {
            steps::threshold::apply(&gray, self.config.block_size, self.config.offset)
        });
        let dilated = run_step("dilate", &mut timings, || {
            steps::dilate::apply(&mask, self.config.kernel_size)
        });
        let boxes = run_step("contours", &mut timings, || regions::external_boxes(&dilated));

        let candidates = boxes.len();
        let mut accepted: Vec<Region> = boxes
            .into_iter()
            .filter(|r| r.is_text_sized(self.config.min_width, self.config.min_height))
            .collect();
        self.config.order.apply(&mut accepted);

        tracing::debug!(
            "Segmented {}x{} image: {} of {} contours kept ({} order)",
            image.width(),
            image.height(),
            accepted.len(),
            candidates,
            self.config.order.as_str()
        );

        Segmentation {
            regions: accepted,
            candidates,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        }
    }
}

fn run_step<T, F>(name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> T
where
    F: FnOnce() -> T,
{
    let step_start = Instant::now();
    let result = step_fn();
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    result
}
