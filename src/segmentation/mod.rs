//! Region segmentation for candidate text blocks
//!
//! Binarizes a page image, merges neighbouring strokes and reports the
//! bounding boxes of blobs large enough to hold printed text.

pub mod pipeline;
pub mod regions;
pub mod steps;

pub use pipeline::{Segmentation, Segmenter, SegmenterConfig, StepTiming};
pub use regions::{Region, RegionOrder};
