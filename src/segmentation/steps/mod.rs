//! Individual mask-building steps

pub mod dilate;
pub mod grayscale;
pub mod threshold;
