use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Dilate a binary mask with a square `kernel_size` x `kernel_size` element.
///
/// An L-infinity radius of `kernel_size / 2` covers exactly the square, so a
/// kernel of 5 merges strokes that are up to four pixels apart.
pub fn apply(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    let radius = (kernel_size / 2).min(u8::MAX as u32) as u8;
    morphology::dilate(mask, Norm::LInf, radius)
}
