use image::{GrayImage, Luma};

/// Adaptive Gaussian thresholding with an inverted output.
///
/// Each pixel is compared against the Gaussian-weighted mean of its
/// `block_size` x `block_size` neighbourhood. Pixels darker than
/// `mean - offset` become foreground (255), everything else background (0),
/// so dark strokes on a light page end up white in the mask. The mean is
/// kept in `f32` and rounded once before the comparison.
pub fn apply(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let kernel = gaussian_kernel(block_size);
    let local_mean = gaussian_mean(gray, &kernel);

    GrayImage::from_fn(width, height, |x, y| {
        let pixel = gray.get_pixel(x, y).0[0] as f32;
        let mean = local_mean[(y * width + x) as usize].round();
        if pixel <= mean - offset {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Separable Gaussian blur in `f32`, replicating edge pixels
fn gaussian_mean(gray: &GrayImage, kernel: &[f32]) -> Vec<f32> {
    let (width, height) = (gray.width() as i64, gray.height() as i64);
    let radius = (kernel.len() / 2) as i64;
    let at = |x: i64, y: i64| (y * width + x) as usize;

    let source: Vec<f32> = gray.as_raw().iter().map(|&p| p as f32).collect();

    let mut horizontal = vec![0.0f32; source.len()];
    for y in 0..height {
        for x in 0..width {
            horizontal[at(x, y)] = kernel
                .iter()
                .enumerate()
                .map(|(i, w)| w * source[at((x + i as i64 - radius).clamp(0, width - 1), y)])
                .sum();
        }
    }

    let mut blurred = vec![0.0f32; source.len()];
    for y in 0..height {
        for x in 0..width {
            blurred[at(x, y)] = kernel
                .iter()
                .enumerate()
                .map(|(i, w)| w * horizontal[at(x, (y + i as i64 - radius).clamp(0, height - 1))])
                .sum();
        }
    }

    blurred
}

/// Normalized 1-D Gaussian kernel of odd length `size`.
///
/// Sigma is derived from the window size the same way common vision
/// libraries do when no explicit sigma is given: 0.3 * ((size - 1) / 2 - 1) + 0.8
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f32 - 1.0) / 2.0;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();

    weights.into_iter().map(|w| w / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_output_is_binary() {
        let img = GrayImage::from_fn(50, 50, |x, y| Luma([((x * 5 + y * 3) % 256) as u8]));

        let mask = apply(&img, 11, 2.0);

        for pixel in mask.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_dark_strokes_become_foreground() {
        // Dark text line on light background
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }

        let mask = apply(&img, 11, 2.0);

        // Stroke pixels are foreground (inverted)
        assert_eq!(mask.get_pixel(25, 10).0[0], 255);
        // Background stays empty
        assert_eq!(mask.get_pixel(25, 2).0[0], 0);
    }

    #[test]
    fn test_pixel_exactly_offset_below_mean_is_foreground() {
        let mut img = GrayImage::from_pixel(21, 21, Luma([128]));
        img.put_pixel(10, 10, Luma([126]));
        let mask = apply(&img, 11, 2.0);
        assert_eq!(mask.get_pixel(10, 10).0[0], 255);

        img.put_pixel(10, 10, Luma([127]));
        let mask = apply(&img, 11, 2.0);
        assert_eq!(mask.get_pixel(10, 10).0[0], 0);
    }

    #[test]
    fn test_gaussian_mean_keeps_fractions() {
        let mut img = GrayImage::from_pixel(21, 21, Luma([128]));
        img.put_pixel(10, 10, Luma([126]));
        let mean = gaussian_mean(&img, &gaussian_kernel(11));
        let center = mean[10 * 21 + 10];
        assert!(center > 127.5 && center < 128.0, "mean was {}", center);
    }

    #[test]
    fn test_uniform_image_has_no_foreground() {
        let img = GrayImage::from_pixel(40, 40, Luma([128]));
        let mask = apply(&img, 11, 2.0);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(11);
        assert_eq!(kernel.len(), 11);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[10]).abs() < 1e-6);
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn test_empty_image() {
        let img = GrayImage::new(0, 0);
        assert_eq!(apply(&img, 11, 2.0).dimensions(), (0, 0));
    }
}
