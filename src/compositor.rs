//! Mask binarisation and foreground-over-black compositing

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

/// Mask samples strictly above this value are kept
pub const MASK_THRESHOLD: u8 = 127;

/// Sample value marking a kept pixel in a binary mask
pub const KEEP: u8 = 255;

/// Sample value marking a dropped pixel in a binary mask
pub const DROP: u8 = 0;

/// Pure compositing transforms. Callers must check that image and mask sizes
/// match before calling [`MaskCompositor::composite`] or [`MaskCompositor::merge`].
pub struct MaskCompositor;

impl MaskCompositor {
    /// Threshold a mask into [`KEEP`] / [`DROP`] samples
    #[must_use]
    pub fn binarize(mask: &GrayImage) -> GrayImage {
        let mut binary = mask.clone();
        for sample in binary.iter_mut() {
            *sample = if *sample > MASK_THRESHOLD { KEEP } else { DROP };
        }
        binary
    }

    /// Keep image pixels where the binary mask is [`KEEP`], black elsewhere
    #[must_use]
    pub fn composite(image: &RgbImage, binary_mask: &GrayImage) -> RgbImage {
        debug_assert_eq!(image.dimensions(), binary_mask.dimensions());

        let mut result = RgbImage::new(image.width(), image.height());
        for ((out, src), keep) in result
            .pixels_mut()
            .zip(image.pixels())
            .zip(binary_mask.pixels())
        {
            if keep.0[0] == KEEP {
                *out = *src;
            }
        }
        result
    }

    /// Binarise `mask` and composite `image` over black in one step
    #[must_use]
    pub fn merge(image: &RgbImage, mask: &GrayImage) -> RgbImage {
        let binary = Self::binarize(mask);
        Self::composite(image, &binary)
    }
}

/// Statistics about a mask at the fixed threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
}

impl MaskStatistics {
    #[must_use]
    pub fn from_mask(mask: &GrayImage) -> Self {
        let total_pixels = mask.as_raw().len();
        let foreground_pixels = mask
            .pixels()
            .filter(|Luma([v])| *v > MASK_THRESHOLD)
            .count();
        let foreground_ratio = if total_pixels == 0 {
            0.0
        } else {
            foreground_pixels as f32 / total_pixels as f32
        };

        Self {
            total_pixels,
            foreground_pixels,
            background_pixels: total_pixels - foreground_pixels,
            foreground_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        let mut image = RgbImage::new(width, height);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let intensity = ((x * 31 + y * 17) % 256) as u8;
            *pixel = Rgb([intensity, 128, 255 - intensity]);
        }
        image
    }

    #[test]
    fn test_binarize_threshold_boundary() {
        let mask = GrayImage::from_raw(5, 1, vec![0, 126, 127, 128, 255]).unwrap();
        let binary = MaskCompositor::binarize(&mask);
        assert_eq!(binary.as_raw(), &vec![0, 0, 0, 255, 255]);
    }

    #[test]
    fn test_composite_keeps_or_blacks_out_every_pixel() {
        let image = gradient_image(16, 9);
        let mut mask = GrayImage::new(16, 9);
        for (x, y, sample) in mask.enumerate_pixels_mut() {
            *sample = Luma([((x * 16 + y * 3) % 256) as u8]);
        }

        let result = MaskCompositor::merge(&image, &mask);
        assert_eq!(result.dimensions(), image.dimensions());

        for (x, y, pixel) in result.enumerate_pixels() {
            if mask.get_pixel(x, y).0[0] > 127 {
                assert_eq!(pixel, image.get_pixel(x, y), "pixel ({x}, {y}) should be kept");
            } else {
                assert_eq!(pixel, &BLACK, "pixel ({x}, {y}) should be black");
            }
        }
    }

    #[test]
    fn test_merge_is_deterministic() {
        let image = gradient_image(7, 7);
        let mut mask = GrayImage::new(7, 7);
        mask.put_pixel(3, 3, Luma([200]));

        let first = MaskCompositor::merge(&image, &mask);
        let second = MaskCompositor::merge(&image, &mask);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_all_background_mask_yields_black_image() {
        let image = gradient_image(4, 4);
        let mask = GrayImage::from_pixel(4, 4, Luma([127]));
        let result = MaskCompositor::merge(&image, &mask);
        assert!(result.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_mask_statistics() {
        let mask = GrayImage::from_raw(4, 1, vec![0, 127, 128, 255]).unwrap();
        let stats = MaskStatistics::from_mask(&mask);
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.foreground_pixels, 2);
        assert_eq!(stats.background_pixels, 2);
        assert!((stats.foreground_ratio - 0.5).abs() < f32::EPSILON);

        let empty = MaskStatistics::from_mask(&GrayImage::new(0, 0));
        assert_eq!(empty.total_pixels, 0);
        assert!(empty.foreground_ratio.abs() < f32::EPSILON);
    }
}
