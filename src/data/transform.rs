// ============================================================
// Layer 4: Image Preprocessing
// ============================================================
// The same transform is applied to train and validation images
// (no augmentation):
//
//   1. resize to size x size (bilinear / triangle filter)
//   2. HWC u8 -> CHW f32 in [0, 1]
//   3. per-channel (x - mean) / std with ImageNet statistics
//
// The result is a flat Vec<f32> of length 3 * size * size in
// channel-major order, ready to be appended to a batch buffer.

use image::{imageops::FilterType, DynamicImage};

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub const CHANNELS: usize = 3;

/// Resize and normalise one image into a CHW float buffer.
pub fn preprocess(img: &DynamicImage, size: usize) -> Vec<f32> {
    let rgb = img
        .resize_exact(size as u32, size as u32, FilterType::Triangle)
        .to_rgb8();

    let plane = size * size;
    let mut out = vec![0.0f32; CHANNELS * plane];

    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..CHANNELS {
            let v = pixel[c] as f32 / 255.0;
            out[c * plane + i] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_output_length_and_layout() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 6, Rgb([255, 0, 0])));
        let out = preprocess(&img, 4);
        assert_eq!(out.len(), 3 * 4 * 4);

        // channel 0 is red everywhere, channel 1 is zero everywhere
        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!(out[..16].iter().all(|v| (v - red).abs() < 0.05));
        assert!(out[16..32].iter().all(|v| (v - green).abs() < 0.05));
    }

    #[test]
    fn test_grayscale_input_is_expanded_to_rgb() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(3, 3, image::Luma([0])));
        let out = preprocess(&img, 2);
        assert_eq!(out.len(), 12);
        let blue = (0.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!((out[8] - blue).abs() < 1e-5);
    }
}
