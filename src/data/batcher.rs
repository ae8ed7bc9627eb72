// ============================================================
// Layer 4: Image Batcher
// ============================================================
// Implements Burn's Batcher trait: turns a Vec<ImageItem>
// (paths + labels) into one batch of tensors.
//
//   Input:  N items
//   Output: images  [N, 3, size, size]  (normalised floats)
//           targets [N]                 (class indices)
//
// Each image is decoded, resized and normalised on the CPU and
// appended to one flat buffer, which is uploaded to the device
// in a single transfer and reshaped.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::image_folder::ImageItem;
use crate::data::transform::{preprocess, CHANNELS};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// shape: [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,

    /// shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    device: B::Device,

    /// Square side length images are resized to
    size: usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, size: usize) -> Self {
        Self { device, size }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let sample_len = CHANNELS * self.size * self.size;

        let mut pixels: Vec<f32> = Vec::with_capacity(batch_size * sample_len);
        let mut targets: Vec<i64> = Vec::with_capacity(batch_size);

        for item in items {
            // Every file was decoded once when the dataset was indexed,
            // so this only fails if a file changed during the run. The
            // Batcher trait cannot return an error; abort the run.
            let img = match image::open(&item.path) {
                Ok(img) => img,
                Err(e) => panic!("Cannot decode '{}' while batching: {}", item.path.display(), e),
            };
            pixels.extend(preprocess(&img, self.size));
            targets.push(item.label as i64);
        }

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, CHANNELS, self.size, self.size]);

        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_targets() {
        let dir = tempfile::tempdir().unwrap();
        let mut items = Vec::new();
        for (i, label) in [2usize, 0, 1].into_iter().enumerate() {
            let path = dir.path().join(format!("{i}.png"));
            RgbImage::from_pixel(6, 6, Rgb([0, 128, 255])).save(&path).unwrap();
            items.push(ImageItem { path, label });
        }

        let batcher = ImageBatcher::<TestBackend>::new(Default::default(), 8);
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![2, 0, 1]);
    }

    #[test]
    #[should_panic(expected = "Cannot decode")]
    fn test_undecodable_file_aborts_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        RgbImage::from_pixel(6, 6, Rgb([1, 2, 3])).save(&path).unwrap();
        std::fs::write(&path, b"replaced after indexing").unwrap();

        let batcher = ImageBatcher::<TestBackend>::new(Default::default(), 4);
        batcher.batch(vec![ImageItem { path, label: 0 }]);
    }
}
