use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{backend::Backend, Data, Int, Shape, Tensor},
};

mod loader;
mod types;
pub use loader::{load_split, synthetic_split, Split};
pub use types::DigitPairItem;

pub struct DigitPairsBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> DigitPairsBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<DigitPairItem, DigitBatch<B>> for DigitPairsBatcher<B> {
    fn batch(&self, items: Vec<DigitPairItem>) -> DigitBatch<B> {
        let count = items.len();
        let num_features = items.first().map(|item| item.image.len()).unwrap_or(0);

        let mut pixels = Vec::with_capacity(count * num_features);
        let mut upper = Vec::with_capacity(count);
        let mut lower = Vec::with_capacity(count);
        for item in items {
            pixels.extend_from_slice(&item.image);
            upper.push(item.upper as i64);
            lower.push(item.lower as i64);
        }

        let images = Tensor::from_data_device(
            Data::new(pixels, Shape::new([count, num_features])).convert(),
            &self.device,
        );
        let labels_upper = Tensor::from_data_device(
            Data::new(upper, Shape::new([count])).convert(),
            &self.device,
        );
        let labels_lower = Tensor::from_data_device(
            Data::new(lower, Shape::new([count])).convert(),
            &self.device,
        );
        tracing::info!(
            "built batch of {:?} images and {:?} label pairs",
            images.shape(),
            labels_upper.shape()
        );

        DigitBatch {
            images,
            labels_upper,
            labels_lower,
        }
    }
}

/// Groups samples into batches of exactly `batch_size`, in original order.
/// The trailing `len % batch_size` samples are dropped, never padded.
pub fn batch_split<B: Backend>(
    batcher: &DigitPairsBatcher<B>,
    items: &[DigitPairItem],
    batch_size: usize,
) -> Vec<DigitBatch<B>> {
    let full = items.len() / batch_size * batch_size;
    items[..full]
        .chunks(batch_size)
        .map(|chunk| batcher.batch(chunk.to_vec()))
        .collect()
}

/// Zips an input array and two parallel label arrays into samples. The label
/// arrays must be exactly as long as the input array; this is not checked.
pub fn from_parallel_arrays(
    images: Vec<Vec<f32>>,
    upper: &[u8],
    lower: &[u8],
) -> Vec<DigitPairItem> {
    images
        .into_iter()
        .zip(upper.iter().copied())
        .zip(lower.iter().copied())
        .map(|((image, upper), lower)| DigitPairItem {
            image,
            upper,
            lower,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    pub images: Tensor<B, 2>,
    pub labels_upper: Tensor<B, 1, Int>,
    pub labels_lower: Tensor<B, 1, Int>,
}
