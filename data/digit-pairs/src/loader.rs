use std::fs;
use std::path::Path;

use rand::Rng;

use crate::types::DigitPairItem;

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

#[derive(Debug, Clone, Copy)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    fn file_names(&self) -> (&'static str, &'static str) {
        match self {
            Split::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            Split::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

/// Loads one MNIST split from IDX files and composes digit pairs out of it:
/// sample i stacks image 2i on top of image 2i+1, the upper label comes from
/// image 2i and the lower label from image 2i+1. An odd trailing image is left
/// unpaired.
pub fn load_split(dir: &Path, split: Split) -> anyhow::Result<Vec<DigitPairItem>> {
    let (images_file, labels_file) = split.file_names();
    let images = read_idx_images(&dir.join(images_file))?;
    let labels = read_idx_labels(&dir.join(labels_file))?;
    anyhow::ensure!(
        images.len() == labels.len(),
        "{images_file} holds {} images but {labels_file} holds {} labels",
        images.len(),
        labels.len()
    );

    let pairs = images.len() / 2;
    let mut items = Vec::with_capacity(pairs);
    for i in 0..pairs {
        let mut image = images[2 * i].clone();
        image.extend_from_slice(&images[2 * i + 1]);
        items.push(DigitPairItem {
            image,
            upper: labels[2 * i],
            lower: labels[2 * i + 1],
        });
    }
    Ok(items)
}

fn read_idx_images(path: &Path) -> anyhow::Result<Vec<Vec<f32>>> {
    let data = fs::read(path)?;
    let mut offset = 0;
    let magic = read_be_u32(&data, &mut offset)?;
    anyhow::ensure!(
        magic == IMAGES_MAGIC,
        "unexpected magic {magic} in {path:?}, want {IMAGES_MAGIC}"
    );
    let count = read_be_u32(&data, &mut offset)? as usize;
    let rows = read_be_u32(&data, &mut offset)? as usize;
    let cols = read_be_u32(&data, &mut offset)? as usize;
    let image_size = rows * cols;
    anyhow::ensure!(
        data.len() >= offset + count * image_size,
        "image file {path:?} is truncated"
    );

    let images = data[offset..offset + count * image_size]
        .chunks(image_size)
        .map(|pixels| pixels.iter().map(|p| *p as f32 / 255.0).collect())
        .collect();
    Ok(images)
}

fn read_idx_labels(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data = fs::read(path)?;
    let mut offset = 0;
    let magic = read_be_u32(&data, &mut offset)?;
    anyhow::ensure!(
        magic == LABELS_MAGIC,
        "unexpected magic {magic} in {path:?}, want {LABELS_MAGIC}"
    );
    let count = read_be_u32(&data, &mut offset)? as usize;
    anyhow::ensure!(
        data.len() >= offset + count,
        "label file {path:?} is truncated"
    );

    Ok(data[offset..offset + count].to_vec())
}

fn read_be_u32(data: &[u8], offset: &mut usize) -> anyhow::Result<u32> {
    let bytes: [u8; 4] = data
        .get(*offset..*offset + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| anyhow::Error::msg("idx header is shorter than 4 bytes"))?;
    *offset += 4;
    Ok(u32::from_be_bytes(bytes))
}

/// Random separable samples for smoke runs without the real dataset: each half
/// of the image is a scaled one-hot encoding of its head's label.
pub fn synthetic_split(count: usize, num_classes: usize) -> Vec<DigitPairItem> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let upper = rng.gen_range(0..num_classes) as u8;
            let lower = rng.gen_range(0..num_classes) as u8;
            let mut image = vec![0.0f32; 2 * num_classes];
            image[upper as usize] = 1.0;
            image[num_classes + lower as usize] = 1.0;
            DigitPairItem {
                image,
                upper,
                lower,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_idx_fixture(dir: &Path) {
        // Four 2x2 images with pixel values equal to the image index.
        let mut images = Vec::new();
        images.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
        images.extend_from_slice(&4u32.to_be_bytes());
        images.extend_from_slice(&2u32.to_be_bytes());
        images.extend_from_slice(&2u32.to_be_bytes());
        for i in 0..4u8 {
            images.extend_from_slice(&[i; 4]);
        }
        let mut labels = Vec::new();
        labels.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
        labels.extend_from_slice(&4u32.to_be_bytes());
        labels.extend_from_slice(&[7, 1, 3, 9]);

        fs::write(dir.join("train-images-idx3-ubyte"), images).unwrap();
        fs::write(dir.join("train-labels-idx1-ubyte"), labels).unwrap();
    }

    #[test]
    fn pairs_consecutive_images() {
        let dir = std::env::temp_dir().join("digit-pairs-idx-fixture");
        fs::create_dir_all(&dir).unwrap();
        write_idx_fixture(&dir);

        let items = load_split(&dir, Split::Train).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].upper, 7);
        assert_eq!(items[0].lower, 1);
        assert_eq!(items[1].upper, 3);
        assert_eq!(items[1].lower, 9);
        assert_eq!(items[0].image.len(), 8);
        assert_eq!(items[0].image[0], 0.0);
        assert!((items[0].image[4] - 1.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_wrong_magic() {
        let dir = std::env::temp_dir().join("digit-pairs-idx-bad-magic");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("train-images-idx3-ubyte"), 42u32.to_be_bytes()).unwrap();
        fs::write(dir.join("train-labels-idx1-ubyte"), b"").unwrap();

        assert!(load_split(&dir, Split::Train).is_err());
    }

    #[test]
    fn synthetic_samples_are_one_hot_per_head() {
        let items = synthetic_split(20, 10);

        assert_eq!(items.len(), 20);
        for item in items {
            assert_eq!(item.image.len(), 20);
            assert_eq!(item.image[item.upper as usize], 1.0);
            assert_eq!(item.image[10 + item.lower as usize], 1.0);
        }
    }
}
