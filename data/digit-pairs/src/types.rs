use serde::{Deserialize, Serialize};

/// One stacked pair of digit images with the gold label for each half.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitPairItem {
    /// Flattened pixels of both digits, normalized to [0, 1].
    pub image: Vec<f32>,
    /// Class of the upper digit.
    pub upper: u8,
    /// Class of the lower digit.
    pub lower: u8,
}
