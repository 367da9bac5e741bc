//! Model-free encoder for offline use.
//!
//! Text is a signed bag of hashed lowercase tokens; an image is a histogram
//! over 64 quantized colours, each colour hashed to one bucket. Output is
//! deterministic but text and image vectors share no semantics: this is for
//! exercising the pipeline, not for meaningful cross-modal ranking.

use crate::domain::error::DomainError;
use crate::domain::ports::encoder::Encoder;
use crate::domain::values::rgb_image::RgbImage;
use sha2::{Digest, Sha256};

const COLOUR_LEVELS: usize = 4;

pub struct HashingEncoder {
    dimension: usize,
    colour_buckets: Vec<usize>,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        let colour_buckets = (0..COLOUR_LEVELS.pow(3))
            .map(|bin| bucket(&format!("rgb:{bin}"), dimension).0)
            .collect();
        Self { dimension, colour_buckets }
    }

    fn encode_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let (idx, sign) = bucket(&format!("tok:{}", token.to_lowercase()), self.dimension);
            v[idx] += sign;
        }
        v
    }

    fn encode_image(&self, image: &RgbImage) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimension];
        let pixels = image.pixels().chunks_exact(3);
        let weight = 1.0 / pixels.len().max(1) as f32;
        for px in pixels {
            let q = |c: u8| c as usize * COLOUR_LEVELS / 256;
            let bin = (q(px[0]) * COLOUR_LEVELS + q(px[1])) * COLOUR_LEVELS + q(px[2]);
            v[self.colour_buckets[bin]] += weight;
        }
        v
    }
}

/// Bucket index and sign for a key.
fn bucket(key: &str, dimension: usize) -> (usize, f32) {
    let digest = Sha256::digest(key.as_bytes());
    let mut idx_bytes = [0u8; 8];
    idx_bytes.copy_from_slice(&digest[..8]);
    let idx = (u64::from_le_bytes(idx_bytes) % dimension as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
    (idx, sign)
}

#[async_trait::async_trait]
impl Encoder for HashingEncoder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.encode_text(text))
    }

    async fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>, DomainError> {
        Ok(self.encode_image(image))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_deterministic_and_case_insensitive() {
        let enc = HashingEncoder::new(64);
        assert_eq!(enc.encode_text("A cat"), enc.encode_text("a CAT"));
        assert_eq!(enc.encode_text("a cat").len(), 64);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let enc = HashingEncoder::new(16);
        assert!(enc.encode_text("  ,. ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_image_histogram_sums_to_one() {
        let enc = HashingEncoder::new(32);
        let img = RgbImage::filled(4, 4, [200, 10, 10]).unwrap();
        let v = enc.encode_image(&img);
        let total: f32 = v.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }
}
