use crate::domain::error::DomainError;
use crate::domain::ports::encoder::Encoder;
use crate::domain::values::embedding::{EmbeddingNormalizer, EmbeddingVector};
use crate::domain::values::rgb_image::RgbImage;
use std::sync::Arc;

/// Encoder plus one normalizer per modality. Built once at startup and shared;
/// holds no mutable state.
pub struct Embedder {
    encoder: Arc<dyn Encoder>,
    text: EmbeddingNormalizer,
    image: EmbeddingNormalizer,
}

impl Embedder {
    /// Fails if the encoder's width differs from the collection's.
    pub fn new(encoder: Arc<dyn Encoder>, dimension: usize) -> Result<Self, DomainError> {
        if encoder.dimension() != dimension {
            return Err(DomainError::DimensionMismatch {
                expected: dimension,
                actual: encoder.dimension(),
            });
        }
        Ok(Self {
            encoder,
            text: EmbeddingNormalizer::new(dimension),
            image: EmbeddingNormalizer::new(dimension),
        })
    }

    pub fn dimension(&self) -> usize {
        self.text.dimension()
    }

    pub async fn embed_text(&self, text: &str) -> Result<EmbeddingVector, DomainError> {
        let raw = self.encoder.embed_text(text).await?;
        self.text.normalize(&raw)
    }

    pub async fn embed_image(&self, image: &RgbImage) -> Result<EmbeddingVector, DomainError> {
        let raw = self.encoder.embed_image(image).await?;
        self.image.normalize(&raw)
    }
}
