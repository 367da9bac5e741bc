use crate::domain::error::DomainError;
use crate::domain::values::rgb_image::RgbImage;

/// Black-box dual encoder: raw (unnormalized) feature vectors for text and images.
///
/// Implementations must be deterministic for identical input and return
/// `dimension()` components for both modalities, since both land in one space.
#[async_trait::async_trait]
pub trait Encoder: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError>;
    async fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>, DomainError>;
    fn dimension(&self) -> usize;
}
