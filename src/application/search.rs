use crate::application::embedder::Embedder;
use crate::application::repository::VectorRepository;
use crate::domain::entities::record::ScoredRecord;
use crate::domain::error::DomainError;
use crate::domain::values::embedding::EmbeddingVector;
use crate::domain::values::limit::SearchLimit;
use crate::domain::values::metadata::Metadata;
use crate::domain::values::modality::Modality;
use crate::domain::values::rgb_image::RgbImage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// What a caller sees of a matched record.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub modality: Modality,
    pub payload: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub score: f64,
}

impl From<ScoredRecord> for SearchHit {
    fn from(hit: ScoredRecord) -> Self {
        Self {
            id: hit.record.id,
            modality: hit.record.modality,
            payload: hit.record.payload,
            metadata: hit.record.metadata,
            created_at: hit.record.created_at,
            score: hit.score,
        }
    }
}

pub struct SearchService {
    embedder: Arc<Embedder>,
    repo: Arc<VectorRepository>,
}

impl SearchService {
    pub fn new(embedder: Arc<Embedder>, repo: Arc<VectorRepository>) -> Self {
        Self { embedder, repo }
    }

    /// Images closest to `text`.
    pub async fn search_by_text(&self, text: &str, limit: SearchLimit) -> Result<Vec<SearchHit>, DomainError> {
        let vector = self.embedder.embed_text(text).await?;
        self.nearest(Modality::Text.opposite(), &vector, limit).await
    }

    /// Texts closest to `image`.
    pub async fn search_by_image(&self, image: &RgbImage, limit: SearchLimit) -> Result<Vec<SearchHit>, DomainError> {
        let vector = self.embedder.embed_image(image).await?;
        self.nearest(Modality::Image.opposite(), &vector, limit).await
    }

    /// Image references only, best match first.
    pub async fn image_paths_for_text(&self, text: &str, limit: SearchLimit) -> Result<Vec<String>, DomainError> {
        Ok(self
            .search_by_text(text, limit)
            .await?
            .into_iter()
            .map(|h| h.payload)
            .collect())
    }

    /// Text strings only, best match first.
    pub async fn texts_for_image(&self, image: &RgbImage, limit: SearchLimit) -> Result<Vec<String>, DomainError> {
        Ok(self
            .search_by_image(image, limit)
            .await?
            .into_iter()
            .map(|h| h.payload)
            .collect())
    }

    async fn nearest(
        &self,
        filter: Modality,
        vector: &EmbeddingVector,
        limit: SearchLimit,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let hits = self.repo.nearest(filter, vector, limit.value()).await?;
        Ok(hits.into_iter().map(SearchHit::from).collect())
    }
}
