use crate::application::embedder::Embedder;
use crate::application::repository::VectorRepository;
use crate::domain::entities::record::NewRecord;
use crate::domain::error::DomainError;
use crate::domain::values::metadata::Metadata;
use crate::domain::values::modality::Modality;
use crate::domain::values::rgb_image::RgbImage;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Metadata key carrying the ingestion time. Reserved: callers may not set it.
pub const CREATED_AT_KEY: &str = "created_at";

/// Something to embed and store.
pub enum IngestItem<'a> {
    Text(&'a str),
    /// An image and the reference (path) under which it is stored.
    Image { reference: &'a str, image: &'a RgbImage },
}

impl IngestItem<'_> {
    fn modality(&self) -> Modality {
        match self {
            IngestItem::Text(_) => Modality::Text,
            IngestItem::Image { .. } => Modality::Image,
        }
    }

    fn payload(&self) -> &str {
        match self {
            IngestItem::Text(text) => text,
            IngestItem::Image { reference, .. } => reference,
        }
    }
}

pub struct IngestService {
    embedder: Arc<Embedder>,
    repo: Arc<VectorRepository>,
}

impl IngestService {
    pub fn new(embedder: Arc<Embedder>, repo: Arc<VectorRepository>) -> Self {
        Self { embedder, repo }
    }

    pub async fn ingest_texts(&self, texts: &[String], metadata: Option<Vec<Metadata>>) -> Result<usize, DomainError> {
        let items: Vec<IngestItem> = texts.iter().map(|t| IngestItem::Text(t)).collect();
        self.ingest(&items, metadata).await
    }

    pub async fn ingest_images(
        &self,
        images: &[(String, RgbImage)],
        metadata: Option<Vec<Metadata>>,
    ) -> Result<usize, DomainError> {
        let items: Vec<IngestItem> = images
            .iter()
            .map(|(reference, image)| IngestItem::Image { reference, image })
            .collect();
        self.ingest(&items, metadata).await
    }

    /// Embeds and stores `items`; returns how many distinct records were written.
    ///
    /// Input is validated before anything is embedded or written. Storage is
    /// at-least-once: if a later sub-batch fails, earlier ones stay written,
    /// and repeating the call overwrites them by id.
    pub async fn ingest(&self, items: &[IngestItem<'_>], metadata: Option<Vec<Metadata>>) -> Result<usize, DomainError> {
        let metadata = match metadata {
            Some(m) if m.len() != items.len() => {
                return Err(DomainError::ArityMismatch {
                    payloads: items.len(),
                    metadata: m.len(),
                })
            }
            Some(m) => m,
            None => vec![Metadata::new(); items.len()],
        };
        if let Some(pos) = metadata.iter().position(|m| m.get(CREATED_AT_KEY).is_some()) {
            return Err(DomainError::InvalidInput(format!(
                "metadata {pos} sets the reserved key '{CREATED_AT_KEY}'"
            )));
        }
        if let Some(pos) = items.iter().position(|i| i.payload().trim().is_empty()) {
            return Err(DomainError::InvalidInput(format!("item {pos} has an empty payload")));
        }
        if items.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut records = Vec::with_capacity(items.len());
        for (item, mut meta) in items.iter().zip(metadata) {
            let vector = match item {
                IngestItem::Text(text) => self.embedder.embed_text(text).await?,
                IngestItem::Image { image, .. } => self.embedder.embed_image(image).await?,
            };
            meta.insert(CREATED_AT_KEY, now);
            let mut record = NewRecord::new(item.modality(), item.payload().to_string(), vector, meta);
            record.created_at = now;
            records.push(record);
        }

        let ids = self.repo.upsert_batch(records).await?;
        let written = ids.iter().collect::<HashSet<_>>().len();
        info!(items = items.len(), written, "ingested");
        Ok(written)
    }
}
