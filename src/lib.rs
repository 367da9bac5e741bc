pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::embedder::Embedder;
use crate::application::ingest::IngestService;
use crate::application::repository::VectorRepository;
use crate::application::search::{SearchHit, SearchService};
use crate::config::{EncoderBackend, Settings, StoreBackend};
use crate::domain::entities::record::Record;
use crate::domain::error::DomainError;
use crate::domain::ports::encoder::Encoder;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::limit::SearchLimit;
use crate::domain::values::metadata::Metadata;
use crate::domain::values::modality::Modality;
use crate::domain::values::rgb_image::RgbImage;
use crate::infrastructure::encoders::hashing::HashingEncoder;
use crate::infrastructure::encoders::http::HttpEncoder;
use crate::infrastructure::sqlite::vector_store::SqliteVectorStore;
use crate::infrastructure::weaviate::vector_store::WeaviateStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub store: String,
    pub dimension: usize,
    pub total: usize,
    pub texts: usize,
    pub images: usize,
}

pub struct CrossModal {
    store_name: String,
    repo: Arc<VectorRepository>,
    search: SearchService,
    ingest: IngestService,
}

impl CrossModal {
    /// Wires everything from settings and makes sure the collection exists.
    pub async fn new(settings: &Settings) -> Result<Self, DomainError> {
        let store: Arc<dyn VectorStore> = match &settings.store {
            StoreBackend::Sqlite { path } => {
                Arc::new(SqliteVectorStore::open(path).map_err(DomainError::Connection)?)
            }
            StoreBackend::Weaviate { url, collection } => Arc::new(
                WeaviateStore::new(url.clone(), collection.clone()).map_err(DomainError::Config)?,
            ),
        };

        let encoder: Arc<dyn Encoder> = match &settings.encoder {
            EncoderBackend::Hashing => Arc::new(HashingEncoder::new(settings.dimension)),
            EncoderBackend::Http { url } => Arc::new(HttpEncoder::new(url.clone(), settings.dimension)),
        };

        let store_name = store.name().to_string();
        let repo = VectorRepository::new(store, settings.dimension)
            .with_retry(settings.retry.clone())
            .with_batch_size(settings.batch_size)
            .with_read_all_limit(settings.read_all_limit);

        let cm = Self::with_components(encoder, repo)?.with_store_name(store_name);
        cm.repo.ensure_collection().await?;
        Ok(cm)
    }

    /// Wires services around an already-configured repository. Does not touch the store.
    pub fn with_components(encoder: Arc<dyn Encoder>, repo: VectorRepository) -> Result<Self, DomainError> {
        let embedder = Arc::new(Embedder::new(encoder, repo.dimension())?);
        let repo = Arc::new(repo);
        Ok(Self {
            store_name: String::new(),
            search: SearchService::new(embedder.clone(), repo.clone()),
            ingest: IngestService::new(embedder, repo.clone()),
            repo,
        })
    }

    pub fn with_store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = name.into();
        self
    }

    pub async fn init(&self) -> Result<(), DomainError> {
        self.repo.ensure_collection().await
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn ingest(&self) -> &IngestService {
        &self.ingest
    }

    pub fn repository(&self) -> &VectorRepository {
        &self.repo
    }

    // Delegating methods

    pub async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, DomainError> {
        let limit = SearchLimit::new(limit).map_err(DomainError::InvalidInput)?;
        self.search.search_by_text(query, limit).await
    }

    pub async fn search_image(&self, image: &RgbImage, limit: usize) -> Result<Vec<SearchHit>, DomainError> {
        let limit = SearchLimit::new(limit).map_err(DomainError::InvalidInput)?;
        self.search.search_by_image(image, limit).await
    }

    pub async fn upload_texts(&self, texts: &[String], metadata: Option<Vec<Metadata>>) -> Result<usize, DomainError> {
        self.ingest.ingest_texts(texts, metadata).await
    }

    pub async fn upload_image(
        &self,
        reference: String,
        image: RgbImage,
        metadata: Option<Metadata>,
    ) -> Result<usize, DomainError> {
        self.ingest
            .ingest_images(&[(reference, image)], metadata.map(|m| vec![m]))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Record, DomainError> {
        self.repo
            .read_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("record {id}")))
    }

    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<Record>, DomainError> {
        match limit {
            Some(n) => self.repo.read_up_to(n).await,
            None => self.repo.read_all().await,
        }
    }

    pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        self.repo.delete_by_id(id).await
    }

    pub async fn stats(&self) -> Result<StoreStats, DomainError> {
        Ok(StoreStats {
            store: self.store_name.clone(),
            dimension: self.repo.dimension(),
            total: self.repo.count(None).await?,
            texts: self.repo.count(Some(Modality::Text)).await?,
            images: self.repo.count(Some(Modality::Image)).await?,
        })
    }
}
