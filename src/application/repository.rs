//! The only path from the services to the vector store.
//!
//! Every call goes through the [`RetryPolicy`]. Writes are validated against
//! the collection dimension up front, then flushed in sub-batches; a failed
//! sub-batch does not undo the ones already flushed, so writers rely on
//! content-derived ids to make a repeated ingest harmless.

use crate::application::retry::RetryPolicy;
use crate::domain::entities::record::{NewRecord, Record, ScoredRecord};
use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::embedding::EmbeddingVector;
use crate::domain::values::modality::Modality;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_READ_ALL_LIMIT: usize = 1000;

pub struct VectorRepository {
    store: Arc<dyn VectorStore>,
    retry: RetryPolicy,
    dimension: usize,
    batch_size: usize,
    read_all_limit: usize,
}

impl VectorRepository {
    pub fn new(store: Arc<dyn VectorStore>, dimension: usize) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
            dimension,
            batch_size: DEFAULT_BATCH_SIZE,
            read_all_limit: DEFAULT_READ_ALL_LIMIT,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_read_all_limit(mut self, limit: usize) -> Self {
        self.read_all_limit = limit;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn ensure_collection(&self) -> Result<(), DomainError> {
        let store = &self.store;
        let dimension = self.dimension;
        self.retry
            .run("ensure_collection", move || store.ensure_collection(dimension))
            .await?;
        info!(store = store.name(), dimension, "collection ready");
        Ok(())
    }

    /// Writes records, deriving missing ids. Returns the ids in input order.
    pub async fn upsert_batch(&self, items: Vec<NewRecord>) -> Result<Vec<String>, DomainError> {
        let records: Vec<Record> = items.into_iter().map(NewRecord::into_record).collect();
        for record in &records {
            self.check_dimension(&record.vector)?;
        }

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let total_batches = records.len().div_ceil(self.batch_size);
        for (n, chunk) in records.chunks(self.batch_size).enumerate() {
            let store = &self.store;
            self.retry.run("upsert", move || store.upsert(chunk)).await?;
            debug!(
                batch = n + 1,
                of = total_batches,
                size = chunk.len(),
                "flushed upsert batch"
            );
        }
        Ok(ids)
    }

    /// `Ok(None)` when the id is absent; errors mean the store could not answer.
    pub async fn read_by_id(&self, id: &str) -> Result<Option<Record>, DomainError> {
        let store = &self.store;
        self.retry.run("read_by_id", move || store.fetch(id)).await
    }

    pub async fn read_all(&self) -> Result<Vec<Record>, DomainError> {
        self.read_up_to(self.read_all_limit).await
    }

    pub async fn read_up_to(&self, limit: usize) -> Result<Vec<Record>, DomainError> {
        let store = &self.store;
        let records = self.retry.run("read_all", move || store.fetch_all(limit)).await?;
        debug!(count = records.len(), limit, "read records");
        Ok(records)
    }

    /// Up to `limit` records of `filter`, ordered by non-increasing similarity.
    pub async fn nearest(
        &self,
        filter: Modality,
        vector: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        if limit == 0 {
            return Err(DomainError::InvalidInput("limit must be at least 1".into()));
        }
        self.check_dimension(vector)?;

        let store = &self.store;
        let query = vector.as_slice();
        let mut hits = self
            .retry
            .run("nearest", move || store.near_vector(filter, query, limit))
            .await?;

        // Filtered queries only ever yield the filtered modality.
        hits.retain(|h| h.record.modality == filter);
        hits.truncate(limit);
        Ok(hits)
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<bool, DomainError> {
        let store = &self.store;
        let removed = self.retry.run("delete_by_id", move || store.delete(id)).await?;
        debug!(id, removed, "delete");
        Ok(removed)
    }

    pub async fn count(&self, modality: Option<Modality>) -> Result<usize, DomainError> {
        let store = &self.store;
        self.retry.run("count", move || store.count(modality)).await
    }

    fn check_dimension(&self, vector: &EmbeddingVector) -> Result<(), DomainError> {
        if vector.dimension() != self.dimension {
            return Err(DomainError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.dimension(),
            });
        }
        Ok(())
    }
}
