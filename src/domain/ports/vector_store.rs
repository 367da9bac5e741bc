//! Port to the backing vector store.
//!
//! Adapters report failures as [`StoreError`] tagged with an [`ErrorKind`];
//! the repository's retry loop decides what to do from the kind alone.

use crate::domain::entities::record::{Record, ScoredRecord};
use crate::domain::values::modality::Modality;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not obtain a session/connection at all.
    Session,
    /// Connection dropped, channel closed, 5xx, busy database. Worth retrying.
    Transient,
    /// Malformed query, schema violation, rejected object. Retrying won't help.
    Permanent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn session(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Session, message: message.into() }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Transient, message: message.into() }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Permanent, message: message.into() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Creates the collection if absent. Fails permanently if it exists with
    /// a different vector dimension.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError>;

    /// Inserts or fully replaces each record by id.
    async fn upsert(&self, records: &[Record]) -> Result<(), StoreError>;

    async fn fetch(&self, id: &str) -> Result<Option<Record>, StoreError>;

    async fn fetch_all(&self, limit: usize) -> Result<Vec<Record>, StoreError>;

    /// Up to `limit` records of `modality`, most similar first. Equal scores
    /// keep the store's insertion order.
    async fn near_vector(
        &self,
        modality: Modality,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn count(&self, modality: Option<Modality>) -> Result<usize, StoreError>;
}
