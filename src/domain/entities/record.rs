use crate::domain::values::embedding::EmbeddingVector;
use crate::domain::values::metadata::Metadata;
use crate::domain::values::modality::Modality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for content-derived record ids.
const RECORD_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_3c2e_9a4d_5e07_8c61_d2f0_a4b3_9e15);

/// Deterministic id for a payload: identical content always maps to the same
/// record, so re-ingestion overwrites instead of duplicating.
pub fn derive_record_id(modality: Modality, payload: &str) -> String {
    let name = format!("{}:{}", modality.as_type_tag(), payload);
    Uuid::new_v5(&RECORD_NAMESPACE, name.as_bytes()).to_string()
}

/// A stored text or image together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub modality: Modality,
    /// The text itself, or a reference (path) to the stored image.
    pub payload: String,
    pub vector: EmbeddingVector,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// A record on its way into the store. The id is derived from the payload
/// when not supplied.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub id: Option<String>,
    pub modality: Modality,
    pub payload: String,
    pub vector: EmbeddingVector,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl NewRecord {
    pub fn new(modality: Modality, payload: String, vector: EmbeddingVector, metadata: Metadata) -> Self {
        Self {
            id: None,
            modality,
            payload,
            vector,
            metadata,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn into_record(self) -> Record {
        let id = self
            .id
            .unwrap_or_else(|| derive_record_id(self.modality, &self.payload));
        Record {
            id,
            modality: self.modality,
            payload: self.payload,
            vector: self.vector,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

/// A record returned by a nearest-vector query, with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: Record,
    /// Cosine similarity in `[-1, 1]`; higher is closer.
    pub score: f64,
}
