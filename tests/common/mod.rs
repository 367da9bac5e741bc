//! Shared test helpers: a keyword encoder with exact, hand-checkable vectors
//! and a store wrapper that injects failures.

#![allow(dead_code)]

use crossmodal::application::repository::VectorRepository;
use crossmodal::application::retry::RetryPolicy;
use crossmodal::domain::entities::record::{Record, ScoredRecord};
use crossmodal::domain::error::DomainError;
use crossmodal::domain::ports::encoder::Encoder;
use crossmodal::domain::ports::vector_store::{ErrorKind, StoreError, VectorStore};
use crossmodal::domain::values::modality::Modality;
use crossmodal::domain::values::rgb_image::RgbImage;
use crossmodal::infrastructure::sqlite::vector_store::SqliteVectorStore;
use crossmodal::CrossModal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DIM: usize = 8;

/// Maps known words to fixed axes; colours map to the same axes so that a red
/// image and "cat" point the same way.
pub struct KeywordEncoder;

impl KeywordEncoder {
    fn axis(word: &str) -> Option<usize> {
        match word {
            "cat" | "feline" | "kitten" => Some(0),
            "dog" | "puppy" => Some(1),
            "park" => Some(2),
            "mat" => Some(3),
            "bird" => Some(4),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Encoder for KeywordEncoder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut v = vec![0.0; DIM];
        for word in text.split_whitespace() {
            if let Some(axis) = Self::axis(&word.to_lowercase()) {
                v[axis] += 1.0;
            }
        }
        Ok(v)
    }

    async fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>, DomainError> {
        let mut v = vec![0.0; DIM];
        for px in image.pixels().chunks_exact(3) {
            // red → cat, green → dog, blue → park
            let axis = match px {
                [r, _, _] if *r > 127 => 0,
                [_, g, _] if *g > 127 => 1,
                [_, _, b] if *b > 127 => 2,
                _ => continue,
            };
            v[axis] += 1.0;
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Wraps a real store; fails a configurable number of calls.
pub struct FlakyStore {
    inner: SqliteVectorStore,
    fail_kind: ErrorKind,
    failures_left: AtomicU32,
    fail_upsert_call: Option<u32>,
    calls: AtomicU32,
    upsert_calls: AtomicU32,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteVectorStore::open(":memory:").unwrap(),
            fail_kind: ErrorKind::Transient,
            failures_left: AtomicU32::new(0),
            fail_upsert_call: None,
            calls: AtomicU32::new(0),
            upsert_calls: AtomicU32::new(0),
        }
    }

    /// The next `n` calls of any kind fail with `kind`.
    pub fn failing_first(mut self, n: u32, kind: ErrorKind) -> Self {
        self.failures_left = AtomicU32::new(n);
        self.fail_kind = kind;
        self
    }

    /// The `k`-th upsert call (1-based) fails permanently.
    pub fn failing_upsert_call(mut self, k: u32) -> Self {
        self.fail_upsert_call = Some(k);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> u32 {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError {
                kind: self.fail_kind,
                message: "connection closed".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorStore for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        self.gate()?;
        self.inner.ensure_collection(dimension).await
    }

    async fn upsert(&self, records: &[Record]) -> Result<(), StoreError> {
        self.gate()?;
        let n = self.upsert_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_upsert_call == Some(n) {
            return Err(StoreError::permanent("schema violation"));
        }
        self.inner.upsert(records).await
    }

    async fn fetch(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.gate()?;
        self.inner.fetch(id).await
    }

    async fn fetch_all(&self, limit: usize) -> Result<Vec<Record>, StoreError> {
        self.gate()?;
        self.inner.fetch_all(limit).await
    }

    async fn near_vector(
        &self,
        modality: Modality,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        self.gate()?;
        self.inner.near_vector(modality, vector, limit).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.gate()?;
        self.inner.delete(id).await
    }

    async fn count(&self, modality: Option<Modality>) -> Result<usize, StoreError> {
        self.gate()?;
        self.inner.count(modality).await
    }
}

/// Millisecond backoff so failing paths don't slow the suite.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::default().with_base_delay(Duration::from_millis(1))
}

pub fn repo_over(store: Arc<dyn VectorStore>) -> VectorRepository {
    VectorRepository::new(store, DIM).with_retry(fast_retry())
}

pub fn setup() -> CrossModal {
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    CrossModal::with_components(Arc::new(KeywordEncoder), repo_over(store)).unwrap()
}

pub fn setup_with_store(store: Arc<dyn VectorStore>) -> CrossModal {
    CrossModal::with_components(Arc::new(KeywordEncoder), repo_over(store)).unwrap()
}

pub fn red() -> RgbImage {
    RgbImage::filled(2, 2, [255, 0, 0]).unwrap()
}

pub fn green() -> RgbImage {
    RgbImage::filled(2, 2, [0, 255, 0]).unwrap()
}

pub fn blue() -> RgbImage {
    RgbImage::filled(2, 2, [0, 0, 255]).unwrap()
}
