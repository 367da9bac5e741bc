//! Unit-norm embedding vectors and the normalizer that produces them.
//!
//! Both encoders project into the same space, so once vectors are L2
//! normalized a plain dot product is the cosine similarity between a text
//! and an image. Stores rank by that dot product; every vector written or
//! used as a query goes through [`EmbeddingNormalizer`].

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};

/// Tolerance on `‖v‖₂ = 1` after normalization.
pub const UNIT_NORM_TOLERANCE: f64 = 1e-5;

/// Norms at or below this are treated as zero.
const DEGENERATE_NORM: f64 = 1e-12;

/// A fixed-width vector, unit-norm when built by [`EmbeddingNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Wraps a vector read back from a store. No normalization is applied:
    /// stored vectors were normalized on the way in.
    pub fn from_stored(values: Vec<f32>) -> Self {
        EmbeddingVector(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f64 {
        l2_norm(&self.0)
    }

    /// Dot product, accumulated in f64. Equals cosine similarity for unit vectors.
    pub fn dot(&self, other: &EmbeddingVector) -> f64 {
        dot(&self.0, &other.0)
    }
}

/// L2-normalizes raw encoder output and enforces the configured width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingNormalizer {
    dimension: usize,
}

impl EmbeddingNormalizer {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn normalize(&self, raw: &[f32]) -> Result<EmbeddingVector, DomainError> {
        if raw.len() != self.dimension {
            return Err(DomainError::DimensionMismatch {
                expected: self.dimension,
                actual: raw.len(),
            });
        }
        if let Some(index) = raw.iter().position(|x| !x.is_finite()) {
            return Err(DomainError::NonFiniteComponent { index });
        }

        let norm = l2_norm(raw);
        if norm <= DEGENERATE_NORM {
            return Err(DomainError::DegenerateVector);
        }

        Ok(EmbeddingVector(
            raw.iter().map(|x| (*x as f64 / norm) as f32).collect(),
        ))
    }
}

fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum()
}
