//! Vector index abstraction for knowledge chunks.
//!
//! Ids are dense insertion positions starting at 0 and are never reused.
//! The shipped [`FlatIndex`] is an exact scan; the trait leaves room for an
//! approximate backend.

use crate::types::Chunk;
use clinrag_core::AppError;
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::{Arc, RwLock};

/// Index invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("{vectors} vectors supplied with {metadata} metadata entries")]
    ShapeMismatch { vectors: usize, metadata: usize },

    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::Index(err.to_string())
    }
}

/// One nearest-neighbour result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub id: usize,

    /// Squared Euclidean distance
    pub distance: f32,
}

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Append vectors with their chunks, returning the ids assigned.
    fn insert(
        &mut self,
        vectors: Vec<Vec<f32>>,
        metadata: Vec<Chunk>,
    ) -> Result<Range<usize>, IndexError>;

    /// Up to `k` nearest entries by ascending distance; ties go to the lower id.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError>;

    /// Chunk stored under `id`, if any.
    fn metadata(&self, id: usize) -> Option<&Chunk>;

    fn len(&self) -> usize;

    fn dimension(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An index shared between the cache and concurrent readers.
///
/// Never hold the lock across an `.await`.
pub type SharedIndex = Arc<RwLock<dyn VectorIndex>>;

/// Exact squared-L2 index over a contiguous vector buffer.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
    chunks: Vec<Chunk>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            chunks: Vec::new(),
        }
    }

    /// Wrap in a [`SharedIndex`].
    pub fn shared(self) -> SharedIndex {
        Arc::new(RwLock::new(self))
    }

    fn vector(&self, id: usize) -> &[f32] {
        let start = id * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    fn check_dimension(&self, actual: usize) -> Result<(), IndexError> {
        if actual != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl VectorIndex for FlatIndex {
    fn insert(
        &mut self,
        vectors: Vec<Vec<f32>>,
        metadata: Vec<Chunk>,
    ) -> Result<Range<usize>, IndexError> {
        if vectors.len() != metadata.len() {
            return Err(IndexError::ShapeMismatch {
                vectors: vectors.len(),
                metadata: metadata.len(),
            });
        }

        // Validate everything before mutating so a bad batch leaves no trace
        for vector in &vectors {
            self.check_dimension(vector.len())?;
        }

        let start = self.chunks.len();
        self.vectors.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.vectors.extend(vector);
        }
        self.chunks.extend(metadata);

        tracing::debug!(
            "Inserted ids {}..{} into flat index",
            start,
            self.chunks.len()
        );

        Ok(start..self.chunks.len())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        self.check_dimension(query.len())?;

        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = (0..self.chunks.len())
            .map(|id| SearchHit {
                id,
                distance: squared_l2(self.vector(id), query),
            })
            .collect();

        hits.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });
        hits.truncate(k);

        Ok(hits)
    }

    fn metadata(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
