//! Embedding engine.
//!
//! One [`Embedder`] is built per process and shared by ingestion and
//! query-time retrieval.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::vector_index::IndexError;
use clinrag_core::AppResult;
use std::sync::Arc;

/// Shape-checked front end over a single embedding provider.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Build the provider named by `config`.
    pub async fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        tracing::debug!(
            "Creating embedding provider: provider={}, model={}, dimensions={}",
            config.provider,
            config.model,
            config.dimensions
        );

        let provider = create_provider(config).await?;
        Ok(Self::new(provider))
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed one query text.
    pub async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    /// Embed many texts in one provider call, preserving order.
    pub async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider_name(),
            self.model_name()
        );

        let vectors = self.provider.embed_batch(texts).await?;

        if vectors.len() != texts.len() {
            return Err(IndexError::ShapeMismatch {
                vectors: vectors.len(),
                metadata: texts.len(),
            }
            .into());
        }
        for vector in &vectors {
            self.check_dimension(vector)?;
        }

        Ok(vectors)
    }

    fn check_dimension(&self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.dimensions() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            }
            .into());
        }
        Ok(())
    }
}
