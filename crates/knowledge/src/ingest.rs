//! Turning fetched articles into embedded chunks.

use crate::chunker::chunk_lines;
use crate::embeddings::Embedder;
use crate::types::{ArticleSet, Chunk, EmbeddingRecord};
use clinrag_core::AppResult;
use std::sync::Arc;

/// Chunks and embeds article sets. Never touches an index.
#[derive(Debug, Clone)]
pub struct DocumentIngester {
    embedder: Arc<Embedder>,
    keep_empty_chunks: bool,
}

impl DocumentIngester {
    pub fn new(embedder: Arc<Embedder>, keep_empty_chunks: bool) -> Self {
        Self {
            embedder,
            keep_empty_chunks,
        }
    }

    /// Split every article into line chunks, articles in title order.
    pub fn chunk(&self, articles: &ArticleSet) -> Vec<Chunk> {
        articles
            .iter()
            .flat_map(|(title, article)| {
                chunk_lines(&article.text, self.keep_empty_chunks)
                    .into_iter()
                    .map(move |segment| Chunk {
                        title: title.clone(),
                        url: article.url.clone(),
                        chunk_index: segment.index,
                        text: segment.text.to_string(),
                    })
            })
            .collect()
    }

    /// Chunk and embed `articles` with a single batch call.
    pub async fn ingest(&self, articles: &ArticleSet) -> AppResult<Vec<EmbeddingRecord>> {
        let chunks = self.chunk(articles);

        tracing::debug!(
            "Chunked {} articles into {} chunks",
            articles.len(),
            chunks.len()
        );

        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        Ok(vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| EmbeddingRecord { vector, chunk })
            .collect())
    }
}
