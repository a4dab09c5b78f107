//! Patient-linked literature retrieval and answering.
//!
//! The pipeline runs leaves first:
//! [`Embedder`] → [`VectorIndex`] → [`DocumentIngester`] → [`RetrievalCache`]
//! → prompt composition → generation, all driven by [`RagOrchestrator`].
//!
//! Every patient gets its own in-memory index, populated on the first
//! question and reused from the cache afterwards.

pub mod cache;
pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod literature;
pub mod locks;
pub mod patients;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use cache::{CacheEntry, RetrievalCache};
pub use embeddings::{create_provider, Embedder, EmbeddingConfig, EmbeddingProvider};
pub use ingest::DocumentIngester;
pub use literature::{topic_slug, ArticleFetcher, LiteratureDirectory};
pub use locks::{SubjectGuard, SubjectLocks};
pub use patients::{InMemoryPatientStore, PatientStore, SupabasePatientStore};
pub use rag::{
    GenerationClient, RagAnswer, RagContext, RagOptions, RagOrchestrator, RetrievalPath,
    PATIENT_NOT_FOUND, SYSTEM_ROLE,
};
pub use types::{Article, ArticleSet, Chunk, EmbeddingRecord, PatientId, RetrievedDocument};
pub use vector_index::{FlatIndex, IndexError, SearchHit, SharedIndex, VectorIndex};
