//! The `answer(patient, question)` pipeline.
//!
//! Per request: look up the patient's disease, make sure that patient's
//! index is populated (fetch → ingest → insert → record, at most once per
//! patient at a time), retrieve the nearest chunks for the question, compose
//! the prompt and generate.

use crate::cache::{CacheEntry, RetrievalCache};
use crate::embeddings::{Embedder, EmbeddingConfig};
use crate::ingest::DocumentIngester;
use crate::literature::ArticleFetcher;
use crate::locks::SubjectLocks;
use crate::patients::PatientStore;
use crate::rag::generation::GenerationClient;
use crate::rag::types::{RagAnswer, RagOptions, RetrievalPath};
use crate::types::{PatientId, RetrievedDocument};
use crate::vector_index::{FlatIndex, SharedIndex, VectorIndex};
use clinrag_core::{AppConfig, AppError, AppResult};
use clinrag_prompt::{ContextEntry, PromptComposer};
use std::sync::Arc;
use tracing::Instrument;

/// Process-wide pipeline services, built once and passed explicitly.
pub struct RagContext {
    pub embedder: Arc<Embedder>,
    pub composer: PromptComposer,
    pub generator: GenerationClient,
}

impl RagContext {
    pub fn new(embedder: Arc<Embedder>, composer: PromptComposer, generator: GenerationClient) -> Self {
        Self {
            embedder,
            composer,
            generator,
        }
    }

    /// Build every service from configuration.
    ///
    /// Loads the embedding model, the answer prompt (honouring a workspace
    /// override) and the generation client.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedder = Embedder::from_config(&EmbeddingConfig::from(&config.embedding)).await?;
        let composer = PromptComposer::load(&config.prompts_dir(), config.retrieval.context_mode)?;
        let generator = GenerationClient::from_config(config)?;

        tracing::info!(
            embedding_provider = embedder.provider_name(),
            dimensions = embedder.dimensions(),
            llm_provider = generator.provider_name(),
            model = generator.model(),
            "RAG context ready"
        );

        Ok(Self::new(Arc::new(embedder), composer, generator))
    }
}

/// Answers patient questions over per-patient literature indexes.
pub struct RagOrchestrator {
    context: RagContext,
    patients: Arc<dyn PatientStore>,
    fetcher: Arc<dyn ArticleFetcher>,
    ingester: DocumentIngester,
    cache: RetrievalCache,
    locks: SubjectLocks,
    options: RagOptions,
}

impl RagOrchestrator {
    pub fn new(
        context: RagContext,
        patients: Arc<dyn PatientStore>,
        fetcher: Arc<dyn ArticleFetcher>,
        options: RagOptions,
    ) -> Self {
        let ingester = DocumentIngester::new(Arc::clone(&context.embedder), options.keep_empty_chunks);

        Self {
            context,
            patients,
            fetcher,
            ingester,
            cache: RetrievalCache::new(options.cache_capacity),
            locks: SubjectLocks::new(),
            options,
        }
    }

    pub fn options(&self) -> &RagOptions {
        &self.options
    }

    pub fn cache(&self) -> &RetrievalCache {
        &self.cache
    }

    /// Answer `question` for `patient_id`.
    ///
    /// Every external outcome, including a missing patient or a failed
    /// generation call, is `Ok` text. `Err` means an index invariant was
    /// violated or the prompt could not be rendered.
    pub async fn answer(&self, patient_id: PatientId, question: &str) -> AppResult<String> {
        Ok(self.answer_detailed(patient_id, question).await?.text)
    }

    /// Like [`answer`](Self::answer), also reporting the retrieval path and
    /// the chunks the answer was grounded on.
    pub async fn answer_detailed(&self, patient_id: PatientId, question: &str) -> AppResult<RagAnswer> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("answer", %request_id, %patient_id);

        self.run(patient_id, question).instrument(span).await
    }

    async fn run(&self, patient_id: PatientId, question: &str) -> AppResult<RagAnswer> {
        let Some(topic) = self.patients.get_disease(patient_id).await else {
            tracing::info!("Patient record not found");
            return Ok(RagAnswer::not_found());
        };

        let (entry, path) = self.ensure_ingested(patient_id, &topic).await?;

        let sources = match entry {
            Some(ref entry) if entry.chunk_count > 0 => self.retrieve(&entry.index, question).await?,
            _ => Vec::new(),
        };

        let context: Vec<ContextEntry> = sources.iter().map(ContextEntry::from).collect();
        let prompt = self.context.composer.compose(&topic, &context, question)?;

        let text = self.context.generator.generate(&prompt).await;

        tracing::info!(
            path = ?path,
            retrieved = sources.len(),
            failed = text.starts_with("Error:"),
            "Answer complete"
        );

        Ok(RagAnswer {
            text,
            topic: Some(topic),
            path,
            sources,
        })
    }

    /// Cached entry for `patient_id` if it matches `topic`.
    ///
    /// An entry built for another topic is evicted.
    fn current_entry(&self, patient_id: PatientId, topic: &str) -> Option<CacheEntry> {
        let entry = self.cache.lookup(patient_id)?;
        if entry.topic == topic {
            return Some(entry);
        }

        tracing::info!(
            previous = %entry.topic,
            current = %topic,
            "Patient topic changed, discarding cached index"
        );
        self.cache.evict(patient_id);
        None
    }

    async fn ensure_ingested(
        &self,
        patient_id: PatientId,
        topic: &str,
    ) -> AppResult<(Option<CacheEntry>, RetrievalPath)> {
        if let Some(entry) = self.current_entry(patient_id, topic) {
            tracing::debug!(chunks = entry.chunk_count, "Cache hit");
            return Ok((Some(entry), RetrievalPath::Cached));
        }

        let _guard = self.locks.acquire(patient_id).await;

        // Another request may have finished ingesting while we waited
        if let Some(entry) = self.current_entry(patient_id, topic) {
            tracing::debug!(chunks = entry.chunk_count, "Cache hit after waiting");
            return Ok((Some(entry), RetrievalPath::Cached));
        }

        tracing::info!(topic = %topic, "Cache miss, ingesting literature");

        let articles = match self.fetcher.fetch(topic).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(topic = %topic, "Literature fetch failed: {}", e);
                return Ok((None, RetrievalPath::Ungrounded));
            }
        };

        let records = match self.ingester.ingest(&articles).await {
            Ok(records) => records,
            Err(e @ AppError::Index(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(topic = %topic, "Embedding literature failed: {}", e);
                return Ok((None, RetrievalPath::Ungrounded));
            }
        };

        // An empty index is still recorded so the topic is not fetched again
        if records.is_empty() {
            tracing::warn!(topic = %topic, articles = articles.len(), "No literature chunks available");
        }

        let (vectors, chunks): (Vec<_>, Vec<_>) =
            records.into_iter().map(|r| (r.vector, r.chunk)).unzip();

        let mut index = FlatIndex::new(self.context.embedder.dimensions());
        let ids = index.insert(vectors, chunks)?;

        let entry = CacheEntry::new(topic, index.shared(), ids.len());
        self.cache.record(patient_id, entry.clone());

        tracing::info!(
            articles = articles.len(),
            chunks = entry.chunk_count,
            "Ingested literature"
        );

        Ok((Some(entry), RetrievalPath::Ingested))
    }

    async fn retrieve(&self, index: &SharedIndex, question: &str) -> AppResult<Vec<RetrievedDocument>> {
        let query = match self.context.embedder.embed(question).await {
            Ok(query) => query,
            Err(e @ AppError::Index(_)) => return Err(e),
            Err(e) => {
                tracing::warn!("Embedding question failed, answering without context: {}", e);
                return Ok(Vec::new());
            }
        };

        let documents = search_index(index, &query, self.options.top_k)?;
        tracing::debug!(retrieved = documents.len(), "Retrieved chunks");
        Ok(documents)
    }
}

/// Search under the read lock and map hits back to their chunks.
fn search_index(index: &SharedIndex, query: &[f32], k: usize) -> AppResult<Vec<RetrievedDocument>> {
    let index = index.read().unwrap_or_else(|e| e.into_inner());
    let hits = index.search(query, k)?;

    Ok(hits
        .into_iter()
        .filter_map(|hit| {
            index
                .metadata(hit.id)
                .map(|chunk| RetrievedDocument::from_chunk(chunk, hit.distance))
        })
        .collect())
}
