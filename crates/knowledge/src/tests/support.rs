//! Test doubles for the answering pipeline.

use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::{Embedder, EmbeddingProvider};
use crate::literature::ArticleFetcher;
use crate::patients::InMemoryPatientStore;
use crate::rag::{GenerationClient, RagContext, RagOptions, RagOrchestrator};
use crate::types::{Article, ArticleSet, PatientId};
use clinrag_core::config::ContextMode;
use clinrag_core::{AppError, AppResult};
use clinrag_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use clinrag_prompt::PromptComposer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DIMENSIONS: usize = 64;

/// Literature fetcher that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingFetcher {
    pub library: Mutex<HashMap<String, ArticleSet>>,
    pub calls: AtomicUsize,
    pub topics: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
}

impl CountingFetcher {
    pub fn with_topic(topic: &str, articles: ArticleSet) -> Self {
        let fetcher = Self::default();
        fetcher.add_topic(topic, articles);
        fetcher
    }

    pub fn add_topic(&self, topic: &str, articles: ArticleSet) {
        self.library
            .lock()
            .unwrap()
            .insert(topic.to_string(), articles);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ArticleFetcher for CountingFetcher {
    async fn fetch(&self, topic: &str) -> AppResult<ArticleSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.topics.lock().unwrap().push(topic.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Knowledge("literature service unavailable".to_string()));
        }

        Ok(self
            .library
            .lock()
            .unwrap()
            .get(topic)
            .cloned()
            .unwrap_or_default())
    }
}

/// Embedding provider that counts batches and can misbehave on demand.
#[derive(Debug)]
pub struct CountingProvider {
    inner: TrigramProvider,
    pub batches: AtomicUsize,
    pub fail: AtomicBool,
    pub wrong_dimensions: AtomicBool,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self {
            inner: TrigramProvider::new(DIMENSIONS),
            batches: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            wrong_dimensions: AtomicBool::new(false),
        }
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingProvider {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Timeout("embedding model did not answer".to_string()));
        }
        if self.wrong_dimensions.load(Ordering::SeqCst) {
            return Ok(texts.iter().map(|_| vec![0.5; DIMENSIONS / 2]).collect());
        }

        self.inner.embed_batch(texts).await
    }
}

/// Language model stub that records every prompt.
#[derive(Default)]
pub struct StubLlm {
    pub prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(LlmResponse {
            content: format!("answer #{}", self.calls()),
            model: request.model.clone(),
            usage: LlmUsage::new(1, 1),
        })
    }
}

/// Everything a pipeline test needs to observe.
pub struct Harness {
    pub orchestrator: Arc<RagOrchestrator>,
    pub patients: Arc<InMemoryPatientStore>,
    pub fetcher: Arc<CountingFetcher>,
    pub provider: Arc<CountingProvider>,
    pub llm: Arc<StubLlm>,
}

pub fn articles(entries: &[(&str, &str, &str)]) -> ArticleSet {
    entries
        .iter()
        .map(|(title, url, text)| (title.to_string(), Article::new(*url, *text)))
        .collect()
}

pub fn asthma_literature() -> ArticleSet {
    articles(&[
        (
            "Paper A",
            "http://x",
            "Inhaled corticosteroids reduce asthma exacerbations\nRescue inhalers relieve acute wheezing",
        ),
        (
            "Paper B",
            "http://y",
            "Exercise induced bronchoconstriction responds to warm up routines",
        ),
    ])
}

pub fn harness(fetcher: CountingFetcher, options: RagOptions) -> Harness {
    let llm = Arc::new(StubLlm::default());
    let generator = GenerationClient::new(llm.clone(), "llama3-8b-8192", 0.2);
    harness_with_generator(fetcher, options, generator, llm)
}

pub fn harness_with_generator(
    fetcher: CountingFetcher,
    options: RagOptions,
    generator: GenerationClient,
    llm: Arc<StubLlm>,
) -> Harness {
    let provider = Arc::new(CountingProvider::new());
    let embedder = Arc::new(Embedder::new(provider.clone()));
    let composer = PromptComposer::new(ContextMode::Citations).unwrap();
    let context = RagContext::new(embedder, composer, generator);

    let patients = Arc::new(InMemoryPatientStore::with_records([(PatientId(1), "asthma")]));
    let fetcher = Arc::new(fetcher);

    let orchestrator = Arc::new(RagOrchestrator::new(
        context,
        patients.clone(),
        fetcher.clone(),
        options,
    ));

    Harness {
        orchestrator,
        patients,
        fetcher,
        provider,
        llm,
    }
}
