//! Knowledge data types.

use clinrag_prompt::ContextEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub i64);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PatientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Extracted text of one literature article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Where the article came from
    #[serde(default)]
    pub url: String,

    /// Plain article text, one paragraph per line
    #[serde(alias = "extracted_text")]
    pub text: String,
}

impl Article {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Articles keyed by title, as returned by a fetcher.
///
/// Ordered so ingestion assigns ids deterministically.
pub type ArticleSet = BTreeMap<String, Article>;

/// A contiguous span of text from one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Source article title
    pub title: String,

    /// Source article URL
    pub url: String,

    /// Zero-based position within the source article
    pub chunk_index: usize,

    /// Raw chunk text
    pub text: String,
}

/// A chunk paired with its embedding, produced by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// A search result mapped back to its chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub title: String,
    pub url: String,
    pub chunk_index: usize,
    pub text: String,

    /// Squared Euclidean distance from the query vector
    pub distance: f32,
}

impl RetrievedDocument {
    pub fn from_chunk(chunk: &Chunk, distance: f32) -> Self {
        Self {
            title: chunk.title.clone(),
            url: chunk.url.clone(),
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            distance,
        }
    }
}

impl From<&RetrievedDocument> for ContextEntry {
    fn from(doc: &RetrievedDocument) -> Self {
        ContextEntry::new(doc.title.clone(), doc.chunk_index, doc.text.clone())
    }
}
