//! RAG response types.

use crate::types::RetrievedDocument;
use clinrag_core::config::RetrievalSettings;
use serde::{Deserialize, Serialize};

/// Answer returned for patients with no stored record.
pub const PATIENT_NOT_FOUND: &str = "Patient record not found.";

/// How an answer obtained its grounding material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    /// No patient record; nothing else ran
    NotFound,

    /// The patient's index was already cached
    Cached,

    /// Literature was fetched and ingested for this request, possibly
    /// yielding no chunks
    Ingested,

    /// Fetching or embedding failed; answered without context and nothing
    /// was cached
    Ungrounded,
}

/// Full result of one answer request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Displayable answer or `Error: ...` text
    pub text: String,

    /// Disease the answer was grounded on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    pub path: RetrievalPath,

    /// Retrieved chunks in ascending distance
    pub sources: Vec<RetrievedDocument>,
}

impl RagAnswer {
    pub fn not_found() -> Self {
        Self {
            text: PATIENT_NOT_FOUND.to_string(),
            topic: None,
            path: RetrievalPath::NotFound,
            sources: Vec::new(),
        }
    }
}

/// Retrieval knobs for an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagOptions {
    /// Nearest chunks retrieved per question
    pub top_k: usize,

    /// Patients whose indexes stay cached
    pub cache_capacity: usize,

    /// Keep blank lines as chunks
    pub keep_empty_chunks: bool,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self::from(&RetrievalSettings::default())
    }
}

impl From<&RetrievalSettings> for RagOptions {
    fn from(settings: &RetrievalSettings) -> Self {
        Self {
            top_k: settings.top_k,
            cache_capacity: settings.cache_capacity,
            keep_empty_chunks: settings.keep_empty_chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RagOptions::default();
        assert_eq!(options.top_k, 6);
        assert_eq!(options.cache_capacity, 128);
        assert!(!options.keep_empty_chunks);
    }

    #[test]
    fn test_not_found_answer_serialization() {
        let json = serde_json::to_value(RagAnswer::not_found()).unwrap();

        assert_eq!(json["text"], PATIENT_NOT_FOUND);
        assert_eq!(json["path"], "notfound");
        assert!(json.get("topic").is_none());
        assert_eq!(json["sources"], serde_json::json!([]));
    }
}
