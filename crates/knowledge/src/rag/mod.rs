//! RAG (Retrieval-Augmented Generation) answering for patient questions.

pub mod generation;
pub mod orchestrator;
pub mod types;

pub use generation::{GenerationClient, SYSTEM_ROLE};
pub use orchestrator::{RagContext, RagOrchestrator};
pub use types::{RagAnswer, RagOptions, RetrievalPath, PATIENT_NOT_FOUND};
