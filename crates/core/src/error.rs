//! Error types for clinrag.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, I/O, LLM, retrieval, prompt and patient
//! lookup errors.

use thiserror::Error;

/// Unified error type for clinrag.
///
/// Externally-caused failures (patient lookup, literature fetch, generation)
/// are absorbed by the answering pipeline and turned into displayable text.
/// Only internal invariant violations travel all the way to the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// A remote call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Literature ingestion and embedding errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Vector index invariant violations
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Patient record lookup errors
    #[error("Patient store error: {0}")]
    Patient(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
