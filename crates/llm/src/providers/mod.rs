//! Concrete LLM providers.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiCompatClient;

use clinrag_core::AppError;
use std::time::Duration;

/// Map a transport failure to an error, keeping timeouts distinguishable.
pub(crate) fn transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!(
            "{} request did not complete within {}s",
            provider,
            timeout.as_secs()
        ))
    } else {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, err))
    }
}
