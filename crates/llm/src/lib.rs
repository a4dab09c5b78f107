//! LLM integration crate for clinrag.
//!
//! This crate provides a provider-agnostic abstraction for chat completion
//! endpoints. Every provider implements [`LlmClient`]; the answering
//! pipeline only ever sees the trait object.
//!
//! # Providers
//! - **OpenAI-compatible** chat completions (Groq by default, OpenAI)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use clinrag_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is type 2 diabetes?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatClient};
pub use types::ProviderType;
