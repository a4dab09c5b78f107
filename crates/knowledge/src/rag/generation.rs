//! Generation client with the clinical assistant persona.

use clinrag_core::{AppConfig, AppError, AppResult};
use clinrag_llm::{create_client, LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Duration;

/// System message sent with every generation request.
pub const SYSTEM_ROLE: &str = "You are an AI medical assistant.";

/// Sends a composed prompt to the model and always returns displayable text.
#[derive(Clone)]
pub struct GenerationClient {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
}

impl GenerationClient {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    /// Build the configured provider client.
    ///
    /// Fails when the provider is unknown or its API key is missing.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api_key = config.resolve_api_key();
        let client = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(config.llm.timeout_secs),
        )
        .map_err(AppError::Config)?;

        Ok(Self::new(client, &config.llm.model, config.llm.temperature))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// One completion call, no retries.
    ///
    /// Failures come back as `Error: ...` text instead of an `Err`.
    pub async fn generate(&self, prompt: &str) -> String {
        let request = LlmRequest::new(prompt, &self.model)
            .with_system(SYSTEM_ROLE)
            .with_temperature(self.temperature);

        match self.client.complete(&request).await {
            Ok(response) => {
                tracing::info!(
                    provider = self.provider_name(),
                    total_tokens = response.usage.total_tokens,
                    "Generation succeeded"
                );
                response.content
            }
            Err(AppError::Timeout(msg)) => {
                tracing::warn!(provider = self.provider_name(), "Generation timed out: {}", msg);
                format!("Error: generation timed out ({})", msg)
            }
            Err(AppError::Llm(msg)) => {
                tracing::warn!(provider = self.provider_name(), "Generation failed: {}", msg);
                format!("Error: {}", msg)
            }
            Err(other) => {
                tracing::warn!(provider = self.provider_name(), "Generation failed: {}", other);
                format!("Error: {}", other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinrag_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<LlmRequest>>,
        fail_with: Option<fn() -> AppError>,
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingClient {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            Ok(LlmResponse {
                content: "Drink water.".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 3),
            })
        }
    }

    #[tokio::test]
    async fn test_generate_sends_fixed_persona() {
        let client = Arc::new(RecordingClient::default());
        let generator = GenerationClient::new(client.clone(), "llama3-8b-8192", 0.2);

        let text = generator.generate("prompt body").await;

        assert_eq!(text, "Drink water.");
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(SYSTEM_ROLE));
        assert_eq!(requests[0].model, "llama3-8b-8192");
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].prompt, "prompt body");
    }

    #[tokio::test]
    async fn test_generate_error_becomes_text() {
        let client = Arc::new(RecordingClient {
            fail_with: Some(|| AppError::Llm("groq API error (500): boom".to_string())),
            ..Default::default()
        });
        let generator = GenerationClient::new(client, "m", 0.2);

        let text = generator.generate("p").await;
        assert_eq!(text, "Error: groq API error (500): boom");
    }

    #[tokio::test]
    async fn test_generate_timeout_is_distinguishable() {
        let client = Arc::new(RecordingClient {
            fail_with: Some(|| AppError::Timeout("groq request did not complete within 60s".to_string())),
            ..Default::default()
        });
        let generator = GenerationClient::new(client, "m", 0.2);

        let text = generator.generate("p").await;
        assert!(text.starts_with("Error:"));
        assert!(text.contains("timed out"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = AppConfig::default();
        config.llm.provider = "groq".to_string();
        config.llm.api_key_env = Some("CLINRAG_TEST_UNSET_KEY_VAR".to_string());
        config.api_key = None;

        let err = GenerationClient::from_config(&config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_from_config_ollama() {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        config.llm.model = "llama3".to_string();

        let generator = GenerationClient::from_config(&config).unwrap();
        assert_eq!(generator.provider_name(), "ollama");
        assert_eq!(generator.model(), "llama3");
    }
}
