//! Answer generation through an LLM client.

use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Instant;

/// Produces answer text from a fully rendered prompt.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate at most `max_new_tokens` tokens and return the trimmed text.
    ///
    /// Any inference failure is reported as [`AppError::Generation`].
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> AppResult<String>;
}

/// [`AnswerGenerator`] backed by an [`LlmClient`].
pub struct LlmAnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: Option<f32>,
}

impl LlmAnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
        }
    }

    /// Sampling temperature. Unset means the backend default.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt, &self.model).with_max_tokens(max_new_tokens);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let start = Instant::now();
        let response = self.client.complete(&request).await.map_err(|e| match e {
            AppError::Generation(_) => e,
            other => AppError::Generation(other.to_string()),
        })?;

        tracing::debug!(
            model = %response.model,
            completion_tokens = response.usage.completion_tokens,
            latency_ms = start.elapsed().as_millis() as u64,
            "Generated answer"
        );

        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    struct StubClient {
        reply: AppResult<String>,
        seen: Mutex<Option<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for StubClient {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            *self.seen.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(content) => Ok(LlmResponse {
                    content: content.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 5),
                    done: true,
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }

        async fn health_check(&self, _model: &str) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_generate_trims_and_passes_budget() {
        let client = Arc::new(StubClient {
            reply: Ok("\n  Templates are generic code.  \n".to_string()),
            seen: Mutex::new(None),
        });
        let generator =
            LlmAnswerGenerator::new(client.clone(), "llama3.2").with_temperature(Some(0.2));

        let answer = generator.generate("prompt", 120).await.unwrap();
        assert_eq!(answer, "Templates are generic code.");

        let seen = client.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.max_tokens, Some(120));
        assert_eq!(seen.temperature, Some(0.2));
        assert_eq!(seen.model, "llama3.2");
    }

    #[tokio::test]
    async fn test_client_failure_becomes_generation_error() {
        let client = Arc::new(StubClient {
            reply: Err(AppError::Other("connection reset".to_string())),
            seen: Mutex::new(None),
        });
        let generator = LlmAnswerGenerator::new(client, "llama3.2");

        let err = generator.generate("prompt", 120).await.unwrap_err();
        assert!(err.is_generation_failure());
        assert!(err.to_string().contains("connection reset"));
    }
}
