//! Embedder trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{OllamaEmbedder, TrigramEmbedder};
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Maps text to fixed-dimension vectors.
///
/// Deterministic for a fixed model: equal inputs give equal vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Encode several texts; output order matches input order.
    async fn encode_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Encode a single text.
    async fn encode(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.encode_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedder based on configuration.
///
/// Remote embedders are verified before they are returned, so a missing model
/// surfaces here as [`AppError::ModelUnavailable`].
pub async fn create_embedder(
    config: &EmbeddingConfig,
    endpoint: &str,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn Embedder>> {
    tracing::debug!(
        provider = %config.provider,
        model = %config.model,
        dimensions = config.dimensions,
        "Creating embedder"
    );

    match config.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(config.dimensions))),

        "ollama" => {
            let embedder =
                OllamaEmbedder::connect(endpoint, &config.model, config.dimensions, timeout)
                    .await?;
            Ok(Arc::new(embedder))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, trigram",
            config.provider
        ))),
    }
}
