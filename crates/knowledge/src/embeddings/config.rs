//! Embedding configuration and build/query consistency checks.

use crate::types::IndexManifest;
use docqa_core::config::EmbeddingSettings;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Number of passages sent per embedding call during a build
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_settings(&EmbeddingSettings::default())
    }
}

impl EmbeddingConfig {
    /// Build from the `embedding` section of the application config.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
        }
    }

    /// Check that a built knowledge base was produced with this configuration.
    pub fn validate_consistency(&self, manifest: &IndexManifest) -> AppResult<()> {
        if self.provider != manifest.provider {
            return Err(AppError::Startup(format!(
                "Provider mismatch: index built with '{}', configured '{}'",
                manifest.provider, self.provider
            )));
        }

        if self.model != manifest.model {
            return Err(AppError::Startup(format!(
                "Model mismatch: index built with '{}', configured '{}'",
                manifest.model, self.model
            )));
        }

        if self.dimensions != manifest.dimensions {
            return Err(AppError::Startup(format!(
                "Dimension mismatch: index built with {}, configured {}",
                manifest.dimensions, self.dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn manifest_for(config: &EmbeddingConfig) -> IndexManifest {
        IndexManifest {
            provider: config.provider.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            documents: 3,
            built_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "all-minilm");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let settings = EmbeddingSettings {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(EmbeddingConfig::from_settings(&settings).batch_size, 1);
    }

    #[test]
    fn test_validate_consistency_success() {
        let config = EmbeddingConfig::default();
        assert!(config.validate_consistency(&manifest_for(&config)).is_ok());
    }

    #[test]
    fn test_validate_consistency_model_mismatch() {
        let config = EmbeddingConfig::default();
        let mut manifest = manifest_for(&config);
        manifest.model = "nomic-embed-text".to_string();

        let err = config.validate_consistency(&manifest).unwrap_err();
        assert!(err.is_startup_failure());
        assert!(err.to_string().contains("Model mismatch"));
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config = EmbeddingConfig::default();
        let mut manifest = manifest_for(&config);
        manifest.dimensions = 768;

        let err = config.validate_consistency(&manifest).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }
}
