//! Knowledge base build and inspection.

use anyhow::{bail, Context};
use clap::{Args, Subcommand};
use docqa_core::config::AppConfig;
use docqa_knowledge::config::get_base_dir;
use docqa_knowledge::{create_embedder, EmbeddingConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Build or inspect the knowledge base
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Embed text sources and write the knowledge base
    Build(IndexBuildCommand),
    /// Show knowledge base statistics
    Stats(IndexStatsCommand),
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig, base: &str) -> anyhow::Result<()> {
        match &self.action {
            IndexAction::Build(cmd) => cmd.execute(config, base).await,
            IndexAction::Stats(cmd) => cmd.execute(config, base),
        }
    }
}

/// Embed text sources and write the knowledge base
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// `.txt` file or directory of `.txt` files (repeatable)
    #[arg(long = "source", required = true)]
    pub sources: Vec<PathBuf>,

    /// Replace an existing knowledge base
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig, base: &str) -> anyhow::Result<()> {
        tracing::info!("Building knowledge base '{}'", base);

        let base_dir = get_base_dir(&config.workspace, base);
        if base_dir.exists() {
            if !self.reset {
                bail!(
                    "Knowledge base '{}' already exists at {:?}. Use --reset to rebuild it.",
                    base,
                    base_dir
                );
            }
            tracing::info!("Rebuilding '{}' in place of the existing base", base);
        }

        let embedding = EmbeddingConfig::from_settings(&config.embedding);
        let timeout = config.provider_timeout("ollama").map(Duration::from_secs);
        let embedder = create_embedder(&embedding, config.ollama_endpoint(), timeout)
            .await
            .context("failed to load embedding model")?;

        let stats = docqa_knowledge::build_knowledge_base(
            &self.sources,
            embedder.as_ref(),
            &embedding,
            &base_dir,
        )
        .await?;

        if self.json {
            let output = serde_json::json!({
                "base": base,
                "documents": stats.documents,
                "dimensions": stats.dimensions,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} passages ({} dimensions) into '{}' in {:.2}s",
                stats.documents, stats.dimensions, base, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct IndexStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatsCommand {
    pub fn execute(&self, config: &AppConfig, base: &str) -> anyhow::Result<()> {
        let base_dir = get_base_dir(&config.workspace, base);
        let stats = docqa_knowledge::stats(&base_dir, base)
            .with_context(|| format!("knowledge base '{}' is not built", base))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Knowledge base: {}", stats.base_name);
            println!("  Passages:   {}", stats.documents);
            println!("  Dimensions: {}", stats.dimensions);
            println!("  Embedder:   {} ({})", stats.provider, stats.model);
            println!("  Built at:   {}", stats.built_at.to_rfc3339());
            println!("  Index size: {} bytes", stats.index_size_bytes);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::config::{LlmConfig, ProviderConfig};
    use docqa_knowledge::embeddings::providers::TrigramEmbedder;
    use docqa_knowledge::KnowledgeBase;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn trigram_embedding() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 32,
            batch_size: 8,
        }
    }

    #[tokio::test]
    async fn test_reset_with_unreachable_model_keeps_base() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("data.txt");
        fs::write(&source, "Rust has ownership.\nGo has goroutines.\n").unwrap();

        let base_dir = get_base_dir(temp.path(), "default");
        docqa_knowledge::build_knowledge_base(
            &[source.clone()],
            &TrigramEmbedder::new(32),
            &trigram_embedding(),
            &base_dir,
        )
        .await
        .unwrap();

        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };
        config.embedding.provider = "ollama".to_string();
        config.llm = Some(LlmConfig {
            active_provider: "ollama".to_string(),
            providers: HashMap::from([(
                "ollama".to_string(),
                ProviderConfig::Ollama {
                    endpoint: "http://127.0.0.1:1".to_string(),
                    model: "llama3.2".to_string(),
                    timeout: Some(1),
                },
            )]),
        });

        let cmd = IndexBuildCommand {
            sources: vec![source],
            reset: true,
            json: false,
        };
        assert!(cmd.execute(&config, "default").await.is_err());

        let kb = KnowledgeBase::open(&base_dir, &trigram_embedding()).unwrap();
        assert_eq!(kb.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_existing_base_requires_reset() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(get_base_dir(temp.path(), "default")).unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };

        let cmd = IndexBuildCommand {
            sources: vec![temp.path().join("data.txt")],
            reset: false,
            json: false,
        };
        let err = cmd.execute(&config, "default").await.unwrap_err();
        assert!(err.to_string().contains("--reset"));
    }
}
