//! Offline knowledge base build and startup loading.

use crate::config::{get_documents_path, get_index_path, get_manifest_path};
use crate::documents::DocumentStore;
use crate::embeddings::{Embedder, EmbeddingConfig};
use crate::types::{BaseStats, BuildStats, IndexManifest};
use crate::vector_index::{FlatL2Index, VectorIndex};
use chrono::Utc;
use docqa_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Collect passages from `.txt` sources.
///
/// A source may be a file or a directory; directories are walked in sorted
/// order. Each non-empty trimmed line becomes one passage.
pub fn collect_passages(sources: &[PathBuf]) -> AppResult<Vec<String>> {
    let mut passages = Vec::new();

    for source in sources {
        if !source.exists() {
            return Err(AppError::Config(format!(
                "Source path does not exist: {:?}",
                source
            )));
        }

        let files: Vec<PathBuf> = if source.is_file() {
            vec![source.clone()]
        } else {
            WalkDir::new(source)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
                .collect()
        };

        for file in files {
            let text = fs::read_to_string(&file)?;
            let before = passages.len();
            passages.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
            tracing::debug!("Read {} passages from {:?}", passages.len() - before, file);
        }
    }

    Ok(passages)
}

/// Embed `sources` and write the three knowledge base artifacts into `out_dir`.
pub async fn build_knowledge_base(
    sources: &[PathBuf],
    embedder: &dyn Embedder,
    config: &EmbeddingConfig,
    out_dir: &Path,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    let passages = collect_passages(sources)?;
    if passages.is_empty() {
        return Err(AppError::Config(
            "No passages found in the given sources".to_string(),
        ));
    }

    tracing::info!(
        "Embedding {} passages with {} ({})",
        passages.len(),
        embedder.provider_name(),
        embedder.model_name()
    );

    let mut index = FlatL2Index::new(embedder.dimensions());
    for batch in passages.chunks(config.batch_size.max(1)) {
        let vectors = embedder.encode_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Embedder returned {} vectors for {} passages",
                vectors.len(),
                batch.len()
            )));
        }
        for vector in &vectors {
            index.add(vector)?;
        }
        tracing::debug!("Indexed {}/{} passages", index.len(), passages.len());
    }

    let documents = DocumentStore::from_passages(passages);
    let manifest = IndexManifest {
        provider: embedder.provider_name().to_string(),
        model: embedder.model_name().to_string(),
        dimensions: embedder.dimensions(),
        documents: documents.len(),
        built_at: Utc::now(),
    };

    let staging = sibling_dir(out_dir, "building")?;
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    if let Err(e) = write_artifacts(&staging, &index, &documents, &manifest) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }
    replace_dir(&staging, out_dir)?;

    let duration = start.elapsed();
    tracing::info!(
        "Built knowledge base in {:?}: {} passages in {:.2}s",
        out_dir,
        documents.len(),
        duration.as_secs_f64()
    );

    Ok(BuildStats {
        documents: documents.len(),
        dimensions: manifest.dimensions,
        duration_secs: duration.as_secs_f64(),
    })
}

fn write_artifacts(
    dir: &Path,
    index: &FlatL2Index,
    documents: &DocumentStore,
    manifest: &IndexManifest,
) -> AppResult<()> {
    index.save(&get_index_path(dir))?;
    documents.save(&get_documents_path(dir))?;
    fs::write(get_manifest_path(dir), serde_yaml::to_string(manifest)?)?;
    Ok(())
}

/// `<dir>.<suffix>` next to `dir`.
fn sibling_dir(dir: &Path, suffix: &str) -> AppResult<PathBuf> {
    let name = dir.file_name().ok_or_else(|| {
        AppError::Config(format!("Invalid knowledge base path: {:?}", dir))
    })?;
    let mut name = name.to_os_string();
    name.push(format!(".{}", suffix));
    Ok(dir.with_file_name(name))
}

/// Move a fully written `staging` directory into place at `target`.
///
/// An existing `target` is kept aside until the new one is in place and is
/// restored if the final rename fails.
fn replace_dir(staging: &Path, target: &Path) -> AppResult<()> {
    if !target.exists() {
        fs::rename(staging, target)?;
        return Ok(());
    }

    let previous = sibling_dir(target, "previous")?;
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }
    fs::rename(target, &previous)?;

    if let Err(e) = fs::rename(staging, target) {
        fs::rename(&previous, target)?;
        let _ = fs::remove_dir_all(staging);
        return Err(e.into());
    }

    fs::remove_dir_all(&previous)?;
    tracing::info!("Replaced knowledge base at {:?}", target);
    Ok(())
}

fn read_manifest(base_dir: &Path) -> AppResult<IndexManifest> {
    let path = get_manifest_path(base_dir);
    let contents = fs::read_to_string(&path)
        .map_err(|e| AppError::Startup(format!("Failed to read manifest {:?}: {}", path, e)))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Startup(format!("Invalid manifest {:?}: {}", path, e)))
}

/// A loaded knowledge base: vectors and passages with matching counts.
#[derive(Debug)]
pub struct KnowledgeBase {
    pub index: FlatL2Index,
    pub documents: DocumentStore,
    pub manifest: IndexManifest,
}

impl KnowledgeBase {
    /// Load all artifacts from `base_dir` and check them against each other
    /// and against the configured embedder.
    pub fn open(base_dir: &Path, embedding: &EmbeddingConfig) -> AppResult<Self> {
        if !base_dir.exists() {
            return Err(AppError::Startup(format!(
                "Knowledge base not found at {:?}. Run 'docqa index build' first.",
                base_dir
            )));
        }

        let manifest = read_manifest(base_dir)?;
        embedding.validate_consistency(&manifest)?;

        let index = FlatL2Index::load(&get_index_path(base_dir))?;
        let documents = DocumentStore::load(&get_documents_path(base_dir))?;

        if index.dimension() != manifest.dimensions {
            return Err(AppError::Startup(format!(
                "Index dimension {} does not match manifest dimension {}",
                index.dimension(),
                manifest.dimensions
            )));
        }

        if index.len() != documents.len() {
            return Err(AppError::Startup(format!(
                "Index holds {} vectors but {} passages were loaded",
                index.len(),
                documents.len()
            )));
        }

        tracing::info!(
            "Loaded knowledge base {:?}: {} passages, dimension {}",
            base_dir,
            documents.len(),
            index.dimension()
        );

        Ok(Self {
            index,
            documents,
            manifest,
        })
    }
}

/// Statistics for a built knowledge base.
pub fn stats(base_dir: &Path, base_name: &str) -> AppResult<BaseStats> {
    let manifest = read_manifest(base_dir)?;
    let index_size_bytes = fs::metadata(get_index_path(base_dir))
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(BaseStats {
        base_name: base_name.to_string(),
        documents: manifest.documents,
        dimensions: manifest.dimensions,
        provider: manifest.provider,
        model: manifest.model,
        built_at: manifest.built_at,
        index_size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramEmbedder;
    use tempfile::TempDir;

    fn trigram_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 32,
            batch_size: 2,
        }
    }

    fn write_sources(dir: &Path) -> PathBuf {
        let src = dir.join("data");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("b.txt"), "Rust has ownership.\n\n  Go has goroutines.  \n").unwrap();
        fs::write(src.join("a.txt"), "C++ has templates.\n").unwrap();
        fs::write(src.join("nested").join("c.txt"), "Zig has comptime.\n").unwrap();
        fs::write(src.join("notes.md"), "ignored\n").unwrap();
        src
    }

    #[test]
    fn test_collect_passages_sorted_and_trimmed() {
        let temp = TempDir::new().unwrap();
        let src = write_sources(temp.path());

        let passages = collect_passages(&[src]).unwrap();
        assert_eq!(
            passages,
            vec![
                "C++ has templates.",
                "Rust has ownership.",
                "Go has goroutines.",
                "Zig has comptime.",
            ]
        );
    }

    #[test]
    fn test_collect_missing_source() {
        assert!(collect_passages(&[PathBuf::from("/definitely/not/here")]).is_err());
    }

    #[tokio::test]
    async fn test_build_then_open() {
        let temp = TempDir::new().unwrap();
        let src = write_sources(temp.path());
        let out = temp.path().join("kb");
        let config = trigram_config();
        let embedder = TrigramEmbedder::new(config.dimensions);

        let stats = build_knowledge_base(&[src], &embedder, &config, &out)
            .await
            .unwrap();
        assert_eq!(stats.documents, 4);
        assert_eq!(stats.dimensions, 32);

        let kb = KnowledgeBase::open(&out, &config).unwrap();
        assert_eq!(kb.index.len(), 4);
        assert_eq!(kb.documents.get(1).unwrap(), "Rust has ownership.");
        assert_eq!(kb.manifest.provider, "trigram");

        let expected = embedder.encode("Rust has ownership.").await.unwrap();
        assert_eq!(kb.index.vector(1).unwrap(), expected.as_slice());

        let base_stats = super::stats(&out, "kb").unwrap();
        assert_eq!(base_stats.documents, 4);
        assert!(base_stats.index_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_build_without_passages_fails() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("empty");
        fs::create_dir_all(&src).unwrap();
        let config = trigram_config();
        let embedder = TrigramEmbedder::new(config.dimensions);

        let result =
            build_knowledge_base(&[src], &embedder, &config, &temp.path().join("kb")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_detects_count_mismatch() {
        let temp = TempDir::new().unwrap();
        let src = write_sources(temp.path());
        let out = temp.path().join("kb");
        let config = trigram_config();
        let embedder = TrigramEmbedder::new(config.dimensions);
        build_knowledge_base(&[src], &embedder, &config, &out)
            .await
            .unwrap();

        fs::write(get_documents_path(&out), "only one line\n").unwrap();

        let err = KnowledgeBase::open(&out, &config).unwrap_err();
        assert!(err.is_startup_failure());
        assert!(err.to_string().contains("4 vectors"));
    }

    #[tokio::test]
    async fn test_open_detects_model_change() {
        let temp = TempDir::new().unwrap();
        let src = write_sources(temp.path());
        let out = temp.path().join("kb");
        let config = trigram_config();
        let embedder = TrigramEmbedder::new(config.dimensions);
        build_knowledge_base(&[src], &embedder, &config, &out)
            .await
            .unwrap();

        let other = EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            ..config
        };
        let err = KnowledgeBase::open(&out, &other).unwrap_err();
        assert!(err.is_startup_failure());
    }

    #[test]
    fn test_open_missing_base() {
        let temp = TempDir::new().unwrap();
        let err = KnowledgeBase::open(&temp.path().join("none"), &trigram_config()).unwrap_err();
        assert!(err.is_startup_failure());
    }

    #[derive(Debug)]
    struct UnreachableEmbedder;

    #[async_trait::async_trait]
    impl Embedder for UnreachableEmbedder {
        fn provider_name(&self) -> &str {
            "trigram"
        }

        fn model_name(&self) -> &str {
            "trigram-v1"
        }

        fn dimensions(&self) -> usize {
            32
        }

        async fn encode_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::ModelUnavailable {
                model: "trigram-v1".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_existing_base() {
        let temp = TempDir::new().unwrap();
        let src = write_sources(temp.path());
        let out = temp.path().join("kb");
        let config = trigram_config();
        build_knowledge_base(&[src.clone()], &TrigramEmbedder::new(32), &config, &out)
            .await
            .unwrap();

        let result = build_knowledge_base(&[src], &UnreachableEmbedder, &config, &out).await;
        assert!(result.is_err());

        let kb = KnowledgeBase::open(&out, &config).unwrap();
        assert_eq!(kb.documents.len(), 4);
        assert!(!temp.path().join("kb.building").exists());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_existing_base() {
        let temp = TempDir::new().unwrap();
        let src = write_sources(temp.path());
        let out = temp.path().join("kb");
        let config = trigram_config();
        let embedder = TrigramEmbedder::new(config.dimensions);
        build_knowledge_base(&[src], &embedder, &config, &out)
            .await
            .unwrap();

        let other = temp.path().join("other.txt");
        fs::write(&other, "Haskell is lazy.\nOCaml is strict.\n").unwrap();
        let stats = build_knowledge_base(&[other], &embedder, &config, &out)
            .await
            .unwrap();
        assert_eq!(stats.documents, 2);

        let kb = KnowledgeBase::open(&out, &config).unwrap();
        assert_eq!(kb.documents.get(0).unwrap(), "Haskell is lazy.");
        assert_eq!(kb.index.len(), 2);
        assert!(!temp.path().join("kb.building").exists());
        assert!(!temp.path().join("kb.previous").exists());
    }

    #[test]
    fn test_sibling_dir() {
        let dir = Path::new("/ws/.docqa/knowledge/default");
        assert_eq!(
            sibling_dir(dir, "building").unwrap(),
            PathBuf::from("/ws/.docqa/knowledge/default.building")
        );
    }
}
