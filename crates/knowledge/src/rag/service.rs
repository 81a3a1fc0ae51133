//! Question answering pipeline.
//!
//! ```text
//! question ─▶ greeting? ──yes──▶ greeting reply
//!                │ no
//!                ▼
//!            retrieve ──no match──▶ refusal
//!                │ match
//!                ▼
//!         render prompt ─▶ generate ─▶ guard ─▶ answer | refusal
//! ```

use crate::config::get_base_dir;
use crate::embeddings::{create_embedder, Embedder, EmbeddingConfig};
use crate::exclusive::Exclusive;
use crate::index::KnowledgeBase;
use crate::rag::generator::{AnswerGenerator, LlmAnswerGenerator};
use crate::rag::policy::{ResponsePolicy, Verdict};
use crate::rag::retriever::Retriever;
use crate::rag::types::{Answer, REFUSAL};
use crate::types::RetrievalOutcome;
use crate::vector_index::VectorIndex;
use docqa_core::config::{GenerationSettings, RetrievalSettings};
use docqa_core::{AppConfig, AppResult};
use docqa_llm::create_client;
use docqa_prompt::{build_qa_prompt, load_prompt_or_default, PromptDefinition, STRICT_QA_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Tunables applied to every question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerSettings {
    pub top_k: usize,
    pub threshold: f32,
    pub max_new_tokens: u32,
}

impl AnswerSettings {
    pub fn from_config(retrieval: &RetrievalSettings, generation: &GenerationSettings) -> Self {
        Self {
            top_k: retrieval.top_k,
            threshold: retrieval.threshold,
            max_new_tokens: generation.max_new_tokens,
        }
    }
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self::from_config(&RetrievalSettings::default(), &GenerationSettings::default())
    }
}

/// Ready-to-serve question answering service.
///
/// Holds every loaded resource; build it once with [`QaService::start`] and
/// share it behind an `Arc`.
pub struct QaService {
    retriever: Retriever,
    generator: Arc<dyn AnswerGenerator>,
    policy: ResponsePolicy,
    prompt: PromptDefinition,
    settings: AnswerSettings,
}

impl QaService {
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn AnswerGenerator>,
        policy: ResponsePolicy,
        prompt: PromptDefinition,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            retriever,
            generator,
            policy,
            prompt,
            settings,
        }
    }

    /// Load models and the knowledge base named `base`.
    ///
    /// Fails if any model is unreachable or the stored artifacts are missing
    /// or inconsistent; no partially ready service is ever returned.
    pub async fn start(config: &AppConfig, base: &str) -> AppResult<Self> {
        config.validate()?;

        let endpoint = config.ollama_endpoint();
        let timeout = config.provider_timeout("ollama").map(Duration::from_secs);
        let embedding = EmbeddingConfig::from_settings(&config.embedding);

        tracing::info!(
            base,
            embedding_model = %embedding.model,
            model = %config.model,
            "Starting question answering service"
        );

        let base_dir = get_base_dir(&config.workspace, base);
        let kb = KnowledgeBase::open(&base_dir, &embedding)?;

        let embedder = create_embedder(&embedding, endpoint, timeout).await?;

        let client = create_client(&config.provider, Some(endpoint), timeout)?;
        client.health_check(&config.model).await?;
        let generator: Arc<dyn AnswerGenerator> = Arc::new(
            LlmAnswerGenerator::new(client, config.model.clone())
                .with_temperature(config.generation.temperature),
        );

        let (embedder, generator) = if config.runtime.serialize_inference {
            tracing::debug!("Serializing inference calls");
            let lock = Arc::new(Mutex::new(()));
            let embedder: Arc<dyn Embedder> = Arc::new(Exclusive::with_lock(embedder, lock.clone()));
            let generator: Arc<dyn AnswerGenerator> =
                Arc::new(Exclusive::with_lock(generator, lock));
            (embedder, generator)
        } else {
            (embedder, generator)
        };

        let prompt = load_prompt_or_default(&config.workspace, STRICT_QA_PROMPT_ID)?;

        let index: Arc<dyn VectorIndex> = Arc::new(kb.index);
        let retriever = Retriever::new(embedder, index, Arc::new(kb.documents));

        tracing::info!(
            documents = retriever.document_count(),
            "Question answering service ready"
        );

        Ok(Self::new(
            retriever,
            generator,
            ResponsePolicy::from_settings(&config.policy),
            prompt,
            AnswerSettings::from_config(&config.retrieval, &config.generation),
        ))
    }

    pub fn settings(&self) -> AnswerSettings {
        self.settings
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `question`, reporting how the answer was produced.
    pub async fn answer(&self, question: &str) -> AppResult<Answer> {
        let result = self.answer_inner(question).await;

        match &result {
            Ok(answer) => tracing::debug!(kind = ?answer.kind, "Answered question"),
            Err(e) if e.is_integrity_failure() => {
                tracing::error!("Knowledge base integrity failure: {}", e)
            }
            Err(e) => tracing::warn!("Failed to answer question: {}", e),
        }

        result
    }

    /// Answer `question` and return only the text.
    pub async fn answer_question(&self, question: &str) -> AppResult<String> {
        Ok(self.answer(question).await?.text)
    }

    async fn answer_inner(&self, question: &str) -> AppResult<Answer> {
        if let Some(reply) = self.policy.greeting(question) {
            return Ok(Answer::greeting(reply));
        }

        let outcome = self
            .retriever
            .retrieve(question, self.settings.top_k, self.settings.threshold)
            .await?;

        let context = match outcome {
            RetrievalOutcome::NoMatch { closest_distance } => {
                tracing::info!(?closest_distance, "No passage close enough, refusing");
                return Ok(Answer::refusal());
            }
            RetrievalOutcome::Match { context, .. } => context,
        };

        let prompt = build_qa_prompt(&self.prompt, &context, question, REFUSAL)?;
        let text = self
            .generator
            .generate(&prompt.user, self.settings.max_new_tokens)
            .await?;

        match self.policy.review(question, &context, &text) {
            Verdict::Admit => Ok(Answer::generated(text)),
            Verdict::Suppress { .. } => Ok(Answer::suppressed()),
        }
    }
}

impl std::fmt::Debug for QaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaService")
            .field("retriever", &self.retriever)
            .field("policy", &self.policy)
            .field("prompt", &self.prompt.id)
            .field("settings", &self.settings)
            .finish()
    }
}
