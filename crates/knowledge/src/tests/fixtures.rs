//! Deterministic test doubles for the answering pipeline.

use crate::documents::DocumentStore;
use crate::embeddings::Embedder;
use crate::rag::generator::AnswerGenerator;
use crate::rag::policy::ResponsePolicy;
use crate::rag::retriever::Retriever;
use crate::rag::service::{AnswerSettings, QaService};
use crate::vector_index::FlatL2Index;
use docqa_core::config::PolicySettings;
use docqa_core::{AppError, AppResult};
use docqa_prompt::PromptDefinition;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PASSAGES: [&str; 3] = [
    "C++ is a general-purpose programming language created by Bjarne Stroustrup.",
    "Rust is a systems programming language focused on memory safety.",
    "Go is a statically typed language designed at Google.",
];

/// Embeds known texts to fixed vectors and everything else far away.
#[derive(Debug)]
pub struct FixtureEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    pub calls: AtomicUsize,
}

impl FixtureEmbedder {
    pub fn new() -> Self {
        let mut vectors = HashMap::new();
        vectors.insert(PASSAGES[0].to_string(), vec![1.0, 0.0, 0.0]);
        vectors.insert(PASSAGES[1].to_string(), vec![0.0, 1.0, 0.0]);
        vectors.insert(PASSAGES[2].to_string(), vec![0.0, 0.0, 1.0]);
        vectors.insert("what is C++?".to_string(), vec![0.9, 0.1, 0.0]);
        vectors.insert("what is flask".to_string(), vec![0.9, 0.1, 0.0]);
        vectors.insert("tell me about c++".to_string(), vec![0.9, 0.1, 0.0]);
        Self {
            vectors,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Embedder for FixtureEmbedder {
    fn provider_name(&self) -> &str {
        "fixture"
    }

    fn model_name(&self) -> &str {
        "fixture-v1"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn encode_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| vec![-1.0, -1.0, -1.0])
            })
            .collect())
    }
}

/// Returns a fixed reply and records what it was asked.
#[derive(Default)]
pub struct ScriptedGenerator {
    reply: String,
    pub calls: AtomicUsize,
    pub last_prompt: Mutex<Option<String>>,
    pub last_budget: Mutex<Option<u32>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        *self.last_budget.lock().unwrap() = Some(max_new_tokens);
        Ok(self.reply.clone())
    }
}

/// Always fails like a crashed model server.
pub struct FailingGenerator;

#[async_trait::async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _max_new_tokens: u32) -> AppResult<String> {
        Err(AppError::Generation("model server went away".to_string()))
    }
}

pub fn documents() -> DocumentStore {
    DocumentStore::from_passages(PASSAGES.iter().map(|p| p.to_string()).collect())
}

pub fn index() -> FlatL2Index {
    FlatL2Index::build(
        3,
        &[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
    )
    .unwrap()
}

pub fn retriever(embedder: Arc<FixtureEmbedder>) -> Retriever {
    Retriever::new(embedder, Arc::new(index()), Arc::new(documents()))
}

pub fn service_with(
    embedder: Arc<FixtureEmbedder>,
    generator: Arc<dyn AnswerGenerator>,
    policy: PolicySettings,
    settings: AnswerSettings,
) -> QaService {
    QaService::new(
        retriever(embedder),
        generator,
        ResponsePolicy::from_settings(&policy),
        PromptDefinition::strict_qa(),
        settings,
    )
}

pub fn service(generator: Arc<dyn AnswerGenerator>) -> QaService {
    service_with(
        Arc::new(FixtureEmbedder::new()),
        generator,
        PolicySettings::default(),
        AnswerSettings::default(),
    )
}
