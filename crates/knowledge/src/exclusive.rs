//! Serialized access to inference backends.
//!
//! Local model servers may not handle concurrent requests well. Wrapping the
//! embedder and generator in [`Exclusive`] with one shared lock makes every
//! inference call run alone, while retrieval over the in-memory index stays
//! concurrent.

use crate::embeddings::Embedder;
use crate::rag::generator::AnswerGenerator;
use docqa_core::AppResult;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs calls to `inner` one at a time under a (possibly shared) lock.
pub struct Exclusive<T: ?Sized> {
    inner: Arc<T>,
    lock: Arc<Mutex<()>>,
}

impl<T: ?Sized> Exclusive<T> {
    /// Wrap `inner` with its own lock.
    pub fn new(inner: Arc<T>) -> Self {
        Self::with_lock(inner, Arc::new(Mutex::new(())))
    }

    /// Wrap `inner` with a lock shared with other wrappers.
    pub fn with_lock(inner: Arc<T>, lock: Arc<Mutex<()>>) -> Self {
        Self { inner, lock }
    }
}

impl<T: ?Sized> std::fmt::Debug for Exclusive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exclusive").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<T: Embedder + ?Sized> Embedder for Exclusive<T> {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn encode_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let _guard = self.lock.lock().await;
        self.inner.encode_batch(texts).await
    }
}

#[async_trait::async_trait]
impl<T: AnswerGenerator + ?Sized> AnswerGenerator for Exclusive<T> {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> AppResult<String> {
        let _guard = self.lock.lock().await;
        self.inner.generate(prompt, max_new_tokens).await
    }
}
