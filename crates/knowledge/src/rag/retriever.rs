//! Question embedding, nearest-neighbour search and context assembly.

use crate::documents::DocumentStore;
use crate::embeddings::Embedder;
use crate::types::{Neighbor, QueryResult, RetrievalOutcome};
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Finds the passages closest to a question.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    documents: Arc<DocumentStore>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        documents: Arc<DocumentStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            documents,
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    async fn search(&self, question: &str, top_k: usize) -> AppResult<Vec<Neighbor>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.encode(question).await?;
        if query.len() != self.index.dimension() {
            return Err(AppError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: query.len(),
            });
        }

        self.index.search(&query, top_k)
    }

    /// Join the passages of `neighbors` with newlines, in the given order.
    fn assemble_context(&self, neighbors: &[Neighbor]) -> AppResult<String> {
        let passages = neighbors
            .iter()
            .map(|n| self.documents.get(n.position))
            .collect::<AppResult<Vec<&str>>>()?;
        Ok(passages.join("\n"))
    }

    /// Full retrieval record for `question`, without threshold gating.
    pub async fn query(&self, question: &str, top_k: usize) -> AppResult<QueryResult> {
        let neighbors = self.search(question, top_k).await?;
        let context = self.assemble_context(&neighbors)?;

        Ok(QueryResult {
            question: question.to_string(),
            closest_distance: neighbors.first().map(|n| n.distance),
            neighbors,
            context,
        })
    }

    /// Retrieve context for `question`.
    ///
    /// Only the best hit is compared against `threshold`; when it passes,
    /// every one of the top-k passages goes into the context.
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        threshold: f32,
    ) -> AppResult<RetrievalOutcome> {
        let neighbors = self.search(question, top_k).await?;

        let closest = match neighbors.first() {
            Some(best) => best.distance,
            None => {
                tracing::debug!("Index is empty, nothing to retrieve");
                return Ok(RetrievalOutcome::NoMatch {
                    closest_distance: None,
                });
            }
        };

        if closest > threshold {
            tracing::debug!(
                closest_distance = closest,
                threshold,
                "Best passage is beyond threshold"
            );
            return Ok(RetrievalOutcome::NoMatch {
                closest_distance: Some(closest),
            });
        }

        let context = self.assemble_context(&neighbors)?;
        tracing::debug!(
            closest_distance = closest,
            passages = neighbors.len(),
            "Retrieved context"
        );

        Ok(RetrievalOutcome::Match { context, neighbors })
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedder", &self.embedder)
            .field("dimension", &self.index.dimension())
            .field("documents", &self.documents.len())
            .finish()
    }
}
