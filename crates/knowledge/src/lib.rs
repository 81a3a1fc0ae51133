//! Knowledge base and retrieval-augmented question answering.
//!
//! A knowledge base is built offline from plain-text sources into a flat L2
//! vector index plus a passage listing. At runtime [`QaService`] embeds each
//! question, retrieves the nearest passages, and asks an LLM to answer from
//! that context only.

pub mod config;
pub mod documents;
pub mod embeddings;
pub mod exclusive;
pub mod index;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use documents::DocumentStore;
pub use embeddings::{create_embedder, Embedder, EmbeddingConfig};
pub use exclusive::Exclusive;
pub use index::{build_knowledge_base, collect_passages, stats, KnowledgeBase};
pub use rag::{Answer, AnswerKind, QaService, REFUSAL};
pub use types::{BaseStats, BuildStats, IndexManifest, Neighbor, QueryResult, RetrievalOutcome};
pub use vector_index::{FlatL2Index, VectorIndex};
