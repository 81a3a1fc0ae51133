//! Embedding providers for passages and questions.
//!
//! The same provider, model and dimension must be used at build time and at
//! query time; [`EmbeddingConfig::validate_consistency`] enforces that against
//! the build manifest.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_embedder, Embedder};
