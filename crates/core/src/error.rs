//! Error types for DocQA.
//!
//! This module defines a unified error enum covering configuration, startup,
//! data-integrity, embedding, generation and prompt failures. The variants
//! mirror how a failure must be treated by the serving pipeline:
//! startup failures are fatal, integrity failures fail a single request,
//! and generation failures are surfaced to the caller as a distinct outcome.

use thiserror::Error;

/// Unified error type for DocQA.
///
/// All fallible functions return `Result<T, AppError>`.
/// "No relevant context" is never an error; it is a designed answer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact or component failed to load; the service cannot become ready
    #[error("Startup failure: {0}")]
    Startup(String),

    /// A model could not be loaded or reached at startup
    #[error("Model '{model}' unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// Vector dimension differs from the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Document position outside the store
    #[error("Position {position} out of range for {count} documents")]
    OutOfRange { position: usize, count: usize },

    /// Embedding failed for a single request
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The generation model invocation failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// LLM provider transport errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error prevents the service from becoming ready.
    pub fn is_startup_failure(&self) -> bool {
        matches!(self, AppError::Startup(_) | AppError::ModelUnavailable { .. })
    }

    /// Whether this error came from the generation model.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, AppError::Generation(_))
    }

    /// Whether this error indicates inconsistent artifacts.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            AppError::DimensionMismatch { .. } | AppError::OutOfRange { .. }
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
