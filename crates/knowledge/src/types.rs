//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One search hit: squared L2 distance and the document position it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Squared Euclidean distance to the query (>= 0)
    pub distance: f32,

    /// Position in the document store
    pub position: usize,
}

/// Everything computed for one question, discarded after answering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// The question as asked
    pub question: String,

    /// Top-k hits, ascending by distance
    pub neighbors: Vec<Neighbor>,

    /// Distance of the best hit, if the index is non-empty
    pub closest_distance: Option<f32>,

    /// Newline-joined passages in hit order
    pub context: String,
}

/// Result of the retrieval gate.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// The best hit is farther than the threshold (or the index is empty).
    NoMatch { closest_distance: Option<f32> },

    /// The best hit passed the threshold; all top-k passages form the context.
    Match {
        context: String,
        neighbors: Vec<Neighbor>,
    },
}

impl RetrievalOutcome {
    /// Whether retrieval produced a context.
    pub fn is_match(&self) -> bool {
        matches!(self, RetrievalOutcome::Match { .. })
    }
}

/// Persisted description of a built knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    /// Embedding provider used at build time
    pub provider: String,

    /// Embedding model used at build time
    pub model: String,

    /// Vector dimension
    pub dimensions: usize,

    /// Number of passages (and vectors)
    pub documents: usize,

    /// Build timestamp
    pub built_at: DateTime<Utc>,
}

/// Statistics of an offline build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub documents: usize,
    pub dimensions: usize,
    pub duration_secs: f64,
}

/// Statistics of a built knowledge base.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    pub base_name: String,
    pub documents: usize,
    pub dimensions: usize,
    pub provider: String,
    pub model: String,
    pub built_at: DateTime<Utc>,
    pub index_size_bytes: u64,
}
