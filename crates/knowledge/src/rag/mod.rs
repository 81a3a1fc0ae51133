//! Retrieval-augmented question answering.

pub mod generator;
pub mod policy;
pub mod retriever;
pub mod service;
pub mod types;

pub use generator::{AnswerGenerator, LlmAnswerGenerator};
pub use policy::{AllowAll, AnswerGuard, GreetingPolicy, PrefixBlocklistGuard, ResponsePolicy, Verdict};
pub use retriever::Retriever;
pub use service::{AnswerSettings, QaService};
pub use types::{Answer, AnswerKind, REFUSAL};
