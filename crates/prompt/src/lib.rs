//! Prompt system for DocQA.
//!
//! This crate provides structured prompt management with:
//! - A built-in strict question-answering template
//! - YAML-based prompt overrides in `.docqa/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_qa_prompt;
pub use loader::{list_prompts, load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, STRICT_QA_PROMPT_ID};
