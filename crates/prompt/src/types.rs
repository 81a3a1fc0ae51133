//! Prompt types for DocQA.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of the built-in question-answering prompt.
pub const STRICT_QA_PROMPT_ID: &str = "qa.strict";

const STRICT_QA_TEMPLATE: &str = "You are a domain question answering assistant.
Use ONLY the context below.
If the answer is not clearly present in the context, reply exactly:
{{refusal}}

Context:
{{context}}

Question:
{{question}}

Answer:
";

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Template string with Handlebars syntax.
    ///
    /// Receives `context`, `question` and `refusal`.
    pub template: String,
}

impl PromptDefinition {
    /// The canonical strict prompt: answer only from context, otherwise
    /// reply with the refusal string verbatim.
    pub fn strict_qa() -> Self {
        Self {
            id: STRICT_QA_PROMPT_ID.to_string(),
            title: "Strict context-only answering".to_string(),
            api_version: "1.0".to_string(),
            created_by: "docqa".to_string(),
            template: STRICT_QA_TEMPLATE.to_string(),
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Prompt text sent to the model
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        user: String,
        source_prompt_id: String,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}
