//! Prompt builder for rendering the question-answering template.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build the answering prompt from retrieved context and the user's question.
///
/// Context and question are embedded verbatim; no escaping is applied.
///
/// # Example
/// ```
/// use docqa_prompt::{build_qa_prompt, PromptDefinition};
///
/// let built = build_qa_prompt(
///     &PromptDefinition::strict_qa(),
///     "Rust guarantees memory safety.",
///     "What does Rust guarantee?",
///     "I don't know based on the given data.",
/// )
/// .unwrap();
/// assert!(built.user.contains("Rust guarantees memory safety."));
/// ```
pub fn build_qa_prompt(
    definition: &PromptDefinition,
    context: &str,
    question: &str,
    refusal: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("context".to_string(), context.to_string());
    variables.insert("question".to_string(), question.to_string());
    variables.insert("refusal".to_string(), refusal.to_string());

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(rendered, definition.id.clone(), variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text: context may contain `<`, `&` or quotes
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFUSAL: &str = "I don't know based on the given data.";

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_strict_prompt_layout() {
        let context = "C++ is a systems language.\nGo has goroutines.";
        let built = build_qa_prompt(
            &PromptDefinition::strict_qa(),
            context,
            "what is C++?",
            REFUSAL,
        )
        .unwrap();

        let expected = "You are a domain question answering assistant.
Use ONLY the context below.
If the answer is not clearly present in the context, reply exactly:
I don't know based on the given data.

Context:
C++ is a systems language.
Go has goroutines.

Question:
what is C++?

Answer:
";
        assert_eq!(built.user, expected);
        assert_eq!(built.metadata.source_prompt_id, "qa.strict");
        assert_eq!(
            built.metadata.resolved_variables.get("question").map(String::as_str),
            Some("what is C++?")
        );
    }

    #[test]
    fn test_context_is_not_escaped() {
        let built = build_qa_prompt(
            &PromptDefinition::strict_qa(),
            "std::vector<int> & \"quotes\"",
            "what's <T>?",
            REFUSAL,
        )
        .unwrap();

        assert!(built.user.contains("std::vector<int> & \"quotes\""));
        assert!(built.user.contains("what's <T>?"));
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let def = PromptDefinition {
            template: "{{#if context}}unterminated".to_string(),
            ..PromptDefinition::strict_qa()
        };

        let err = build_qa_prompt(&def, "c", "q", REFUSAL).unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
    }
}
