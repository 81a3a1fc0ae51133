//! Command handlers for the docqa CLI.

pub mod ask;
pub mod chat;
pub mod index;
pub mod serve;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use serve::ServeCommand;

/// Reply for a blank question. Blank questions never reach retrieval.
pub const EMPTY_QUESTION_REPLY: &str = "Please provide a question.";

/// Trimmed question, or `None` when nothing is left.
pub fn non_blank(question: &str) -> Option<&str> {
    let trimmed = question.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
