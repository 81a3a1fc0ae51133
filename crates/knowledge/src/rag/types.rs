//! Answer types.

use serde::{Deserialize, Serialize};

/// Fixed refusal returned when retrieval finds nothing close enough or the
/// answer guard suppresses a generated answer.
pub const REFUSAL: &str = "I don't know based on the given data.";

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    /// Fixed greeting reply; retrieval and generation were skipped.
    Greeting,
    /// No passage passed the distance threshold.
    Refusal,
    /// Model output admitted by the guard.
    Generated,
    /// Model output replaced with the refusal by the guard.
    Suppressed,
}

/// Final answer for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
}

impl Answer {
    pub fn greeting(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: AnswerKind::Greeting,
        }
    }

    pub fn refusal() -> Self {
        Self {
            text: REFUSAL.to_string(),
            kind: AnswerKind::Refusal,
        }
    }

    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: AnswerKind::Generated,
        }
    }

    pub fn suppressed() -> Self {
        Self {
            text: REFUSAL.to_string(),
            kind: AnswerKind::Suppressed,
        }
    }
}
