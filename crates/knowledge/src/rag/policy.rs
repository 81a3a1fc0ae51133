//! Greeting short-circuit and post-generation answer guard.

use docqa_core::config::PolicySettings;
use std::collections::HashSet;
use std::sync::Arc;

/// Recognises greetings so they can be answered without retrieval.
#[derive(Debug, Clone)]
pub struct GreetingPolicy {
    greetings: HashSet<String>,
    reply: String,
}

impl GreetingPolicy {
    pub fn new<I, S>(greetings: I, reply: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            greetings: greetings
                .into_iter()
                .map(|g| g.as_ref().trim().to_lowercase())
                .collect(),
            reply: reply.into(),
        }
    }

    /// The greeting reply if `question` is exactly a greeting
    /// (after lowercasing and trimming).
    pub fn reply_to(&self, question: &str) -> Option<&str> {
        let normalized = question.trim().to_lowercase();
        self.greetings
            .contains(&normalized)
            .then_some(self.reply.as_str())
    }
}

/// Decision of an [`AnswerGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Suppress { reason: String },
}

/// Checks a generated answer before it is returned.
pub trait AnswerGuard: Send + Sync {
    fn name(&self) -> &str;

    fn admit(&self, question: &str, context: &str, answer: &str) -> Verdict;
}

/// Suppresses answers that start with an off-domain keyword unless the
/// question itself appears in the retrieved context.
#[derive(Debug, Clone)]
pub struct PrefixBlocklistGuard {
    prefixes: Vec<String>,
}

impl PrefixBlocklistGuard {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl AnswerGuard for PrefixBlocklistGuard {
    fn name(&self) -> &str {
        "prefix-blocklist"
    }

    fn admit(&self, question: &str, context: &str, answer: &str) -> Verdict {
        let answer = answer.to_lowercase();
        let Some(prefix) = self.prefixes.iter().find(|p| answer.starts_with(p.as_str())) else {
            return Verdict::Admit;
        };

        if context.to_lowercase().contains(&question.to_lowercase()) {
            return Verdict::Admit;
        }

        Verdict::Suppress {
            reason: format!("answer starts with blocked prefix '{}'", prefix),
        }
    }
}

/// Guard that admits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AnswerGuard for AllowAll {
    fn name(&self) -> &str {
        "allow-all"
    }

    fn admit(&self, _question: &str, _context: &str, _answer: &str) -> Verdict {
        Verdict::Admit
    }
}

/// Greeting handling plus the answer guard.
#[derive(Clone)]
pub struct ResponsePolicy {
    greeting: GreetingPolicy,
    guard: Arc<dyn AnswerGuard>,
}

impl ResponsePolicy {
    pub fn new(greeting: GreetingPolicy, guard: Arc<dyn AnswerGuard>) -> Self {
        Self { greeting, guard }
    }

    pub fn from_settings(settings: &PolicySettings) -> Self {
        let guard: Arc<dyn AnswerGuard> = if settings.safety_filter {
            Arc::new(PrefixBlocklistGuard::new(&settings.blocked_prefixes))
        } else {
            Arc::new(AllowAll)
        };

        Self::new(
            GreetingPolicy::new(&settings.greetings, settings.greeting_reply.clone()),
            guard,
        )
    }

    pub fn greeting(&self, question: &str) -> Option<&str> {
        self.greeting.reply_to(question)
    }

    pub fn review(&self, question: &str, context: &str, answer: &str) -> Verdict {
        let verdict = self.guard.admit(question, context, answer);
        if let Verdict::Suppress { reason } = &verdict {
            tracing::info!(guard = self.guard.name(), "Suppressed answer: {}", reason);
        }
        verdict
    }
}

impl std::fmt::Debug for ResponsePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsePolicy")
            .field("greeting", &self.greeting)
            .field("guard", &self.guard.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PrefixBlocklistGuard {
        PrefixBlocklistGuard::new(["flask", "react", "seo"])
    }

    #[test]
    fn test_greeting_exact_match_only() {
        let policy = GreetingPolicy::new(["hi", "Good Morning"], "Hello!");
        assert_eq!(policy.reply_to("  HI "), Some("Hello!"));
        assert_eq!(policy.reply_to("good morning"), Some("Hello!"));
        assert_eq!(policy.reply_to("hi there"), None);
        assert_eq!(policy.reply_to(""), None);
    }

    #[test]
    fn test_blocked_prefix_suppressed() {
        let verdict = guard().admit(
            "how do I build a website?",
            "C++ is a compiled language.",
            "Flask is a web framework.",
        );
        assert!(matches!(verdict, Verdict::Suppress { .. }));
    }

    #[test]
    fn test_blocked_prefix_admitted_when_question_in_context() {
        let verdict = guard().admit(
            "what is flask",
            "Some notes: What is Flask? A Python framework.",
            "Flask is a web framework.",
        );
        assert_eq!(verdict, Verdict::Admit);
    }

    #[test]
    fn test_prefix_must_lead_the_answer() {
        let verdict = guard().admit(
            "what is C++?",
            "C++ is a language.",
            "Unlike React, C++ is compiled.",
        );
        assert_eq!(verdict, Verdict::Admit);
    }

    #[test]
    fn test_from_settings_respects_safety_filter() {
        let mut settings = PolicySettings::default();
        settings.safety_filter = false;
        let policy = ResponsePolicy::from_settings(&settings);
        assert_eq!(
            policy.review("q", "ctx", "SEO tips for everyone"),
            Verdict::Admit
        );

        settings.safety_filter = true;
        let policy = ResponsePolicy::from_settings(&settings);
        assert!(matches!(
            policy.review("q", "ctx", "SEO tips for everyone"),
            Verdict::Suppress { .. }
        ));
        assert!(policy.greeting("hello").is_some());
    }
}
