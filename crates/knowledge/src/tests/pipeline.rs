use super::fixtures::{
    service, service_with, FailingGenerator, FixtureEmbedder, ScriptedGenerator, PASSAGES,
};
use crate::rag::service::AnswerSettings;
use crate::rag::types::{AnswerKind, REFUSAL};
use docqa_core::config::PolicySettings;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_answer_from_context() {
    let generator = Arc::new(ScriptedGenerator::replying(
        "C++ is a general-purpose language.",
    ));
    let service = service(generator.clone());

    let answer = service.answer("what is C++?").await.unwrap();
    assert_eq!(answer.kind, AnswerKind::Generated);
    assert_eq!(answer.text, "C++ is a general-purpose language.");

    let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains(PASSAGES[0]));
    assert!(prompt.contains("Question:\nwhat is C++?\n"));
    assert!(prompt.contains(REFUSAL));
    assert_eq!(*generator.last_budget.lock().unwrap(), Some(120));
}

#[tokio::test]
async fn test_far_question_is_refused_without_generation() {
    let generator = Arc::new(ScriptedGenerator::replying("Paris."));
    let service = service(generator.clone());

    let answer = service
        .answer("What is the capital of France?")
        .await
        .unwrap();

    assert_eq!(answer.kind, AnswerKind::Refusal);
    assert_eq!(answer.text, "I don't know based on the given data.");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_greeting_skips_retrieval_and_generation() {
    let embedder = Arc::new(FixtureEmbedder::new());
    let generator = Arc::new(ScriptedGenerator::replying("unused"));
    let service = service_with(
        embedder.clone(),
        generator.clone(),
        PolicySettings::default(),
        AnswerSettings::default(),
    );

    let answer = service.answer("  Hello ").await.unwrap();

    assert_eq!(answer.kind, AnswerKind::Greeting);
    assert_eq!(answer.text, PolicySettings::default().greeting_reply);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_greeting_needs_exact_match() {
    let generator = Arc::new(ScriptedGenerator::replying("unused"));
    let service = service(generator);

    let answer = service.answer("hello there").await.unwrap();
    assert_ne!(answer.kind, AnswerKind::Greeting);
}

#[tokio::test]
async fn test_blocked_answer_is_suppressed() {
    let generator = Arc::new(ScriptedGenerator::replying(
        "React is a JavaScript library.",
    ));
    let service = service(generator);

    let answer = service.answer("tell me about c++").await.unwrap();
    assert_eq!(answer.kind, AnswerKind::Suppressed);
    assert_eq!(answer.text, REFUSAL);
}

#[tokio::test]
async fn test_blocked_answer_admitted_when_filter_disabled() {
    let generator = Arc::new(ScriptedGenerator::replying(
        "React is a JavaScript library.",
    ));
    let policy = PolicySettings {
        safety_filter: false,
        ..Default::default()
    };
    let service = service_with(
        Arc::new(FixtureEmbedder::new()),
        generator,
        policy,
        AnswerSettings::default(),
    );

    let answer = service.answer("tell me about c++").await.unwrap();
    assert_eq!(answer.kind, AnswerKind::Generated);
    assert_eq!(answer.text, "React is a JavaScript library.");
}

#[tokio::test]
async fn test_generation_error_is_not_a_refusal() {
    let service = service(Arc::new(FailingGenerator));

    let err = service.answer("what is C++?").await.unwrap_err();
    assert!(err.is_generation_failure());
}

#[tokio::test]
async fn test_answers_are_repeatable() {
    let generator = Arc::new(ScriptedGenerator::replying("C++ is a language."));
    let service = service(generator.clone());

    let first = service.answer_question("what is C++?").await.unwrap();
    let second = service.answer_question("what is C++?").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_large_top_k_uses_every_passage() {
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let settings = AnswerSettings {
        top_k: 50,
        ..Default::default()
    };
    let service = service_with(
        Arc::new(FixtureEmbedder::new()),
        generator.clone(),
        PolicySettings::default(),
        settings,
    );

    service.answer("what is C++?").await.unwrap();

    let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
    assert!(PASSAGES.iter().all(|p| prompt.contains(p)));
}

#[tokio::test]
async fn test_zero_threshold_refuses_near_miss() {
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let settings = AnswerSettings {
        threshold: 0.0,
        ..Default::default()
    };
    let service = service_with(
        Arc::new(FixtureEmbedder::new()),
        generator,
        PolicySettings::default(),
        settings,
    );

    let answer = service.answer("what is C++?").await.unwrap();
    assert_eq!(answer.kind, AnswerKind::Refusal);
}
