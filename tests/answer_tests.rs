//! Answer synthesis: no-context marker, bounded assembly, and source
//! accounting after truncation.

mod common;

use std::sync::Arc;

use docrag::{AnswerSynthesizer, NO_CONTEXT_MARKER, QueryResult, RetrievedContext};

use common::{EchoGenerator, hash_embedding, record};

const DIM: usize = 8;

fn result(source_id: &str, index: usize, content: &str, score: f32) -> QueryResult {
    QueryResult {
        record: record(source_id, index, content, "Local", hash_embedding(content, DIM)),
        score,
    }
}

#[tokio::test]
async fn empty_context_is_flagged_not_fabricated() {
    let generator = Arc::new(EchoGenerator::new());
    let synthesizer = AnswerSynthesizer::new(generator.clone(), 1000);

    let answer =
        synthesizer.answer("what is the budget?", &RetrievedContext::default()).await.unwrap();

    assert!(answer.used_sources.is_empty());
    let context = generator.last_context.lock().unwrap().clone().unwrap();
    assert_eq!(context, NO_CONTEXT_MARKER);
}

#[tokio::test]
async fn all_chunks_fit_within_a_generous_bound() {
    let generator = Arc::new(EchoGenerator::new());
    let synthesizer = AnswerSynthesizer::new(generator.clone(), 10_000);

    let context: RetrievedContext = vec![
        result("doc1", 0, "alpha", 0.9),
        result("doc2", 0, "beta", 0.8),
    ]
    .into();

    let answer = synthesizer.answer("question", &context).await.unwrap();
    assert_eq!(answer.used_sources, vec!["doc1", "doc2"]);

    let text = generator.last_context.lock().unwrap().clone().unwrap();
    assert!(text.contains("alpha"));
    assert!(text.contains("beta"));
    assert!(text.contains("[source: doc1"));
}

#[tokio::test]
async fn truncation_drops_lowest_similarity_first() {
    let generator = Arc::new(EchoGenerator::new());
    // Each entry is roughly 45 characters; two fit, the third does not.
    let synthesizer = AnswerSynthesizer::new(generator.clone(), 100);

    let context: RetrievedContext = vec![
        result("doc1", 0, "best chunk", 0.9),
        result("doc2", 0, "middle one", 0.5),
        result("doc3", 0, "worst, gets dropped", 0.1),
    ]
    .into();

    let answer = synthesizer.answer("question", &context).await.unwrap();

    // Exactly the surviving chunks are reported as sources.
    assert_eq!(answer.used_sources, vec!["doc1", "doc2"]);
    let text = generator.last_context.lock().unwrap().clone().unwrap();
    assert!(text.contains("best chunk"));
    assert!(text.contains("middle one"));
    assert!(!text.contains("worst"));
}

#[tokio::test]
async fn duplicate_sources_are_reported_once() {
    let generator = Arc::new(EchoGenerator::new());
    let synthesizer = AnswerSynthesizer::new(generator, 10_000);

    let context: RetrievedContext = vec![
        result("doc1", 0, "first chunk", 0.9),
        result("doc1", 1, "second chunk of same doc", 0.8),
        result("doc2", 0, "other doc", 0.7),
    ]
    .into();

    let answer = synthesizer.answer("question", &context).await.unwrap();
    assert_eq!(answer.used_sources, vec!["doc1", "doc2"]);
}

#[tokio::test]
async fn oversized_best_chunk_is_truncated_not_dropped() {
    let generator = Arc::new(EchoGenerator::new());
    let synthesizer = AnswerSynthesizer::new(generator.clone(), 50);

    let long = "x".repeat(500);
    let context: RetrievedContext = vec![result("doc1", 0, &long, 0.9)].into();

    let answer = synthesizer.answer("question", &context).await.unwrap();
    assert_eq!(answer.used_sources, vec!["doc1"]);

    let text = generator.last_context.lock().unwrap().clone().unwrap();
    assert_eq!(text.chars().count(), 50);
}
