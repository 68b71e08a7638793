//! Ingestion pipeline: idempotency, reconciliation, partial-failure
//! isolation, dimension validation, and retry behavior.

mod common;

use std::sync::Arc;

use docrag::{
    ErrorKind, InMemoryVectorStore, IngestionPipeline, MetadataFilter, QueryResult, RagConfig,
    RagError, RecursiveChunker, RetryPolicy, VectorStore,
};

use common::{BrokenEmbedding, FlakyEmbedding, HashEmbedding, LyingEmbedding, StaticSource};

const DIM: usize = 16;

fn pipeline(
    store: Arc<InMemoryVectorStore>,
    embedder: Arc<dyn docrag::EmbeddingClient>,
) -> IngestionPipeline {
    let config = RagConfig::builder().chunk_size(40).chunk_overlap(10).build().unwrap();
    IngestionPipeline::builder()
        .config(config)
        .embedding_client(embedder)
        .vector_store(store)
        .chunker(Arc::new(RecursiveChunker::new(40, 10).unwrap()))
        .retry(RetryPolicy::none())
        .build()
        .unwrap()
}

async fn all_records(store: &InMemoryVectorStore) -> Vec<QueryResult> {
    store
        .query(&common::hash_embedding("probe", DIM), &MetadataFilter::new(), 1000)
        .await
        .unwrap()
}

#[tokio::test]
async fn failing_document_does_not_abort_the_batch() {
    let source = StaticSource::new();
    source.set_text("doc1", "contents of the first document");
    source.set_broken("doc2", "disk on fire");
    source.set_text("doc3", "contents of the third document");

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), Arc::new(HashEmbedding::new(DIM)));

    let report = pipeline.ingest_source(&source).await.unwrap();

    let mut succeeded = report.succeeded.clone();
    succeeded.sort();
    assert_eq!(succeeded, vec!["doc1", "doc3"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source_id, "doc2");
    assert_eq!(report.failed[0].kind, ErrorKind::SourceUnavailable);
    assert!(!report.is_success());

    // The documents around the failure made it into the store.
    let records = all_records(&store).await;
    let mut sources: Vec<&str> =
        records.iter().filter_map(|r| r.record.source_id()).collect();
    sources.sort();
    sources.dedup();
    assert_eq!(sources, vec!["doc1", "doc3"]);
}

#[tokio::test]
async fn reingesting_unchanged_document_overwrites_not_duplicates() {
    let source = StaticSource::new();
    source.set_text("doc1", &"All work and no play makes Jack a dull boy. ".repeat(5));

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), Arc::new(HashEmbedding::new(DIM)));

    pipeline.ingest_source(&source).await.unwrap();
    let first: Vec<String> =
        all_records(&store).await.iter().map(|r| r.record.id.clone()).collect();

    pipeline.ingest_source(&source).await.unwrap();
    let second: Vec<String> =
        all_records(&store).await.iter().map(|r| r.record.id.clone()).collect();

    let mut first_sorted = first.clone();
    first_sorted.sort();
    let mut second_sorted = second;
    second_sorted.sort();
    assert_eq!(first_sorted, second_sorted);
    assert!(!first.is_empty());
}

#[tokio::test]
async fn shrunk_document_leaves_no_orphaned_chunks() {
    let source = StaticSource::new();
    source.set_text("doc1", &"A long sentence that fills several chunks. ".repeat(8));

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), Arc::new(HashEmbedding::new(DIM)));

    pipeline.ingest_source(&source).await.unwrap();
    let before = all_records(&store).await.len();
    assert!(before > 1);

    source.set_text("doc1", "tiny now");
    pipeline.ingest_source(&source).await.unwrap();

    let records = all_records(&store).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.id, "doc1_0");
    assert_eq!(records[0].record.content, "tiny now");
}

#[tokio::test]
async fn embedding_failure_commits_nothing_for_that_document() {
    let source = StaticSource::new();
    source.set_text("doc1", "some text that would otherwise be stored");

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), Arc::new(BrokenEmbedding { dimensions: DIM }));

    let report = pipeline.ingest_source(&source).await.unwrap();

    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, ErrorKind::Embedding);
    assert!(all_records(&store).await.is_empty());
}

#[tokio::test]
async fn mismatched_dimensions_fail_at_build_time() {
    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let err = IngestionPipeline::builder()
        .config(RagConfig::default())
        .embedding_client(Arc::new(HashEmbedding::new(DIM * 2)))
        .vector_store(store)
        .chunker(Arc::new(RecursiveChunker::new(1000, 200).unwrap()))
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        RagError::DimensionMismatch { expected: DIM, actual } if actual == DIM * 2
    ));
}

#[tokio::test]
async fn lying_embedder_is_caught_before_upsert() {
    let source = StaticSource::new();
    source.set_text("doc1", "short text");

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let pipeline =
        pipeline(store.clone(), Arc::new(LyingEmbedding { reported: DIM, actual: DIM - 4 }));

    let report = pipeline.ingest_source(&source).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, ErrorKind::DimensionMismatch);
    assert!(all_records(&store).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_limits_are_retried_within_bounds() {
    let source = StaticSource::new();
    source.set_text("doc1", "text that embeds on the third attempt");

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let embedder = Arc::new(FlakyEmbedding::new(DIM, 2));
    let config = RagConfig::builder().chunk_size(100).chunk_overlap(0).build().unwrap();
    let pipeline = IngestionPipeline::builder()
        .config(config)
        .embedding_client(embedder.clone())
        .vector_store(store.clone())
        .chunker(Arc::new(RecursiveChunker::new(100, 0).unwrap()))
        .retry(RetryPolicy::new(3, std::time::Duration::from_millis(100)))
        .build()
        .unwrap();

    let report = pipeline.ingest_source(&source).await.unwrap();

    assert!(report.is_success());
    assert_eq!(embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(all_records(&store).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_fail_the_document() {
    let source = StaticSource::new();
    source.set_text("doc1", "text the rate limiter never lets through");

    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let embedder = Arc::new(FlakyEmbedding::new(DIM, 10));
    let config = RagConfig::builder().chunk_size(100).chunk_overlap(0).build().unwrap();
    let pipeline = IngestionPipeline::builder()
        .config(config)
        .embedding_client(embedder)
        .vector_store(store.clone())
        .chunker(Arc::new(RecursiveChunker::new(100, 0).unwrap()))
        .retry(RetryPolicy::new(2, std::time::Duration::from_millis(100)))
        .build()
        .unwrap();

    let report = pipeline.ingest_source(&source).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, ErrorKind::RateLimited);
    assert!(all_records(&store).await.is_empty());
}
