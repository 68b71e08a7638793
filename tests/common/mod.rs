//! Shared test doubles for pipeline, retrieval, and answer tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use docrag::{
    DocumentRef, DocumentSource, EmbeddingClient, Generator, Metadata, RagError, Result,
    StorageType, StoredRecord, TextDocument, chunk_id,
};

/// Deterministic hash-based embeddings: same text, same vector, unit norm.
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text, self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Build the deterministic embedding used by [`HashEmbedding`].
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    let mut emb = vec![0.0f32; dimensions];
    for (i, v) in emb.iter_mut().enumerate() {
        *v = ((hash.wrapping_add(i as u64)) as f32).sin();
    }
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}

/// Reports one dimension but produces another. For dimension-invariant tests.
pub struct LyingEmbedding {
    pub reported: usize,
    pub actual: usize,
}

#[async_trait]
impl EmbeddingClient for LyingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text, self.actual))
    }

    fn dimensions(&self) -> usize {
        self.reported
    }
}

/// Fails with `RateLimited` for the first `failures` calls, then succeeds.
pub struct FlakyEmbedding {
    inner: HashEmbedding,
    remaining_failures: AtomicU32,
    pub calls: AtomicU32,
}

impl FlakyEmbedding {
    pub fn new(dimensions: usize, failures: u32) -> Self {
        Self {
            inner: HashEmbedding::new(dimensions),
            remaining_failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    fn check_rate_limit(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RagError::RateLimited {
                provider: "test".into(),
                message: "simulated rate limit".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingClient for FlakyEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check_rate_limit()?;
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.check_rate_limit()?;
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(hash_embedding(text, self.inner.dimensions()));
        }
        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Always fails embedding with a non-retryable error.
pub struct BrokenEmbedding {
    pub dimensions: usize,
}

#[async_trait]
impl EmbeddingClient for BrokenEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "test".into(), message: "model is down".into() })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An in-memory [`DocumentSource`] with per-document text that can be
/// replaced between ingests and per-document forced failures.
pub struct StaticSource {
    texts: Mutex<HashMap<String, String>>,
    broken: Mutex<HashMap<String, String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self { texts: Mutex::new(HashMap::new()), broken: Mutex::new(HashMap::new()) }
    }

    /// Add or replace a document.
    pub fn set_text(&self, source_id: &str, text: &str) {
        self.texts.lock().unwrap().insert(source_id.to_string(), text.to_string());
        self.broken.lock().unwrap().remove(source_id);
    }

    /// Make extraction of a document fail with `SourceUnavailable`.
    pub fn set_broken(&self, source_id: &str, message: &str) {
        self.broken.lock().unwrap().insert(source_id.to_string(), message.to_string());
        self.texts.lock().unwrap().remove(source_id);
    }

    pub fn doc_ref(source_id: &str) -> DocumentRef {
        DocumentRef {
            storage_type: StorageType::Local,
            source_id: source_id.to_string(),
            title: format!("{source_id}.txt"),
            mime_type: "text/plain".to_string(),
            revision: None,
        }
    }

    pub fn refs(&self) -> Vec<DocumentRef> {
        let mut ids: Vec<String> = self
            .texts
            .lock()
            .unwrap()
            .keys()
            .chain(self.broken.lock().unwrap().keys())
            .cloned()
            .collect();
        ids.sort();
        ids.iter().map(|id| Self::doc_ref(id)).collect()
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn storage_type(&self) -> StorageType {
        StorageType::Local
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        Ok(self.refs())
    }

    async fn extract_text(&self, doc: &DocumentRef) -> Result<TextDocument> {
        if let Some(message) = self.broken.lock().unwrap().get(&doc.source_id) {
            return Err(RagError::SourceUnavailable {
                source_id: doc.source_id.clone(),
                message: message.clone(),
            });
        }

        let text = self.texts.lock().unwrap().get(&doc.source_id).cloned().ok_or_else(|| {
            RagError::NotFound(doc.source_id.clone())
        })?;

        let metadata = Metadata::from([
            ("source_type".to_string(), doc.storage_type.to_string()),
            ("storage_type".to_string(), doc.storage_type.to_string()),
            ("source_id".to_string(), doc.source_id.clone()),
            ("title".to_string(), doc.title.clone()),
        ]);
        Ok(TextDocument { source: doc.clone(), text, metadata })
    }
}

/// Records the context it was given and returns a canned answer.
pub struct EchoGenerator {
    pub last_context: Mutex<Option<String>>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self { last_context: Mutex::new(None) }
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, question: &str, context_text: &str) -> Result<String> {
        *self.last_context.lock().unwrap() = Some(context_text.to_string());
        Ok(format!("answer to: {question}"))
    }
}

/// Build a stored record whose metadata carries the usual source fields.
pub fn record(
    source_id: &str,
    index: usize,
    content: &str,
    storage_type: &str,
    embedding: Vec<f32>,
) -> StoredRecord {
    let metadata = Metadata::from([
        ("source_type".to_string(), storage_type.to_string()),
        ("storage_type".to_string(), storage_type.to_string()),
        ("source_id".to_string(), source_id.to_string()),
        ("title".to_string(), format!("{source_id}.txt")),
        ("chunk_index".to_string(), index.to_string()),
    ]);
    StoredRecord {
        id: chunk_id(source_id, index),
        content: content.to_string(),
        metadata,
        embedding,
    }
}
