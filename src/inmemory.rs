//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] is backed by a `HashMap` protected by a
//! `tokio::sync::RwLock`. It is suitable for development, testing, and
//! small corpora, and serves as the reference implementation of the
//! [`VectorStore`] ordering and atomicity contracts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{QueryResult, StoredRecord};
use crate::error::{RagError, Result};
use crate::filter::MetadataFilter;
use crate::vectorstore::VectorStore;

/// A record plus the monotonic sequence number of its last upsert, used to
/// break equal-similarity ties in favor of the most recent write.
#[derive(Debug, Clone)]
struct SeqRecord {
    seq: u64,
    record: StoredRecord,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, SeqRecord>,
    next_seq: u64,
}

/// An in-memory [`VectorStore`] using cosine similarity for search.
///
/// All operations take a single `RwLock`, which makes
/// [`replace_source`](VectorStore::replace_source) trivially atomic with
/// respect to concurrent queries.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(1536);
/// store.upsert(&records).await?;
/// ```
#[derive(Debug)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
    dimensions: usize,
}

impl InMemoryVectorStore {
    /// Create a new empty store configured for the given embedding dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { inner: RwLock::new(Inner::default()), dimensions }
    }

    fn check_dimensions(&self, records: &[StoredRecord]) -> Result<()> {
        for record in records {
            if record.embedding.len() != self.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: record.embedding.len(),
                });
            }
        }
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl Inner {
    fn insert_all(&mut self, records: &[StoredRecord]) {
        for record in records {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.records.insert(record.id.clone(), SeqRecord { seq, record: record.clone() });
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, records: &[StoredRecord]) -> Result<()> {
        self.check_dimensions(records)?;
        let mut inner = self.inner.write().await;
        inner.insert_all(records);
        Ok(())
    }

    async fn delete_by_source(&self, source_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.records.retain(|_, sr| sr.record.source_id() != Some(source_id));
        Ok(())
    }

    async fn replace_source(&self, source_id: &str, records: &[StoredRecord]) -> Result<()> {
        self.check_dimensions(records)?;
        // Delete and insert under one write guard so readers never observe
        // a partially replaced source.
        let mut inner = self.inner.write().await;
        inner.records.retain(|_, sr| sr.record.source_id() != Some(source_id));
        inner.insert_all(records);
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<QueryResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let inner = self.inner.read().await;
        let mut scored: Vec<(u64, QueryResult)> = inner
            .records
            .values()
            .filter(|sr| filter.matches(&sr.record.metadata))
            .map(|sr| {
                let score = cosine_similarity(&sr.record.embedding, embedding);
                (sr.seq, QueryResult { record: sr.record.clone(), score })
            })
            .collect();

        // Descending score; equal scores resolved by most recent upsert.
        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_b.cmp(seq_a))
        });
        scored.truncate(top_k);
        Ok(scored.into_iter().map(|(_, result)| result).collect())
    }
}
