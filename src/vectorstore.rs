//! Vector store trait for persisting and searching embedded records.

use async_trait::async_trait;

use crate::document::{QueryResult, StoredRecord};
use crate::error::Result;
use crate::filter::MetadataFilter;

/// A storage backend for embedded document chunks with similarity search.
///
/// The store is the single owner of persisted records. The ingestion
/// pipeline produces candidate records and requests upserts; the retrieval
/// engine only queries.
///
/// Implementations must:
///
/// - treat `upsert` as idempotent by record id (replace, never duplicate)
/// - reject embeddings whose length differs from [`dimensions`](VectorStore::dimensions)
///   with [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
/// - order `query` results by descending similarity, breaking ties by
///   upsert recency (most recent first)
/// - make [`replace_source`](VectorStore::replace_source) atomic with
///   respect to concurrent queries: a reader sees either the fully-old or
///   fully-new record set for that source, never a mix
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The embedding dimension this store is configured for.
    fn dimensions(&self) -> usize;

    /// Insert or replace records by id.
    async fn upsert(&self, records: &[StoredRecord]) -> Result<()>;

    /// Delete every record whose metadata `source_id` equals the given id.
    async fn delete_by_source(&self, source_id: &str) -> Result<()>;

    /// Atomically replace all records for a source with a new set.
    ///
    /// This is the re-ingestion unit: it prevents both orphaned stale chunks
    /// (a shrunk document leaving trailing ids behind) and mixed old/new
    /// states observed by concurrent readers.
    async fn replace_source(&self, source_id: &str, records: &[StoredRecord]) -> Result<()>;

    /// Return the `top_k` records nearest to `embedding`, restricted to
    /// records whose metadata satisfies `filter`.
    ///
    /// Scores are cosine similarity expressed as `1 - cosine_distance`.
    /// An empty corpus or a filter with no matches yields an empty `Vec`.
    /// Backends are not required to return the stored embedding on the
    /// result records; consumers must rely on the score, not the vector.
    async fn query(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<QueryResult>>;
}
