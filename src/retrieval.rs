//! Retrieval engine: question → query embedding → filtered similarity search.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::QueryResult;
use crate::embedding::EmbeddingClient;
use crate::error::{RagError, Result};
use crate::filter::MetadataFilter;
use crate::vectorstore::VectorStore;

/// An ordered, bounded sequence of retrieved records.
///
/// Results are in descending similarity order and there are at most
/// `match_count` of them. Empty is a valid state (empty corpus, or a filter
/// nothing matches), not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievedContext {
    results: Vec<QueryResult>,
}

impl RetrievedContext {
    /// The retrieved results, best match first.
    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    /// Number of retrieved records.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether retrieval found nothing.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over results, best match first.
    pub fn iter(&self) -> std::slice::Iter<'_, QueryResult> {
        self.results.iter()
    }
}

/// The retrieval query engine.
///
/// Embeds questions with the same client used for ingestion and runs
/// filtered nearest-neighbor queries against the store. Never mutates the
/// store. Construction validates that the embedding client and the store
/// agree on the embedding dimension, so a misconfiguration fails at startup
/// rather than at query time.
pub struct RetrievalEngine {
    embedding_client: Arc<dyn EmbeddingClient>,
    vector_store: Arc<dyn VectorStore>,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine").finish_non_exhaustive()
    }
}

impl RetrievalEngine {
    /// Create a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the embedding client and
    /// vector store disagree on the embedding dimension.
    pub fn new(
        embedding_client: Arc<dyn EmbeddingClient>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        if embedding_client.dimensions() != vector_store.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: vector_store.dimensions(),
                actual: embedding_client.dimensions(),
            });
        }
        Ok(Self { embedding_client, vector_store })
    }

    /// Retrieve the `match_count` best-matching records for a question.
    ///
    /// The filter is an exact subset-containment predicate: only records
    /// whose metadata contains every filter key with an equal value are
    /// returned. Ordering is descending similarity regardless of store
    /// defaults, enforced here so behavior is reproducible across backends.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `match_count` is zero (rejected
    /// before any I/O), or a store/embedding error. A query that matches
    /// nothing returns an empty context, not an error.
    pub async fn retrieve(
        &self,
        question: &str,
        filter: &MetadataFilter,
        match_count: usize,
    ) -> Result<RetrievedContext> {
        if match_count == 0 {
            return Err(RagError::Config("match_count must be greater than zero".to_string()));
        }

        let query_embedding = self.embedding_client.embed(question).await.map_err(|e| {
            error!(error = %e, "question embedding failed");
            e
        })?;

        let results =
            self.vector_store.query(&query_embedding, filter, match_count).await.map_err(
                |e| {
                    error!(error = %e, "vector store query failed");
                    e
                },
            )?;

        // Ordering and filtering are engine policy, not store behavior:
        // re-check both so every backend yields identical semantics.
        let mut results: Vec<QueryResult> =
            results.into_iter().filter(|r| filter.matches(&r.record.metadata)).collect();
        results.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(match_count);

        info!(result_count = results.len(), "retrieval completed");
        Ok(RetrievedContext { results })
    }
}

impl From<Vec<QueryResult>> for RetrievedContext {
    fn from(mut results: Vec<QueryResult>) -> Self {
        results.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { results }
    }
}
