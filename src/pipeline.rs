//! Ingestion pipeline: document → text → chunks → embeddings → store.
//!
//! [`IngestionPipeline`] turns a set of [`DocumentRef`]s into upserted
//! records, tolerating partial failure across the batch: each document is
//! an independent unit of work, and one document's failure never aborts the
//! others. Re-ingestion is idempotent — deterministic chunk ids plus
//! atomic per-document replacement mean an unchanged document overwrites
//! itself and a shrunk document leaves no stale trailing chunks behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{IngestionPipeline, RagConfig};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_client(Arc::new(embedder))
//!     .vector_store(Arc::new(store))
//!     .chunker(Arc::new(chunker))
//!     .build()?;
//!
//! let report = pipeline.ingest_source(&source).await?;
//! ```

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, DocumentRef, StoredRecord};
use crate::embedding::EmbeddingClient;
use crate::error::{ErrorKind, RagError, Result};
use crate::retry::RetryPolicy;
use crate::source::DocumentSource;
use crate::vectorstore::VectorStore;

/// The outcome of one `ingest` run, enumerating per-document results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Source ids whose full chunk set was stored.
    pub succeeded: Vec<String>,
    /// Documents that failed, with the error category and message.
    pub failed: Vec<IngestionFailure>,
}

/// A single document's failure within an ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionFailure {
    /// The stable identifier of the failed document.
    pub source_id: String,
    /// The category of the error.
    pub kind: ErrorKind,
    /// A description of the failure.
    pub message: String,
}

impl IngestionReport {
    /// Total number of documents in the batch.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every document in the batch was stored.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The ingestion pipeline orchestrator.
///
/// Construct one via [`IngestionPipeline::builder()`]. The builder validates
/// at construction that the embedding client and vector store agree on the
/// embedding dimension, so a misconfiguration fails at startup rather than
/// mid-batch.
pub struct IngestionPipeline {
    config: RagConfig,
    embedding_client: Arc<dyn EmbeddingClient>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline").finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding client.
    pub fn embedding_client(&self) -> &Arc<dyn EmbeddingClient> {
        &self.embedding_client
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// List a source's documents and ingest all of them.
    ///
    /// Listing failures surface as an error; per-document failures are
    /// recorded in the report.
    pub async fn ingest_source(&self, source: &dyn DocumentSource) -> Result<IngestionReport> {
        let refs = source.list_documents().await?;
        info!(storage_type = %source.storage_type(), count = refs.len(), "listed documents");
        Ok(self.ingest(source, &refs).await)
    }

    /// Ingest the given documents, at most `worker_limit` concurrently.
    ///
    /// Documents are independent units: extraction, embedding, or store
    /// failures are recorded per document and the batch continues. Within
    /// one document, store replacement is atomic — concurrent readers see
    /// either the old or the new chunk set, never a mix — and nothing is
    /// committed for a document whose embedding partially failed.
    pub async fn ingest(
        &self,
        source: &dyn DocumentSource,
        refs: &[DocumentRef],
    ) -> IngestionReport {
        let outcomes: Vec<(String, Result<usize>)> = stream::iter(refs)
            .map(|doc| async move {
                let outcome = self.ingest_document(source, doc).await;
                (doc.source_id.clone(), outcome)
            })
            .buffer_unordered(self.config.worker_limit)
            .collect()
            .await;

        let mut report = IngestionReport::default();
        for (source_id, outcome) in outcomes {
            match outcome {
                Ok(chunk_count) => {
                    info!(source_id, chunk_count, "ingested document");
                    report.succeeded.push(source_id);
                }
                Err(e) => {
                    error!(source_id, error = %e, "failed to ingest document");
                    report.failed.push(IngestionFailure {
                        source_id,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "ingestion batch complete"
        );
        report
    }

    /// Ingest one document: extract → chunk → embed → replace records.
    ///
    /// Returns the number of chunks stored.
    async fn ingest_document(
        &self,
        source: &dyn DocumentSource,
        doc: &DocumentRef,
    ) -> Result<usize> {
        let document = source.extract_text(doc).await?;
        let chunks = self.chunker.chunk(&document);

        if chunks.is_empty() {
            // An empty document still clears its previous chunk set.
            self.vector_store.replace_source(&doc.source_id, &[]).await?;
            return Ok(0);
        }

        let records = self.embed_chunks(chunks).await?;
        self.vector_store.replace_source(&doc.source_id, &records).await?;
        Ok(records.len())
    }

    /// Embed a document's chunks as one batch and pair them into records.
    ///
    /// A failure for any chunk fails the whole document; partial embeddings
    /// are never committed.
    async fn embed_chunks(&self, mut chunks: Vec<Chunk>) -> Result<Vec<StoredRecord>> {
        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.metadata.insert("total_chunks".to_string(), total.to_string());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings =
            self.retry.run(|| self.embedding_client.embed_batch(&texts)).await?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: "batch".into(),
                message: format!(
                    "embedding batch returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let expected = self.vector_store.dimensions();
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredRecord {
                id: chunk.id,
                content: chunk.text,
                metadata: chunk.metadata,
                embedding,
            })
            .collect())
    }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// `config`, `embedding_client`, `vector_store`, and `chunker` are required;
/// the retry policy defaults to three attempts with 500ms base backoff.
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    embedding_client: Option<Arc<dyn EmbeddingClient>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    retry: Option<RetryPolicy>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding client.
    pub fn embedding_client(mut self, client: Arc<dyn EmbeddingClient>) -> Self {
        self.embedding_client = Some(client);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the retry policy for rate-limited collaborator calls.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the [`IngestionPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing, or
    /// [`RagError::DimensionMismatch`] if the embedding client and vector
    /// store disagree on the embedding dimension.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedding_client = self
            .embedding_client
            .ok_or_else(|| RagError::Config("embedding_client is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;

        if embedding_client.dimensions() != vector_store.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: vector_store.dimensions(),
                actual: embedding_client.dimensions(),
            });
        }

        Ok(IngestionPipeline {
            config,
            embedding_client,
            vector_store,
            chunker,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
