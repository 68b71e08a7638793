//! Document ingestion and retrieval-augmented question answering.
//!
//! `docrag` ingests heterogeneous documents (local files and Google Drive
//! native formats), converts them into retrievable chunks with vector
//! embeddings, persists them in a vector store, and answers natural-language
//! questions by retrieving relevant chunks and passing them to a generation
//! model.
//!
//! The write path is [`IngestionPipeline`]: document → extracted text →
//! chunks → embeddings → idempotent, per-document-atomic upsert. The read
//! path is [`RetrievalEngine`] + [`AnswerSynthesizer`]: question → query
//! embedding → filtered similarity search → bounded, ranked context →
//! generated answer. The two paths share only the [`VectorStore`] and the
//! embedding contract.
//!
//! External collaborators — embedding and generation models, the vector
//! database, document listing and text extraction — sit behind the
//! [`EmbeddingClient`], [`Generator`], [`VectorStore`], and
//! [`DocumentSource`] traits, so test doubles substitute cleanly.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrag::{
//!     AnswerSynthesizer, IngestionPipeline, InMemoryVectorStore, MetadataFilter,
//!     RagConfig, RecursiveChunker, RetrievalEngine,
//! };
//!
//! let config = RagConfig::default();
//! let store = Arc::new(InMemoryVectorStore::new(embedder.dimensions()));
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(config.clone())
//!     .embedding_client(embedder.clone())
//!     .vector_store(store.clone())
//!     .chunker(Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?))
//!     .build()?;
//! let report = pipeline.ingest_source(&source).await?;
//!
//! let engine = RetrievalEngine::new(embedder, store)?;
//! let context = engine
//!     .retrieve("What is the budget for Project A?", &MetadataFilter::new(), 5)
//!     .await?;
//! let result = AnswerSynthesizer::new(generator, config.max_context_chars)
//!     .answer("What is the budget for Project A?", &context)
//!     .await?;
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
#[cfg(feature = "drive")]
pub mod drive;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod generation;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
pub mod pipeline;
pub mod retrieval;
pub mod retry;
pub mod source;
pub mod vectorstore;

pub use answer::{AnswerResult, AnswerSynthesizer, NO_CONTEXT_MARKER, render_prompt};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, DocumentRef, Metadata, QueryResult, StorageType, StoredRecord, TextDocument, chunk_id,
};
#[cfg(feature = "drive")]
pub use drive::GoogleDriveSource;
pub use embedding::EmbeddingClient;
pub use error::{ErrorKind, RagError, Result};
pub use filter::MetadataFilter;
pub use generation::Generator;
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "openai")]
pub use openai::{OpenAiEmbeddingClient, OpenAiGenerator};
#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
pub use pipeline::{
    IngestionFailure, IngestionPipeline, IngestionPipelineBuilder, IngestionReport,
};
pub use retrieval::{RetrievalEngine, RetrievedContext};
pub use retry::RetryPolicy;
pub use source::{DocumentSource, LocalSource};
pub use vectorstore::VectorStore;
