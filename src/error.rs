//! Error types for the `docrag` crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during ingestion, retrieval, or answer synthesis.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error. Rejected before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source document has a format no extractor can handle.
    #[error("Unsupported format for '{source_id}': {mime_type}")]
    UnsupportedFormat {
        /// The stable identifier of the document.
        source_id: String,
        /// The MIME type that could not be handled.
        mime_type: String,
    },

    /// The source document could not be read or downloaded.
    #[error("Source '{source_id}' unavailable: {message}")]
    SourceUnavailable {
        /// The stable identifier of the document.
        source_id: String,
        /// A description of the failure.
        message: String,
    },

    /// Authentication with an external collaborator failed.
    #[error("Authentication error ({provider}): {message}")]
    Auth {
        /// The collaborator that rejected the credentials.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A requested resource (folder, file) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator rejected the call due to rate limiting. Retryable.
    #[error("Rate limited ({provider}): {message}")]
    RateLimited {
        /// The collaborator that applied the limit.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer generation.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding's length does not match the store's configured dimension.
    ///
    /// Never silently truncated or padded.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the vector store is configured for.
        expected: usize,
        /// The dimension that was actually produced.
        actual: usize,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    Store {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Whether a bounded retry with backoff is worth attempting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::RateLimited { .. })
    }

    /// Classify this error for per-document reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Config(_) => ErrorKind::Config,
            RagError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            RagError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            RagError::Auth { .. } => ErrorKind::Auth,
            RagError::NotFound(_) => ErrorKind::NotFound,
            RagError::RateLimited { .. } => ErrorKind::RateLimited,
            RagError::Embedding { .. } => ErrorKind::Embedding,
            RagError::Generation { .. } => ErrorKind::Generation,
            RagError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            RagError::Store { .. } => ErrorKind::Store,
        }
    }
}

/// The category of a [`RagError`], used in ingestion reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    UnsupportedFormat,
    SourceUnavailable,
    Auth,
    NotFound,
    RateLimited,
    Embedding,
    Generation,
    DimensionMismatch,
    Store,
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
