//! Data types for document references, extracted text, chunks, and records.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key-value metadata attached to documents, chunks, and stored records.
pub type Metadata = HashMap<String, String>;

/// Where a source document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// A file on the local filesystem.
    Local,
    /// A file or native document in Google Drive.
    GoogleDrive,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Local => write!(f, "Local"),
            StorageType::GoogleDrive => write!(f, "GoogleDrive"),
        }
    }
}

/// A reference to a source document, sufficient to decide whether
/// re-ingestion is needed and to request extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRef {
    /// The storage backend holding the document.
    pub storage_type: StorageType,
    /// Stable source identifier: a file path or a Drive file ID.
    pub source_id: String,
    /// Human-readable title (file name or Drive document name).
    pub title: String,
    /// The original MIME type of the document.
    pub mime_type: String,
    /// A last-modified timestamp or revision marker, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

/// The extracted plain text of a [`DocumentRef`]. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextDocument {
    /// The reference this text was extracted from.
    pub source: DocumentRef,
    /// The full extracted text.
    pub text: String,
    /// Document-level metadata carried onto every chunk.
    pub metadata: Metadata,
}

/// A contiguous span of a [`TextDocument`]'s text, the unit of embedding
/// and retrieval. Chunks carry no embedding; the pipeline attaches one when
/// it builds a [`StoredRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Deterministic identifier derived from `(source_id, index)`.
    pub id: String,
    /// The chunk's text span.
    pub text: String,
    /// Position of this chunk within its document.
    pub index: usize,
    /// The stable identifier of the parent document.
    pub source_id: String,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: Metadata,
}

/// Derive the deterministic chunk identifier for `(source_id, index)`.
///
/// Re-ingesting an unchanged document reproduces identical ids, which is what
/// makes upserts overwrite instead of duplicate.
pub fn chunk_id(source_id: &str, index: usize) -> String {
    format!("{source_id}_{index}")
}

/// The persisted unit: a chunk's content and metadata plus its embedding.
///
/// Upsert by `id` replaces prior content and embedding for that id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    /// The chunk id this record was built from.
    pub id: String,
    /// The chunk's text.
    pub content: String,
    /// The chunk's metadata.
    pub metadata: Metadata,
    /// The embedding vector. On upsert its length must equal the store's
    /// configured dimension. Query results from backends that do not return
    /// vectors (pgvector) leave this empty.
    pub embedding: Vec<f32>,
}

impl StoredRecord {
    /// The `source_id` recorded in this record's metadata, if present.
    pub fn source_id(&self) -> Option<&str> {
        self.metadata.get("source_id").map(String::as_str)
    }
}

/// A retrieved [`StoredRecord`] paired with a similarity score.
///
/// Scores are cosine similarity expressed as `1 - cosine_distance`, higher
/// is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The retrieved record.
    pub record: StoredRecord,
    /// The similarity score.
    pub score: f32,
}
