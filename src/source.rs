//! Document sources: listing and text extraction per storage backend.
//!
//! The ingestion pipeline never branches on storage type; each backend
//! implements [`DocumentSource`] and the pipeline works against the trait.
//! Real format parsing (Word, PDF, spreadsheets) is a collaborator concern:
//! the built-in [`LocalSource`] handles plain-text formats and reports
//! everything else as `UnsupportedFormat`, which the pipeline records per
//! document without aborting the batch.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tracing::debug;

use crate::document::{DocumentRef, Metadata, StorageType, TextDocument};
use crate::error::{RagError, Result};

/// A storage backend that can enumerate documents and extract their text.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// The storage type this source serves.
    fn storage_type(&self) -> StorageType;

    /// Enumerate the documents this source currently holds.
    async fn list_documents(&self) -> Result<Vec<DocumentRef>>;

    /// Extract the plain text of one document.
    async fn extract_text(&self, doc: &DocumentRef) -> Result<TextDocument>;
}

/// Document-level metadata shared by every source implementation.
pub(crate) fn document_metadata(doc: &DocumentRef) -> Metadata {
    Metadata::from([
        ("source_type".to_string(), doc.storage_type.to_string()),
        ("storage_type".to_string(), doc.storage_type.to_string()),
        ("source_id".to_string(), doc.source_id.clone()),
        ("title".to_string(), doc.title.clone()),
    ])
}

/// Map a file extension to the MIME type used in document metadata.
fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

/// Whether the built-in extractor can read this MIME type directly.
fn is_text_mime(mime_type: &str) -> bool {
    matches!(mime_type, "text/plain" | "text/markdown" | "text/csv")
}

/// A [`DocumentSource`] over a local directory tree.
///
/// Listing walks the tree recursively; extraction reads plain-text files.
/// Binary office formats and PDFs are listed (so the report names them) but
/// extraction fails with `UnsupportedFormat`.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
    storage_label: Option<String>,
}

impl LocalSource {
    /// Create a source rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), storage_label: None }
    }

    /// Override the `storage_type` metadata tag stamped on extracted
    /// documents. Defaults to `Local`. Retrieval filters match against this
    /// tag, so ingesting with a custom label partitions the corpus.
    pub fn with_storage_label(mut self, label: impl Into<String>) -> Self {
        self.storage_label = Some(label.into());
        self
    }

    fn document_ref(path: &Path) -> DocumentRef {
        let extension =
            path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
        let revision = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs().to_string());

        DocumentRef {
            storage_type: StorageType::Local,
            source_id: path.to_string_lossy().into_owned(),
            title: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: mime_for_extension(&extension).to_string(),
            revision,
        }
    }

    fn walk(dir: &Path, refs: &mut Vec<DocumentRef>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::walk(&path, refs)?;
            } else {
                refs.push(Self::document_ref(&path));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentSource for LocalSource {
    fn storage_type(&self) -> StorageType {
        StorageType::Local
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        if !self.root.is_dir() {
            return Err(RagError::NotFound(format!(
                "directory '{}' does not exist",
                self.root.display()
            )));
        }

        let mut refs = Vec::new();
        Self::walk(&self.root, &mut refs).map_err(|e| RagError::SourceUnavailable {
            source_id: self.root.to_string_lossy().into_owned(),
            message: e.to_string(),
        })?;
        refs.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        debug!(root = %self.root.display(), count = refs.len(), "listed local documents");
        Ok(refs)
    }

    async fn extract_text(&self, doc: &DocumentRef) -> Result<TextDocument> {
        if !is_text_mime(&doc.mime_type) {
            return Err(RagError::UnsupportedFormat {
                source_id: doc.source_id.clone(),
                mime_type: doc.mime_type.clone(),
            });
        }

        let text = tokio::fs::read_to_string(&doc.source_id).await.map_err(|e| {
            RagError::SourceUnavailable { source_id: doc.source_id.clone(), message: e.to_string() }
        })?;

        let mut metadata = document_metadata(doc);
        if let Some(label) = &self.storage_label {
            metadata.insert("storage_type".to_string(), label.clone());
        }

        Ok(TextDocument { metadata, source: doc.clone(), text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docrag-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn extraction_stamps_default_storage_type() {
        let dir = scratch_dir("local-default");
        std::fs::write(dir.join("a.txt"), "hello").unwrap();

        let source = LocalSource::new(&dir);
        let refs = source.list_documents().await.unwrap();
        let document = source.extract_text(&refs[0]).await.unwrap();
        assert_eq!(document.metadata.get("storage_type"), Some(&"Local".to_string()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn storage_label_overrides_the_tag() {
        let dir = scratch_dir("local-label");
        std::fs::write(dir.join("a.txt"), "hello").unwrap();

        let source = LocalSource::new(&dir).with_storage_label("Archive");
        let refs = source.list_documents().await.unwrap();
        let document = source.extract_text(&refs[0]).await.unwrap();
        assert_eq!(document.metadata.get("storage_type"), Some(&"Archive".to_string()));
        // The source id stays the file path regardless of the tag.
        assert_eq!(document.metadata.get("source_id"), Some(&refs[0].source_id));

        std::fs::remove_dir_all(&dir).ok();
    }
}
