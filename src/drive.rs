//! Google Drive document source over the Drive REST v3 API.
//!
//! This module is only available when the `drive` feature is enabled.
//!
//! The source lists a folder's files (with pagination and MIME filtering),
//! exports Google-native documents as plain text, and downloads plain-text
//! files directly. The OAuth consent flow itself is out of scope: the source
//! takes a ready access token, either directly or from a token JSON file as
//! written by Google's client libraries.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::document::{DocumentRef, StorageType, TextDocument};
use crate::error::{RagError, Result};
use crate::source::{DocumentSource, document_metadata};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// MIME types of Google-native documents, exported via the export endpoint.
const GOOGLE_NATIVE_MIME_TYPES: &[&str] = &[
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.spreadsheet",
    "application/vnd.google-apps.presentation",
];

/// MIME types listed from a folder. Matches the set the CLI ingests.
const SUPPORTED_MIME_TYPES: &[&str] = &[
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.spreadsheet",
    "application/vnd.google-apps.presentation",
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
];

/// A [`DocumentSource`] over one Google Drive folder.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::drive::GoogleDriveSource;
///
/// let source = GoogleDriveSource::from_token_file("folder-id", "token.json")?;
/// let refs = source.list_documents().await?;
/// ```
pub struct GoogleDriveSource {
    client: reqwest::Client,
    access_token: String,
    folder_id: String,
}

#[derive(Deserialize)]
struct TokenFile {
    #[serde(alias = "token")]
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    modified_time: Option<String>,
}

impl GoogleDriveSource {
    /// Create a source for the given folder with a ready access token.
    pub fn new(folder_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(RagError::Auth {
                provider: "GoogleDrive".into(),
                message: "access token must not be empty".into(),
            });
        }
        Ok(Self { client: reqwest::Client::new(), access_token, folder_id: folder_id.into() })
    }

    /// Create a source reading the access token from a token JSON file
    /// (the `token.json` written by Google's OAuth client libraries).
    pub fn from_token_file(folder_id: impl Into<String>, path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RagError::Auth {
            provider: "GoogleDrive".into(),
            message: format!("failed to read token file '{path}': {e}"),
        })?;
        let token: TokenFile = serde_json::from_str(&raw).map_err(|e| RagError::Auth {
            provider: "GoogleDrive".into(),
            message: format!("failed to parse token file '{path}': {e}"),
        })?;
        Self::new(folder_id, token.access_token)
    }

    /// Map a non-success Drive response to the crate error taxonomy.
    async fn status_error(context: &str, response: reqwest::Response) -> RagError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(provider = "GoogleDrive", %status, context, "API error");

        match status.as_u16() {
            401 | 403 => RagError::Auth {
                provider: "GoogleDrive".into(),
                message: format!("{context}: {status}: {body}"),
            },
            404 => RagError::NotFound(format!("{context}: {body}")),
            429 => RagError::RateLimited {
                provider: "GoogleDrive".into(),
                message: format!("{context}: {body}"),
            },
            _ => RagError::SourceUnavailable {
                source_id: context.to_string(),
                message: format!("{status}: {body}"),
            },
        }
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<FileList> {
        let mime_clause = SUPPORTED_MIME_TYPES
            .iter()
            .map(|m| format!("mimeType='{m}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        let query =
            format!("'{}' in parents and ({mime_clause}) and trashed=false", self.folder_id);

        let mut request = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "nextPageToken, files(id, name, mimeType, modifiedTime)"),
            ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(|e| RagError::SourceUnavailable {
            source_id: self.folder_id.clone(),
            message: format!("request failed: {e}"),
        })?;

        if !response.status().is_success() {
            return Err(Self::status_error(&self.folder_id, response).await);
        }

        response.json().await.map_err(|e| RagError::SourceUnavailable {
            source_id: self.folder_id.clone(),
            message: format!("failed to parse file list: {e}"),
        })
    }

    /// Download a document's content as plain text.
    ///
    /// Google-native documents go through the export endpoint; plain-text
    /// files are downloaded with `alt=media`. Binary formats are refused —
    /// parsing them is a collaborator concern.
    async fn download_text(&self, doc: &DocumentRef) -> Result<String> {
        let request = if GOOGLE_NATIVE_MIME_TYPES.contains(&doc.mime_type.as_str()) {
            self.client
                .get(format!("{DRIVE_FILES_URL}/{}/export", doc.source_id))
                .query(&[("mimeType", "text/plain")])
        } else if doc.mime_type == "text/plain" {
            self.client
                .get(format!("{DRIVE_FILES_URL}/{}", doc.source_id))
                .query(&[("alt", "media")])
        } else {
            return Err(RagError::UnsupportedFormat {
                source_id: doc.source_id.clone(),
                mime_type: doc.mime_type.clone(),
            });
        };

        let response = request.bearer_auth(&self.access_token).send().await.map_err(|e| {
            RagError::SourceUnavailable {
                source_id: doc.source_id.clone(),
                message: format!("request failed: {e}"),
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::status_error(&doc.source_id, response).await);
        }

        response.text().await.map_err(|e| RagError::SourceUnavailable {
            source_id: doc.source_id.clone(),
            message: format!("failed to read body: {e}"),
        })
    }
}

#[async_trait]
impl DocumentSource for GoogleDriveSource {
    fn storage_type(&self) -> StorageType {
        StorageType::GoogleDrive
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        let mut refs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            refs.extend(page.files.into_iter().map(|f| DocumentRef {
                storage_type: StorageType::GoogleDrive,
                source_id: f.id,
                title: f.name,
                mime_type: f.mime_type,
                revision: f.modified_time,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(folder_id = %self.folder_id, count = refs.len(), "listed Drive documents");
        Ok(refs)
    }

    async fn extract_text(&self, doc: &DocumentRef) -> Result<TextDocument> {
        let text = self.download_text(doc).await?;
        Ok(TextDocument { metadata: document_metadata(doc), source: doc.clone(), text })
    }
}
