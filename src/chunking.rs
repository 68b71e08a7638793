//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] — slides a fixed character window with overlap
//! - [`RecursiveChunker`] — splits hierarchically by paragraphs, sentences,
//!   then words
//!
//! Both are deterministic: the same `(text, config)` always produces the
//! same chunk texts and indices, which is what keeps chunk ids stable across
//! re-ingestion.

use crate::document::{Chunk, TextDocument, chunk_id};
use crate::error::{RagError, Result};

/// A strategy for splitting extracted documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings; the pipeline attaches embeddings later. Chunk ids are derived
/// from `(source_id, index)` and must be deterministic.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &TextDocument) -> Vec<Chunk>;
}

/// Build a [`Chunk`] for the given span, inheriting document metadata and
/// adding the `chunk_index` field.
fn make_chunk(document: &TextDocument, index: usize, text: String) -> Chunk {
    let source_id = document.source.source_id.clone();
    let mut metadata = document.metadata.clone();
    metadata.insert("chunk_index".to_string(), index.to_string());
    Chunk { id: chunk_id(&source_id, index), text, index, source_id, metadata }
}

/// Validate a `(chunk_size, chunk_overlap)` pair.
fn validate_window(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Config(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Slides a window of `chunk_size` characters over the text, advancing by
/// `chunk_size - chunk_overlap` each step.
///
/// The final window may be shorter than `chunk_size` and is still emitted,
/// so no trailing text is dropped. Sizes are in characters, never bytes, so
/// multi-byte text is never split mid-code-point.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &TextDocument) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character boundary, including the end.
        let bounds: Vec<usize> = document
            .text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(document.text.len()))
            .collect();
        let char_count = bounds.len() - 1;

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            let span = document.text[bounds[start]..bounds[end]].to_string();
            chunks.push(make_chunk(document, index, span));
            index += 1;
            start += step;
        }

        chunks
    }
}

/// Splits text hierarchically: paragraphs, then sentences, then words.
///
/// Splits by paragraph separators (`\n\n`) first. Segments exceeding
/// `chunk_size` are split by sentence boundaries (`. `, `! `, `? `), then by
/// word boundaries, and finally by raw character windows as a last resort.
/// Short adjacent segments are merged back together up to `chunk_size`, and
/// each merged span starts with the trailing segments of the previous span,
/// up to `chunk_overlap` characters, so consecutive chunks share context.
///
/// This mirrors the splitting behavior of recursive character splitters in
/// common RAG toolkits and is the default chunker for document ingestion.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

/// Split text by a separator, then merge segments into spans that respect
/// `chunk_size`. Segments that still exceed `chunk_size` are split further
/// using the next-level separator.
///
/// When a span is flushed, its trailing segments are retained, up to
/// `chunk_overlap` characters, as the start of the next span.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.chars().count() <= chunk_size || separators.is_empty() {
        return split_by_size(text, chunk_size, chunk_overlap);
    }

    let separator = separators[0];
    let remaining_separators = &separators[1..];

    let segments: Vec<&str> = if separator == " " {
        text.split_inclusive(' ').collect()
    } else {
        split_keeping_separator(text, separator)
    };

    let mut spans = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut window_len = 0;

    for segment in segments {
        let segment_len = segment.chars().count();

        if window_len + segment_len > chunk_size && !window.is_empty() {
            flush_span(&mut spans, window.concat(), chunk_size, chunk_overlap, remaining_separators);
            // Keep trailing segments as the overlap for the next span.
            while window_len > chunk_overlap
                || (window_len + segment_len > chunk_size && window_len > 0)
            {
                window_len -= window[0].chars().count();
                window.remove(0);
            }
        }

        window.push(segment);
        window_len += segment_len;
    }

    if !window.is_empty() {
        flush_span(&mut spans, window.concat(), chunk_size, chunk_overlap, remaining_separators);
    }

    spans
}

/// Push a completed span, recursing into finer separators if it is too long.
fn flush_span(
    spans: &mut Vec<String>,
    span: String,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) {
    if span.chars().count() > chunk_size {
        spans.extend(split_and_merge(&span, chunk_size, chunk_overlap, separators));
    } else {
        spans.push(span);
    }
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character-window splitting with overlap, the last-resort level.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let step = chunk_size - chunk_overlap;
    let mut spans = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        spans.push(text[bounds[start]..bounds[end]].to_string());
        start += step;
    }

    spans
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &TextDocument) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let separators = ["\n\n", ". ", "! ", "? ", " "];
        let spans =
            split_and_merge(&document.text, self.chunk_size, self.chunk_overlap, &separators);

        spans
            .into_iter()
            .enumerate()
            .map(|(index, text)| make_chunk(document, index, text))
            .collect()
    }
}
