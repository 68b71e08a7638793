//! Embedding client trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A client that maps text to fixed-dimension vector embeddings.
///
/// Document chunks and questions must be embedded by the same client (same
/// model, same dimension); the pipeline and retrieval engine validate the
/// dimension against the vector store at construction time.
///
/// The default [`embed_batch`](EmbeddingClient::embed_batch) implementation
/// calls [`embed`](EmbeddingClient::embed) sequentially; backends with native
/// batching should override it to bound round trips.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimensionality of embeddings produced by this client.
    fn dimensions(&self) -> usize;
}
