//! Embedding generation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::document::{ChunkMetadata, IndexedRecord, PreparedChunk};
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, order-aligned
    /// with `texts`.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Wraps an [`EmbeddingProvider`], dropping blank inputs before any call.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed every non-blank text, trimmed. Returns one vector per non-blank
    /// input, in input order, and makes no call if nothing remains.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the provider fails or returns a
    /// different number of vectors than it was given texts.
    pub async fn embed<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<f32>>> {
        let valid: Vec<&str> =
            texts.iter().map(|t| t.as_ref().trim()).filter(|t| !t.is_empty()).collect();
        if valid.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = self.provider.name(), batch_size = valid.len(), "embedding texts");
        let vectors = self.provider.embed_batch(&valid).await.map_err(|e| {
            error!(provider = self.provider.name(), error = %e, "embedding failed");
            match e {
                RagError::Embedding { .. } => e,
                other => RagError::Embedding {
                    provider: self.provider.name().to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        if vectors.len() != valid.len() {
            error!(
                provider = self.provider.name(),
                expected = valid.len(),
                got = vectors.len(),
                "embedding count mismatch"
            );
            return Err(RagError::Embedding {
                provider: self.provider.name().to_string(),
                message: format!("expected {} embeddings, got {}", valid.len(), vectors.len()),
            });
        }
        Ok(vectors)
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[query]).await?;
        vectors.pop().ok_or_else(|| RagError::Embedding {
            provider: self.provider.name().to_string(),
            message: "query is empty".to_string(),
        })
    }
}

/// Pair each non-blank chunk with positional metadata.
///
/// `chunk_index` is the position in `chunks`, so indices skip over blank
/// chunks instead of being renumbered.
pub fn prepare_document_embeddings<S: AsRef<str>>(
    file_id: &str,
    chunks: &[S],
) -> Vec<PreparedChunk> {
    chunks
        .iter()
        .enumerate()
        .filter_map(|(i, chunk)| {
            let content = chunk.as_ref().trim();
            if content.is_empty() {
                return None;
            }
            Some(PreparedChunk {
                content: content.to_string(),
                metadata: ChunkMetadata {
                    file_id: file_id.to_string(),
                    chunk_index: i,
                    chunk_length: content.chars().count(),
                    source: Some(IndexedRecord::record_id(file_id, i)),
                },
            })
        })
        .collect()
}
