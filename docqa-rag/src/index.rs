//! Chunk storage and similarity search over a [`VectorStore`].

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::document::{IndexedRecord, PreparedChunk, RetrievalResult, RetrievedChunk, StoreOutcome};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Writes embedded chunks and answers similarity queries.
///
/// Search never fails: any embedding or store error is logged and comes back
/// as an empty result, so callers take their "nothing found" path.
#[derive(Clone)]
pub struct DocumentIndex {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
}

impl DocumentIndex {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Store one file's prepared chunks with their embeddings, replacing any
    /// records the file already had.
    ///
    /// `embeddings[i]` belongs to `chunks[i]`. An empty chunk list is not an
    /// error: it yields `success = false` and touches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStore`] if the counts differ or the write
    /// fails.
    pub async fn store_chunks(
        &self,
        file_id: &str,
        chunks: &[PreparedChunk],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<StoreOutcome> {
        if chunks.is_empty() {
            return Ok(StoreOutcome {
                file_id: file_id.to_string(),
                stored_count: 0,
                success: false,
                message: "No chunks to store".to_string(),
            });
        }
        if chunks.len() != embeddings.len() {
            error!(
                file_id,
                chunks = chunks.len(),
                embeddings = embeddings.len(),
                "chunk/embedding count mismatch"
            );
            return Err(RagError::VectorStore {
                backend: self.store.backend().to_string(),
                message: format!(
                    "{} chunks but {} embeddings for file '{file_id}'",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let records: Vec<IndexedRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedRecord {
                id: IndexedRecord::record_id(file_id, chunk.metadata.chunk_index),
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            })
            .collect();

        let stored_count = self.store.replace_file(file_id, &records).await.map_err(|e| {
            error!(file_id, backend = self.store.backend(), error = %e, "failed to store chunks");
            e
        })?;

        info!(file_id, stored_count, backend = self.store.backend(), "stored chunks");
        Ok(StoreOutcome {
            file_id: file_id.to_string(),
            stored_count,
            success: true,
            message: format!("Stored {stored_count} chunks"),
        })
    }

    /// Embed `query` and search, surfacing failures as
    /// [`RagError::Retrieval`].
    pub async fn try_search(
        &self,
        query: &str,
        k: usize,
        file_id: Option<&str>,
    ) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self
            .embedder
            .embed_query(query)
            .await
            .map_err(|e| RagError::Retrieval(format!("query embedding failed: {e}")))?;
        let results = self
            .store
            .search(&embedding, k, file_id)
            .await
            .map_err(|e| RagError::Retrieval(format!("search failed: {e}")))?;
        debug!(k, file_id = ?file_id, hits = results.len(), "similarity search");
        Ok(results)
    }

    /// The `k` most similar chunks with their scores, most similar first.
    /// Empty on any failure.
    pub async fn similarity_search_with_scores(
        &self,
        query: &str,
        k: usize,
        file_id: Option<&str>,
    ) -> Vec<RetrievalResult> {
        match self.try_search(query, k, file_id).await {
            Ok(results) => results,
            Err(e) => {
                warn!(file_id = ?file_id, error = %e, "retrieval failed, returning no results");
                Vec::new()
            }
        }
    }

    /// The `k` most similar chunks, most similar first. Empty on any failure.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        file_id: Option<&str>,
    ) -> Vec<RetrievedChunk> {
        self.similarity_search_with_scores(query, k, file_id)
            .await
            .into_iter()
            .map(RetrievedChunk::from)
            .collect()
    }

    pub async fn count(&self, file_id: Option<&str>) -> Result<usize> {
        self.store.count(file_id).await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<usize> {
        let removed = self.store.delete_file(file_id).await?;
        info!(file_id, removed, "deleted file records");
        Ok(removed)
    }

    /// Drop every record in the collection.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset().await?;
        warn!(backend = self.store.backend(), "vector store reset");
        Ok(())
    }
}
