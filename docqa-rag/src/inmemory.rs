//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps records in a `HashMap` behind a
//! `tokio::sync::RwLock`. Nothing survives the process; use
//! [`SqliteVectorStore`](crate::SqliteVectorStore) for a durable index.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexedRecord, RetrievalResult};
use crate::error::Result;
use crate::vectorstore::{VectorStore, cosine_similarity, rank};

/// An in-memory vector store keyed by record id.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, IndexedRecord>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        "InMemory"
    }

    async fn replace_file(&self, file_id: &str, records: &[IndexedRecord]) -> Result<usize> {
        let mut map = self.records.write().await;
        map.retain(|_, r| r.metadata.file_id != file_id);
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        file_id: Option<&str>,
    ) -> Result<Vec<RetrievalResult>> {
        let map = self.records.read().await;
        let scored = map
            .values()
            .filter(|r| file_id.is_none_or(|id| r.metadata.file_id == id))
            .map(|r| RetrievalResult {
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                score: cosine_similarity(&r.embedding, embedding),
            })
            .collect();
        Ok(rank(scored, top_k))
    }

    async fn count(&self, file_id: Option<&str>) -> Result<usize> {
        let map = self.records.read().await;
        Ok(map.values().filter(|r| file_id.is_none_or(|id| r.metadata.file_id == id)).count())
    }

    async fn delete_file(&self, file_id: &str) -> Result<usize> {
        let mut map = self.records.write().await;
        let before = map.len();
        map.retain(|_, r| r.metadata.file_id != file_id);
        Ok(before - map.len())
    }

    async fn reset(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
