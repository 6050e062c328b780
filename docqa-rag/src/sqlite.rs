//! SQLite-backed vector store.
//!
//! One table per collection (`rag_{collection}`) holding the chunk text, its
//! JSON metadata and the embedding as a little-endian `f32` blob. Search is
//! brute-force cosine similarity over the candidate rows.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use tracing::{debug, error};

use crate::document::{ChunkMetadata, IndexedRecord, RetrievalResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, cosine_similarity, rank};

const BACKEND: &str = "SQLite";

/// A durable [`VectorStore`] in a single SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteVectorStore {
    /// Open (creating if missing) the database at `path` and the table for
    /// `collection`.
    pub async fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!(path = %parent.display(), error = %e, "failed to create database directory");
                RagError::VectorStore {
                    backend: BACKEND.to_string(),
                    message: format!("failed to create '{}': {e}", parent.display()),
                }
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(Self::map_err)?;

        Self::with_pool(pool, collection).await
    }

    /// A private in-memory database, mostly for tests.
    pub async fn in_memory(collection: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(Self::map_err)?;
        // Every connection to `:memory:` is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(Self::map_err)?;
        Self::with_pool(pool, collection).await
    }

    /// Use an existing pool.
    pub async fn with_pool(pool: SqlitePool, collection: &str) -> Result<Self> {
        let table = Self::sanitize_table_name(collection)?;
        let store = Self { pool, table };
        store.init_schema().await?;
        Ok(store)
    }

    /// The table backing this collection.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn map_err(e: sqlx::Error) -> RagError {
        error!(backend = BACKEND, error = %e, "sqlite operation failed");
        RagError::VectorStore { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn sanitize_table_name(name: &str) -> Result<String> {
        let sanitized: String = name
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if sanitized.is_empty() {
            return Err(RagError::VectorStore {
                backend: BACKEND.to_string(),
                message: "collection name is empty after sanitization".to_string(),
            });
        }
        Ok(format!("rag_{sanitized}"))
    }

    async fn init_schema(&self) -> Result<()> {
        let create = format!(
            "CREATE TABLE IF NOT EXISTS \"{t}\" (
                id TEXT PRIMARY KEY,
                file_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{{}}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
            t = self.table
        );
        sqlx::query(&create).execute(&self.pool).await.map_err(Self::map_err)?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS \"idx_{t}_file\" ON \"{t}\"(file_id)",
            t = self.table
        );
        sqlx::query(&index).execute(&self.pool).await.map_err(Self::map_err)?;
        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_result(row: &SqliteRow, query: &[f32]) -> Result<RetrievalResult> {
        let content: String = row.try_get("content").map_err(Self::map_err)?;
        let metadata_str: String = row.try_get("metadata").map_err(Self::map_err)?;
        let blob: Vec<u8> = row.try_get("embedding").map_err(Self::map_err)?;

        let metadata: ChunkMetadata = serde_json::from_str(&metadata_str).map_err(|e| {
            RagError::VectorStore {
                backend: BACKEND.to_string(),
                message: format!("corrupt metadata: {e}"),
            }
        })?;
        let score = cosine_similarity(query, &Self::deserialize_embedding(&blob));
        Ok(RetrievalResult { content, metadata, score })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn replace_file(&self, file_id: &str, records: &[IndexedRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;

        let delete = format!("DELETE FROM \"{}\" WHERE file_id = ?1", self.table);
        sqlx::query(&delete).bind(file_id).execute(&mut *tx).await.map_err(Self::map_err)?;

        let insert = format!(
            "INSERT OR REPLACE INTO \"{}\" (id, file_id, chunk_index, content, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table
        );
        for record in records {
            let metadata = serde_json::to_string(&record.metadata).map_err(|e| {
                RagError::VectorStore {
                    backend: BACKEND.to_string(),
                    message: format!("failed to serialize metadata: {e}"),
                }
            })?;
            sqlx::query(&insert)
                .bind(&record.id)
                .bind(&record.metadata.file_id)
                .bind(record.metadata.chunk_index as i64)
                .bind(&record.content)
                .bind(&metadata)
                .bind(Self::serialize_embedding(&record.embedding))
                .execute(&mut *tx)
                .await
                .map_err(Self::map_err)?;
        }

        tx.commit().await.map_err(Self::map_err)?;
        debug!(table = %self.table, file_id, records = records.len(), "replaced file records");
        Ok(records.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        file_id: Option<&str>,
    ) -> Result<Vec<RetrievalResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows = match file_id {
            Some(file_id) => {
                let sql = format!(
                    "SELECT content, metadata, embedding FROM \"{}\" WHERE file_id = ?1",
                    self.table
                );
                sqlx::query(&sql).bind(file_id).fetch_all(&self.pool).await
            }
            None => {
                let sql = format!("SELECT content, metadata, embedding FROM \"{}\"", self.table);
                sqlx::query(&sql).fetch_all(&self.pool).await
            }
        }
        .map_err(Self::map_err)?;

        let scored = rows
            .iter()
            .map(|row| Self::row_to_result(row, embedding))
            .collect::<Result<Vec<_>>>()?;
        Ok(rank(scored, top_k))
    }

    async fn count(&self, file_id: Option<&str>) -> Result<usize> {
        let count: i64 = match file_id {
            Some(file_id) => {
                let sql = format!("SELECT COUNT(*) FROM \"{}\" WHERE file_id = ?1", self.table);
                sqlx::query_scalar::<_, i64>(&sql).bind(file_id).fetch_one(&self.pool).await
            }
            None => {
                let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
                sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await
            }
        }
        .map_err(Self::map_err)?;
        Ok(count.max(0) as usize)
    }

    async fn delete_file(&self, file_id: &str) -> Result<usize> {
        let sql = format!("DELETE FROM \"{}\" WHERE file_id = ?1", self.table);
        let result =
            sqlx::query(&sql).bind(file_id).execute(&self.pool).await.map_err(Self::map_err)?;
        Ok(result.rows_affected() as usize)
    }

    async fn reset(&self) -> Result<()> {
        let sql = format!("DELETE FROM \"{}\"", self.table);
        sqlx::query(&sql).execute(&self.pool).await.map_err(Self::map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_sanitized() {
        assert_eq!(SqliteVectorStore::sanitize_table_name("documents").unwrap(), "rag_documents");
        assert_eq!(SqliteVectorStore::sanitize_table_name("my-docs v2").unwrap(), "rag_my_docs_v2");
        assert!(SqliteVectorStore::sanitize_table_name("   ").is_err());
    }

    #[test]
    fn embedding_blob_round_trips() {
        let v = vec![0.5f32, -1.25, 3.0];
        let blob = SqliteVectorStore::serialize_embedding(&v);
        assert_eq!(blob.len(), 12);
        assert_eq!(SqliteVectorStore::deserialize_embedding(&blob), v);
    }
}
