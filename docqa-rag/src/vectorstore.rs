//! Vector store trait for persisting records and searching them by
//! similarity.

use async_trait::async_trait;

use crate::document::{IndexedRecord, RetrievalResult};
use crate::error::Result;

/// A storage backend for indexed chunk records scoped to one collection.
///
/// Records are keyed by [`IndexedRecord::id`] and grouped by
/// `metadata.file_id`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.replace_file("42", &records).await?;
/// let hits = store.search(&query_embedding, 5, Some("42")).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend(&self) -> &str;

    /// Replace every record of `file_id` with `records` as one unit.
    ///
    /// Returns the number of records written.
    async fn replace_file(&self, file_id: &str, records: &[IndexedRecord]) -> Result<usize>;

    /// Return the `top_k` records most similar to `embedding`, optionally
    /// restricted to one file, ordered by descending cosine similarity.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        file_id: Option<&str>,
    ) -> Result<Vec<RetrievalResult>>;

    /// Number of records, optionally restricted to one file.
    async fn count(&self, file_id: Option<&str>) -> Result<usize>;

    /// Delete every record of `file_id`, returning how many were removed.
    async fn delete_file(&self, file_id: &str) -> Result<usize>;

    /// Delete every record in the collection.
    async fn reset(&self) -> Result<()>;
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 if the lengths differ, either vector is empty, or either has
/// zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom <= f32::EPSILON { 0.0 } else { dot / denom }
}

/// Sort by descending score and keep the first `top_k`.
pub(crate) fn rank(mut scored: Vec<RetrievalResult>, top_k: usize) -> Vec<RetrievalResult> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }
}
