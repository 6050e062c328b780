//! Durable SQLite vector store behaviour.

use std::collections::HashSet;

use docqa_rag::document::{ChunkMetadata, IndexedRecord};
use docqa_rag::{SqliteVectorStore, VectorStore};
use proptest::prelude::*;

fn record(file_id: &str, chunk_index: usize, embedding: Vec<f32>) -> IndexedRecord {
    let content = format!("chunk {chunk_index} of {file_id}");
    IndexedRecord {
        id: IndexedRecord::record_id(file_id, chunk_index),
        metadata: ChunkMetadata {
            file_id: file_id.to_string(),
            chunk_index,
            chunk_length: content.chars().count(),
            source: Some(IndexedRecord::record_id(file_id, chunk_index)),
        },
        content,
        embedding,
    }
}

#[tokio::test]
async fn records_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("vectors.db");

    {
        let store = SqliteVectorStore::open(&path, "documents").await.unwrap();
        let records = vec![record("1", 0, vec![1.0, 0.0]), record("1", 1, vec![0.0, 1.0])];
        assert_eq!(store.replace_file("1", &records).await.unwrap(), 2);
    }

    let reopened = SqliteVectorStore::open(&path, "documents").await.unwrap();
    assert_eq!(reopened.count(None).await.unwrap(), 2);
    let hits = reopened.search(&[1.0, 0.1], 1, None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.chunk_index, 0);
    assert_eq!(hits[0].content, "chunk 0 of 1");
}

#[tokio::test]
async fn collections_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vectors.db");
    let a = SqliteVectorStore::open(&path, "alpha").await.unwrap();
    let b = SqliteVectorStore::open(&path, "beta").await.unwrap();

    a.replace_file("1", &[record("1", 0, vec![1.0])]).await.unwrap();
    assert_eq!(a.count(None).await.unwrap(), 1);
    assert_eq!(b.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn reingesting_replaces_the_file_record_set() {
    let store = SqliteVectorStore::in_memory("documents").await.unwrap();
    let three: Vec<_> = (0..3).map(|i| record("7", i, vec![1.0, i as f32])).collect();
    store.replace_file("7", &three).await.unwrap();
    store.replace_file("8", &[record("8", 0, vec![0.0, 1.0])]).await.unwrap();
    assert_eq!(store.count(Some("7")).await.unwrap(), 3);

    store.replace_file("7", &three).await.unwrap();
    assert_eq!(store.count(Some("7")).await.unwrap(), 3);

    let shorter: Vec<_> = (0..2).map(|i| record("7", i, vec![1.0, i as f32])).collect();
    store.replace_file("7", &shorter).await.unwrap();
    assert_eq!(store.count(Some("7")).await.unwrap(), 2);
    assert_eq!(store.count(Some("8")).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_and_reset() {
    let store = SqliteVectorStore::in_memory("documents").await.unwrap();
    store.replace_file("1", &[record("1", 0, vec![1.0]), record("1", 1, vec![1.0])]).await.unwrap();
    store.replace_file("2", &[record("2", 0, vec![1.0])]).await.unwrap();

    assert_eq!(store.delete_file("1").await.unwrap(), 2);
    assert_eq!(store.count(None).await.unwrap(), 1);
    store.reset().await.unwrap();
    assert_eq!(store.count(None).await.unwrap(), 0);
    assert!(store.search(&[1.0], 5, None).await.unwrap().is_empty());
}

/// **Property: filtered search**
/// *For any* set of records spread over several files, a search restricted to
/// one `file_id` SHALL only return records of that file, ordered by
/// descending score, and at most `k` of them.
mod prop_filtered_search {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn filter_is_respected(
            files in proptest::collection::vec(
                proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, 4), 0..6),
                1..4,
            ),
            query in proptest::collection::vec(-1.0f32..1.0, 4),
            target in 0usize..4,
            k in 1usize..10,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (hits, expected_max) = rt.block_on(async {
                let store = SqliteVectorStore::in_memory("documents").await.unwrap();
                for (f, embeddings) in files.iter().enumerate() {
                    let file_id = f.to_string();
                    let records: Vec<_> = embeddings
                        .iter()
                        .enumerate()
                        .map(|(i, e)| record(&file_id, i, e.clone()))
                        .collect();
                    store.replace_file(&file_id, &records).await.unwrap();
                }
                let target_id = target.to_string();
                let hits = store.search(&query, k, Some(&target_id)).await.unwrap();
                let in_file = files.get(target).map_or(0, Vec::len);
                (hits, in_file.min(k))
            });

            prop_assert_eq!(hits.len(), expected_max);
            let target_id = target.to_string();
            prop_assert!(hits.iter().all(|h| h.metadata.file_id == target_id));
            for pair in hits.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            let unique: HashSet<_> = hits.iter().map(|h| h.metadata.chunk_index).collect();
            prop_assert_eq!(unique.len(), hits.len());
        }
    }
}
