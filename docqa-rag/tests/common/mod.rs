//! Deterministic embedding providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, RagError, Result};

pub const DIM: usize = 64;

/// Bag-of-words embedding: each lowercase token bumps one FNV-hashed bucket.
#[derive(Default)]
pub struct HashingEmbedder {
    pub calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % DIM as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Always fails, like an unreachable embedding API.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding {
            provider: "failing".into(),
            message: "service unavailable".into(),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}
