//! Configuration for chunking, retrieval and upload limits.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Chunking, retrieval and upload parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters for plain text.
    pub text_chunk_size: usize,
    /// Maximum chunk size in characters for CSV content.
    pub csv_chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of chunks retrieved per question.
    pub max_context_chunks: usize,
    /// Largest accepted upload in bytes.
    pub max_file_size: usize,
    /// Vector store collection name.
    pub collection: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            text_chunk_size: 1000,
            csv_chunk_size: 500,
            chunk_overlap: 200,
            max_context_chunks: 5,
            max_file_size: 10 * 1024 * 1024,
            collection: "documents".to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - a chunk size is zero
    /// - `chunk_overlap` is not smaller than both chunk sizes
    /// - `max_context_chunks == 0`
    /// - the collection name is blank
    pub fn validate(&self) -> Result<()> {
        if self.text_chunk_size == 0 || self.csv_chunk_size == 0 {
            return Err(RagError::Config("chunk sizes must be greater than zero".to_string()));
        }
        let smallest = self.text_chunk_size.min(self.csv_chunk_size);
        if self.chunk_overlap >= smallest {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than every chunk size (smallest is {smallest})",
                self.chunk_overlap
            )));
        }
        if self.max_context_chunks == 0 {
            return Err(RagError::Config(
                "max_context_chunks must be greater than zero".to_string(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the plain-text chunk size in characters.
    pub fn text_chunk_size(mut self, size: usize) -> Self {
        self.config.text_chunk_size = size;
        self
    }

    /// Set the CSV chunk size in characters.
    pub fn csv_chunk_size(mut self, size: usize) -> Self {
        self.config.csv_chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of chunks retrieved per question.
    pub fn max_context_chunks(mut self, k: usize) -> Self {
        self.config.max_context_chunks = k;
        self
    }

    /// Set the upload size limit in bytes.
    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    /// Set the vector store collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
