//! Document ingestion.
//!
//! [`IngestionPipeline`] turns one document into indexed chunks:
//! chunk → embed → store. Embedding and storage failures do not fail the
//! call; they come back as a report with `success = false`, since the
//! document itself was accepted and only its searchable chunks are missing.
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(embedder)
//!     .index(index)
//!     .build()?;
//!
//! let report = pipeline.ingest_upload("42", "notes.txt", &bytes).await?;
//! ```

use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{FileType, IngestionReport, PreparedChunk};
use crate::embedding::{Embedder, prepare_document_embeddings};
use crate::error::{RagError, Result, ValidationKind};
use crate::index::DocumentIndex;

/// Characters kept in [`IngestionReport::content_preview`].
pub const PREVIEW_CHARS: usize = 500;

/// Chunk, embed and index uploaded documents.
#[derive(Clone)]
pub struct IngestionPipeline {
    config: RagConfig,
    chunker: Chunker,
    embedder: Embedder,
    index: DocumentIndex,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Validate an upload and ingest it.
    ///
    /// Checks, in order: the filename is not blank, its extension is `txt`
    /// or `csv`, and the size is within `max_file_size`. The bytes are then
    /// decoded as UTF-8, replacing invalid sequences.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] when a check fails.
    pub async fn ingest_upload(
        &self,
        file_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestionReport> {
        if filename.trim().is_empty() {
            return Err(RagError::validation(ValidationKind::EmptyFilename, "filename is empty"));
        }
        let file_type = FileType::from_filename(filename.trim()).ok_or_else(|| {
            RagError::validation(
                ValidationKind::UnsupportedFileType,
                format!("'{filename}' is not a .txt or .csv file"),
            )
        })?;
        info!(file_id, filename, "accepted upload");
        self.ingest_bytes(file_id, bytes, file_type).await
    }

    /// Ingest raw bytes with explicit chunking rules, skipping the filename
    /// checks of [`ingest_upload`](Self::ingest_upload).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] when `bytes` exceeds `max_file_size`.
    pub async fn ingest_bytes(
        &self,
        file_id: &str,
        bytes: &[u8],
        file_type: FileType,
    ) -> Result<IngestionReport> {
        if bytes.len() > self.config.max_file_size {
            return Err(RagError::validation(
                ValidationKind::FileTooLarge,
                format!(
                    "file is {} bytes, the limit is {} bytes",
                    bytes.len(),
                    self.config.max_file_size
                ),
            ));
        }

        let content = String::from_utf8_lossy(bytes);
        info!(file_id, size = bytes.len(), file_type = file_type.as_str(), "decoded document");
        self.ingest(file_id, &content, file_type).await
    }

    /// Chunk, embed and store one document's content.
    ///
    /// Only a blank `file_id` is an error; everything past validation is
    /// reported in the returned [`IngestionReport`].
    pub async fn ingest(
        &self,
        file_id: &str,
        content: &str,
        file_type: FileType,
    ) -> Result<IngestionReport> {
        if file_id.trim().is_empty() {
            return Err(RagError::Config("file_id must not be empty".to_string()));
        }

        let chunks = self.chunker.create_chunks(content, file_type);
        let total_chunks = chunks.len();
        let prepared = prepare_document_embeddings(file_id, &chunks);
        let report = |stored_chunks: usize, success: bool, message: String| IngestionReport {
            file_id: file_id.to_string(),
            stored_chunks,
            total_chunks,
            success,
            message,
            content_preview: content_preview(content),
        };

        if prepared.is_empty() {
            warn!(file_id, "document produced no chunks");
            return Ok(report(0, false, "No chunks to store".to_string()));
        }

        let embeddings = match self.embed(&prepared).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(file_id, error = %e, "embedding failed, document is not searchable");
                return Ok(report(0, false, e.to_string()));
            }
        };

        match self.index.store_chunks(file_id, &prepared, embeddings).await {
            Ok(outcome) => {
                info!(
                    file_id,
                    total_chunks,
                    stored_chunks = outcome.stored_count,
                    "ingested document"
                );
                Ok(report(outcome.stored_count, outcome.success, outcome.message))
            }
            Err(e) => {
                warn!(file_id, error = %e, "storing chunks failed, document is not searchable");
                Ok(report(0, false, e.to_string()))
            }
        }
    }

    async fn embed(&self, prepared: &[PreparedChunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<&str> = prepared.iter().map(|c| c.content.as_str()).collect();
        self.embedder.embed(&texts).await
    }
}

/// The first [`PREVIEW_CHARS`] characters of `content`, with `...` appended
/// when it was cut.
pub fn content_preview(content: &str) -> String {
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() { format!("{preview}...") } else { preview }
}

/// Builder for constructing an [`IngestionPipeline`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    chunker: Option<Chunker>,
    embedder: Option<Embedder>,
    index: Option<DocumentIndex>,
}

impl IngestionPipelineBuilder {
    /// Set the configuration. Defaults to [`RagConfig::default`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the chunker built from the configuration.
    pub fn chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedder. Falls back to the index's embedder.
    pub fn embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the index chunks are written to.
    pub fn index(mut self, index: DocumentIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if no index was set or the configuration
    /// is invalid.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let index = self.index.ok_or_else(|| {
            error!("ingestion pipeline built without an index");
            RagError::Config("index is required".to_string())
        })?;
        let embedder = self.embedder.unwrap_or_else(|| index.embedder().clone());
        let chunker = self.chunker.unwrap_or_else(|| Chunker::new(&config));
        Ok(IngestionPipeline { config, chunker, embedder, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_truncated_with_ellipsis() {
        let short = "a".repeat(PREVIEW_CHARS);
        assert_eq!(content_preview(&short), short);
        let long = "é".repeat(PREVIEW_CHARS + 1);
        let preview = content_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn build_requires_an_index() {
        assert!(matches!(IngestionPipeline::builder().build(), Err(RagError::Config(_))));
    }
}
