//! Data types for chunks, indexed records and retrieval results.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Kind of document content, which selects the chunking rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Free text, split on paragraphs, lines and words.
    Plain,
    /// CSV, rendered row by row as `header: value` lines first.
    Tabular,
}

impl FileType {
    /// Type for a supported upload extension (`txt`, `csv`), case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Plain),
            "csv" => Some(Self::Tabular),
            _ => None,
        }
    }

    /// Type for a filename, by its extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename).extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }

    /// Parse a free-form type tag. Unknown tags are treated as plain text.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Self::Tabular,
            _ => Self::Plain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "txt",
            Self::Tabular => "csv",
        }
    }
}

/// Positional metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning document.
    pub file_id: String,
    /// Position in the chunker output, including skipped blank chunks.
    pub chunk_index: usize,
    /// Length of the trimmed chunk in characters.
    pub chunk_length: usize,
    /// Record id, `file_{file_id}_chunk_{chunk_index}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A trimmed, non-empty chunk ready to embed, paired with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// The persisted unit of the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    /// Deterministic id, `file_{file_id}_chunk_{chunk_index}`.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

impl IndexedRecord {
    /// The record id for a chunk position within a file.
    pub fn record_id(file_id: &str, chunk_index: usize) -> String {
        format!("file_{file_id}_chunk_{chunk_index}")
    }
}

/// A retrieved chunk without its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A retrieved chunk with its cosine similarity to the query (higher is
/// more similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

impl From<RetrievalResult> for RetrievedChunk {
    fn from(result: RetrievalResult) -> Self {
        Self { content: result.content, metadata: result.metadata }
    }
}

/// Result of writing one file's chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub file_id: String,
    pub stored_count: usize,
    pub success: bool,
    pub message: String,
}

/// What an ingestion produced, reported back to the upload caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub file_id: String,
    /// Records written to the vector store.
    pub stored_chunks: usize,
    /// Chunks produced by the chunker, blank ones included.
    pub total_chunks: usize,
    pub success: bool,
    pub message: String,
    /// The first 500 characters of the content.
    pub content_preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_names() {
        assert_eq!(FileType::from_filename("notes.TXT"), Some(FileType::Plain));
        assert_eq!(FileType::from_filename("data.csv"), Some(FileType::Tabular));
        assert_eq!(FileType::from_filename("report.pdf"), None);
        assert_eq!(FileType::from_filename("README"), None);
    }

    #[test]
    fn unknown_tags_parse_as_plain() {
        assert_eq!(FileType::parse("CSV"), FileType::Tabular);
        assert_eq!(FileType::parse("md"), FileType::Plain);
        assert_eq!(FileType::parse(""), FileType::Plain);
    }

    #[test]
    fn record_ids_are_deterministic() {
        assert_eq!(IndexedRecord::record_id("7", 3), "file_7_chunk_3");
    }
}
