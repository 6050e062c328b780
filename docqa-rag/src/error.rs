//! Error types for the `docqa-rag` crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which input check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationKind {
    /// Question was empty or whitespace.
    EmptyMessage,
    /// Upload had no filename.
    EmptyFilename,
    /// Upload extension is not `txt` or `csv`.
    UnsupportedFileType,
    /// Upload exceeds the configured size limit.
    FileTooLarge,
}

impl ValidationKind {
    /// Wire code of this validation failure.
    pub fn code(self) -> &'static str {
        match self {
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::EmptyFilename => "EMPTY_FILENAME",
            Self::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            Self::FileTooLarge => "FILE_TOO_LARGE",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur in ingestion and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// Caller input was rejected before any work was done.
    #[error("Validation error ({kind}): {message}")]
    Validation {
        /// The failed check.
        kind: ValidationKind,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A similarity query failed.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// A vector store read or write failed.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub(crate) fn validation(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self::Validation { kind, message: message.into() }
    }

    /// The validation kind, if this is a validation failure.
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            Self::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
