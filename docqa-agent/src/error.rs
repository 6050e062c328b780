//! Error types for question answering.

use docqa_core::{CoreError, ToolError};
use docqa_rag::ValidationKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes returned to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptyMessage,
    ChatError,
    FileUploadFailed,
    UnsupportedFileType,
    FileTooLarge,
    EmptyFilename,
}

impl From<ValidationKind> for ErrorCode {
    fn from(kind: ValidationKind) -> Self {
        match kind {
            ValidationKind::EmptyMessage => Self::EmptyMessage,
            ValidationKind::EmptyFilename => Self::EmptyFilename,
            ValidationKind::UnsupportedFileType => Self::UnsupportedFileType,
            ValidationKind::FileTooLarge => Self::FileTooLarge,
        }
    }
}

/// Errors raised while answering a question.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The question was rejected before any retrieval.
    #[error("{message}")]
    Validation {
        /// The failed check.
        kind: ValidationKind,
        /// A description of the failure.
        message: String,
    },

    /// The model call failed or timed out.
    #[error(transparent)]
    Model(#[from] CoreError),

    /// A tool failure the model could not be told about.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The model replied without any text.
    #[error("Model returned an empty answer")]
    EmptyAnswer,

    /// The model was still calling tools when it had to answer.
    #[error("Model kept calling tools after {0} tool rounds")]
    IterationLimit(usize),
}

impl ChatError {
    /// Wire code for this error: validation failures carry their own code,
    /// everything else is `CHAT_ERROR`.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { kind, .. } => (*kind).into(),
            _ => ErrorCode::ChatError,
        }
    }
}

/// A convenience result type for question answering.
pub type Result<T> = std::result::Result<T, ChatError>;
