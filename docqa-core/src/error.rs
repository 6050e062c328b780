//! Error types shared by model and tool implementations.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while invoking a [`Tool`](crate::Tool).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    /// The arguments did not match the tool's input schema.
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// The model asked for a tool that is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The external service answered with a non-success status.
    #[error("Tool service returned {status}: {body}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The external service could not be reached.
    #[error("Tool transport error: {0}")]
    Transport(String),

    /// The tool did not finish within its time budget.
    #[error("Tool '{name}' timed out after {timeout:?}")]
    Timeout {
        /// Name of the tool that timed out.
        name: String,
        /// The bound that was exceeded.
        timeout: Duration,
    },
}

impl ToolError {
    /// Whether the failure should be reported back to the model as a tool
    /// result instead of aborting the conversation.
    ///
    /// Input and service errors are something the model can react to
    /// (fix its JSON, tell the user the note was rejected). Transport
    /// failures and timeouts are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::UnknownTool(_) | Self::Service { .. })
    }
}

/// Errors that can occur while talking to a language model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The model call failed or returned an unusable response.
    #[error("Model error: {0}")]
    Model(String),

    /// The model call exceeded its time budget.
    #[error("Model call timed out after {0:?}")]
    ModelTimeout(Duration),

    /// An invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool failure that could not be handed back to the model.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_tool_errors() {
        assert!(ToolError::InvalidInput("bad json".into()).is_recoverable());
        assert!(ToolError::UnknownTool("nope".into()).is_recoverable());
        assert!(ToolError::Service { status: 400, body: "{}".into() }.is_recoverable());
        assert!(!ToolError::Transport("connection refused".into()).is_recoverable());
        assert!(
            !ToolError::Timeout { name: "create_note".into(), timeout: Duration::from_secs(1) }
                .is_recoverable()
        );
    }

    #[test]
    fn tool_error_converts_into_core_error() {
        let err: CoreError = ToolError::Transport("reset".into()).into();
        assert_eq!(err.to_string(), "Tool transport error: reset");
    }
}
