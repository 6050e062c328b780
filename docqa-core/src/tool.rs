//! The tool seam: named operations a model can request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolError;

/// What the model is told about a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    /// Stable tool name the model uses to call it.
    pub name: String,
    /// Natural-language description of when and how to use the tool.
    pub description: String,
    /// JSON schema of the tool's arguments object.
    pub parameters: Value,
}

/// An operation the model can invoke by name.
///
/// Implementations validate `args` against their own typed input before
/// doing any work and report schema mismatches as
/// [`ToolError::InvalidInput`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name, unique within a registry.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the arguments object, if the tool takes any.
    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    /// Run the tool.
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;

    /// The declaration sent to the model.
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self
                .parameters_schema()
                .unwrap_or_else(|| json!({ "type": "object", "properties": {} })),
        }
    }
}
