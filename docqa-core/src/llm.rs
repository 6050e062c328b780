//! The language-model seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::error::Result;
use crate::tool::ToolDeclaration;

/// Sampling parameters for a single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// A request to a chat model: the conversation so far plus the tools the
/// model may call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmRequest {
    /// Conversation turns, oldest first.
    pub contents: Vec<Content>,
    /// Tools offered to the model. Empty means the model must answer in text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
    /// Optional sampling overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateContentConfig>,
}

impl LlmRequest {
    /// Create a request from conversation turns.
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents, tools: Vec::new(), config: None }
    }

    /// Offer tools to the model.
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    /// Set sampling parameters.
    pub fn with_config(mut self, config: GenerateContentConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// A model reply: either final text or a set of tool calls (or both).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    /// The assistant turn, if the model produced one.
    pub content: Option<Content>,
    /// Provider-specific finish reason (`stop`, `tool_calls`, `length`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// A plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: Some(Content::assistant(text)), finish_reason: Some("stop".into()) }
    }

    /// Whether the reply asks for at least one tool call.
    pub fn has_function_calls(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.function_calls().is_empty())
    }
}

/// A chat model.
///
/// Implementations wrap a specific provider behind a single non-streaming
/// call. The caller owns retries and timeouts.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier, used in logs.
    fn name(&self) -> &str;

    /// Run one completion.
    async fn generate_content(&self, request: LlmRequest) -> Result<LlmResponse>;
}
