//! # docqa-core
//!
//! Shared vocabulary for the docqa crates:
//!
//! - [`Content`] / [`Part`]: a role-tagged conversation turn made of text,
//!   function calls and function responses
//! - [`Llm`]: a chat model that accepts an [`LlmRequest`] and may answer with
//!   text or with structured tool calls
//! - [`Tool`]: a named, schema-described operation the model can invoke
//! - [`CoreError`] / [`ToolError`]: model and tool failure kinds

pub mod content;
pub mod error;
pub mod llm;
pub mod tool;

pub use content::{Content, Part};
pub use error::{CoreError, Result, ToolError};
pub use llm::{GenerateContentConfig, Llm, LlmRequest, LlmResponse};
pub use tool::{Tool, ToolDeclaration};
