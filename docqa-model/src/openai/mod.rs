//! OpenAI chat-completions provider.

mod client;
mod config;
mod convert;

pub use client::OpenAIClient;
pub use config::{DEFAULT_OPENAI_BASE_URL, OpenAIConfig};
