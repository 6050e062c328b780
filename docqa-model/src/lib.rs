//! # docqa-model
//!
//! Chat model implementations of [`docqa_core::Llm`]:
//!
//! - [`OpenAIClient`]: OpenAI chat completions (and compatible APIs such as
//!   vLLM or Ollama's `/v1` endpoint) with tool calling
//! - [`MockLlm`]: scripted responses for tests
//!
//! ```rust,ignore
//! use docqa_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(
//!     OpenAIConfig::new(std::env::var("OPENAI_API_KEY")?, "gpt-3.5-turbo")
//!         .with_temperature(0.1)
//!         .with_max_tokens(1000),
//! )?;
//! ```

pub mod mock;
pub mod openai;

pub use mock::MockLlm;
pub use openai::{OpenAIClient, OpenAIConfig};
