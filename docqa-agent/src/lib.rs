//! # docqa-agent
//!
//! Question answering over indexed documents.
//!
//! [`RetrievalOrchestrator`] validates the question, retrieves the top
//! chunks, renders them into the answering prompt and hands the conversation
//! to an [`AgentLoop`], which lets the model call registered tools (such as
//! `create_note`) a bounded number of times before it must answer in text.
//!
//! ```rust,ignore
//! let agent = AgentLoop::new(model, tools, AgentConfig::default());
//! let orchestrator = RetrievalOrchestrator::new(index, agent, 5);
//!
//! let response = orchestrator.query("What did the cat do?", Some("1"), None).await;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use agent::{AgentLoop, AgentOutcome};
pub use config::AgentConfig;
pub use error::{ChatError, ErrorCode, Result};
pub use orchestrator::{Answer, ChatResponse, RetrievalOrchestrator};
