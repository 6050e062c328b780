//! # docqa-tool
//!
//! Tools the answering agent can call, and the registry that dispatches
//! model tool calls to them by name.
//!
//! - [`ToolRegistry`]: name to [`Tool`](docqa_core::Tool) lookup and dispatch
//! - [`CreateNoteTool`]: persists a note in the external notes service

pub mod note;
pub mod registry;

pub use note::{CreateNoteArgs, CreateNoteTool, NoteInput, NoteServiceConfig};
pub use registry::ToolRegistry;
