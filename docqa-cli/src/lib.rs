//! # docqa-cli
//!
//! The `docqa` binary: load [`Settings`] from the environment, wire the
//! ingestion pipeline and the answering orchestrator, and run one command.

pub mod app;
pub mod cli;
pub mod settings;
pub mod telemetry;

pub use app::App;
pub use cli::{Cli, Command};
pub use settings::{Settings, SettingsError};
