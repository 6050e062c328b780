//! The `create_note` tool.
//!
//! The model passes the note as a JSON string in `note_data`, e.g.
//! `{"title": "My Note", "content": "Note content", "added_at": "2025-08-14T22:00:00Z"}`.
//! Models frequently double-encode that string, so a single layer of
//! surrounding quotes and escaped quotes/newlines is removed before parsing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use docqa_core::{Tool, ToolError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

/// Default notes service base URL.
pub const DEFAULT_NOTE_SERVICE_URL: &str = "http://localhost:1337";

/// Connection settings for the notes service.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteServiceConfig {
    /// Service base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header.
    pub token: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl NoteServiceConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn notes_url(&self) -> String {
        format!("{}/api/notes", self.base_url)
    }
}

impl Default for NoteServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NOTE_SERVICE_URL, "")
    }
}

/// Arguments the model sends to `create_note`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateNoteArgs {
    /// Note data as a JSON string with required 'title' and 'content' fields and an
    /// optional 'added_at' ISO-8601 timestamp.
    /// Example: {"title": "My Note", "content": "Note content", "added_at": "2025-08-14T22:00:00Z"}
    pub note_data: String,
}

/// A parsed note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub added_at: Option<String>,
}

/// Strip one level of quoting and unescape `\"` and `\n`.
fn clean_note_data(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    inner.replace("\\\"", "\"").replace("\\n", "\n")
}

/// Parse the `note_data` string into a [`NoteInput`].
///
/// Tries the text as-is, then as a JSON-encoded string holding the note,
/// then with quoting stripped by hand.
pub fn parse_note_data(raw: &str) -> Result<NoteInput, ToolError> {
    let trimmed = raw.trim();
    let first_err = match serde_json::from_str::<NoteInput>(trimmed) {
        Ok(note) => return Ok(note),
        Err(e) => e,
    };
    if let Ok(inner) = serde_json::from_str::<String>(trimmed) {
        if let Ok(note) = serde_json::from_str::<NoteInput>(&inner) {
            return Ok(note);
        }
    }
    serde_json::from_str::<NoteInput>(&clean_note_data(trimmed)).map_err(|_| {
        ToolError::InvalidInput(format!("Invalid JSON format: {first_err}. Received: {raw}"))
    })
}

/// Extract the note from the tool arguments.
///
/// Accepts `{"note_data": "<json string>"}`, `{"note_data": {...}}`, and a bare
/// note object for models that skip the wrapper.
pub fn note_from_args(args: &Value) -> Result<NoteInput, ToolError> {
    match args.get("note_data") {
        Some(Value::String(raw)) => parse_note_data(raw),
        Some(obj @ Value::Object(_)) => serde_json::from_value(obj.clone())
            .map_err(|e| ToolError::InvalidInput(format!("Invalid note object: {e}"))),
        Some(other) => Err(ToolError::InvalidInput(format!(
            "'note_data' must be a JSON string, got {other}"
        ))),
        None => match args {
            Value::Object(map) if map.contains_key("title") || map.contains_key("content") => {
                serde_json::from_value(args.clone())
                    .map_err(|e| ToolError::InvalidInput(format!("Invalid note object: {e}")))
            }
            Value::String(raw) => parse_note_data(raw),
            _ => Err(ToolError::InvalidInput("missing required field 'note_data'".to_string())),
        },
    }
}

/// Build the notes-service request body. A missing or blank `added_at`
/// becomes `now` as an ISO-8601 UTC timestamp.
pub fn build_note_payload(input: &NoteInput, now: DateTime<Utc>) -> Value {
    let added_at = input
        .added_at
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

    json!({
        "data": {
            "title": input.title,
            "description": [
                {
                    "type": "paragraph",
                    "children": [{ "type": "text", "text": input.content }]
                }
            ],
            "added_at": added_at
        }
    })
}

/// Creates a note in the notes service.
pub struct CreateNoteTool {
    client: reqwest::Client,
    config: NoteServiceConfig,
}

impl CreateNoteTool {
    pub const NAME: &'static str = "create_note";

    pub fn new(config: NoteServiceConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ToolError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Tool for CreateNoteTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Creates a note in the notes service. Input must be a valid JSON string in 'note_data' \
         with required 'title' and 'content' fields and an optional 'added_at' ISO date."
    }

    fn parameters_schema(&self) -> Option<Value> {
        let mut schema = serde_json::to_value(schemars::schema_for!(CreateNoteArgs)).ok()?;
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        Some(schema)
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let note = note_from_args(&args)?;
        let payload = build_note_payload(&note, Utc::now());

        let response = self
            .client
            .post(self.config.notes_url())
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "notes service unreachable");
                ToolError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!(status = status.as_u16(), "notes service rejected note");
            return Err(ToolError::Service { status: status.as_u16(), body });
        }

        info!(title = %note.title, "note created");
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "raw": body })))
    }
}
