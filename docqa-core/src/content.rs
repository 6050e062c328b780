//! Conversation content: role-tagged turns made of parts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One piece of a conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text.
    Text {
        /// The text itself.
        text: String,
    },
    /// A structured request from the model to run a tool.
    FunctionCall {
        /// Provider-assigned call id, echoed back in the matching response.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Name of the requested tool.
        name: String,
        /// Tool arguments.
        args: Value,
    },
    /// The result of running a tool, fed back to the model.
    FunctionResponse {
        /// Id of the call this answers.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Name of the tool that ran.
        name: String,
        /// Tool output (or an `{"error": ...}` object).
        response: Value,
    },
}

/// A single conversation turn.
///
/// Roles follow the chat-completion convention: `system`, `user`,
/// `assistant` and `tool`; `model` is accepted as an alias of `assistant`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Who produced this turn.
    pub role: String,
    /// The turn's parts, in order.
    pub parts: Vec<Part>,
}

impl Content {
    /// Create an empty turn for `role`.
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), parts: Vec::new() }
    }

    /// A system turn with a single text part.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system").with_text(text)
    }

    /// A user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user").with_text(text)
    }

    /// An assistant turn with a single text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new("assistant").with_text(text)
    }

    /// Append a text part.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    /// Append a part.
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// All text parts joined by newlines, or `None` when there is no
    /// non-blank text.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        let joined = texts.join("\n");
        if joined.trim().is_empty() { None } else { Some(joined) }
    }

    /// Function calls requested in this turn, as `(id, name, args)`.
    pub fn function_calls(&self) -> Vec<(Option<&str>, &str, &Value)> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall { id, name, args } => {
                    Some((id.as_deref(), name.as_str(), args))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_joins_text_parts_only() {
        let content = Content::assistant("first")
            .with_part(Part::FunctionCall { id: None, name: "x".into(), args: json!({}) })
            .with_text("second");
        assert_eq!(content.text().as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(Content::assistant("  \n").text(), None);
        assert_eq!(Content::new("assistant").text(), None);
    }

    #[test]
    fn function_calls_are_listed_in_order() {
        let content = Content::new("assistant")
            .with_part(Part::FunctionCall {
                id: Some("call_1".into()),
                name: "create_note".into(),
                args: json!({"note_data": "{}"}),
            })
            .with_part(Part::FunctionCall { id: None, name: "other".into(), args: json!(null) });
        let calls = content.function_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Some("call_1"));
        assert_eq!(calls[0].1, "create_note");
        assert_eq!(calls[1].1, "other");
    }

    #[test]
    fn parts_serialize_with_type_tag() {
        let value = serde_json::to_value(Part::Text { text: "hi".into() }).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hi"}));
    }
}
