//! Retrieval-augmented answering.

use docqa_core::Content;
use docqa_rag::{DocumentIndex, RetrievalResult, ValidationKind};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::agent::AgentLoop;
use crate::error::{ChatError, ErrorCode, Result};
use crate::prompt::{
    AGENT_SYSTEM_PROMPT, NO_CONTEXT_ANSWER, SUCCESS_MESSAGE, build_context, render_rag_prompt,
};

/// An answer and whether it was grounded in retrieved chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub used_context: bool,
    /// The chunks the answer was conditioned on, most similar first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<RetrievalResult>,
}

/// Response envelope for the query caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatResponse {
    pub fn ok(answer: Answer) -> Self {
        Self {
            success: true,
            answer: Some(answer.answer),
            used_context: Some(answer.used_context),
            error_code: None,
            message: Some(SUCCESS_MESSAGE.to_string()),
        }
    }

    pub fn from_error(e: &ChatError) -> Self {
        let message = match e {
            ChatError::Validation { message, .. } => message.clone(),
            other => format!("Error when querying documents: {other}"),
        };
        Self {
            success: false,
            answer: None,
            used_context: None,
            error_code: Some(e.code()),
            message: Some(message),
        }
    }
}

/// Answers questions from the indexed documents.
#[derive(Clone)]
pub struct RetrievalOrchestrator {
    index: DocumentIndex,
    agent: AgentLoop,
    default_max_chunks: usize,
}

impl RetrievalOrchestrator {
    pub fn new(index: DocumentIndex, agent: AgentLoop, default_max_chunks: usize) -> Self {
        Self { index, agent, default_max_chunks: default_max_chunks.max(1) }
    }

    /// Answer `question` from up to `max_chunks` retrieved chunks, optionally
    /// only from `file_id`.
    ///
    /// A blank question fails before any retrieval. When nothing is
    /// retrieved the canned [`NO_CONTEXT_ANSWER`] is returned without calling
    /// the model.
    pub async fn answer(
        &self,
        question: &str,
        file_id: Option<&str>,
        max_chunks: Option<usize>,
    ) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::Validation {
                kind: ValidationKind::EmptyMessage,
                message: "Message cannot be empty".to_string(),
            });
        }

        let k = max_chunks.unwrap_or(self.default_max_chunks);
        let sources = self.index.similarity_search_with_scores(question, k, file_id).await;
        if sources.is_empty() {
            info!(file_id = ?file_id, "no relevant chunks, returning canned answer");
            return Ok(Answer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                used_context: false,
                sources,
            });
        }

        let context = build_context(&sources);
        let contents = vec![
            Content::system(AGENT_SYSTEM_PROMPT),
            Content::user(render_rag_prompt(&context, question)),
        ];
        let outcome = self.agent.run(contents).await?;
        info!(
            file_id = ?file_id,
            sources = sources.len(),
            tool_calls = outcome.tool_calls,
            "answered question"
        );
        Ok(Answer { answer: outcome.answer, used_context: true, sources })
    }

    /// [`answer`](Self::answer) wrapped in the response envelope. Never fails.
    pub async fn query(
        &self,
        question: &str,
        file_id: Option<&str>,
        max_chunks: Option<usize>,
    ) -> ChatResponse {
        match self.answer(question, file_id, max_chunks).await {
            Ok(answer) => ChatResponse::ok(answer),
            Err(e) => {
                error!(error = %e, code = ?e.code(), "query failed");
                ChatResponse::from_error(&e)
            }
        }
    }
}
