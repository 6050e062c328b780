//! The bounded tool-calling loop.

use std::sync::Arc;

use docqa_core::{Content, CoreError, Llm, LlmRequest, LlmResponse, Part, ToolError};
use docqa_tool::ToolRegistry;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::config::AgentConfig;
use crate::error::{ChatError, Result};

/// Final result of a conversation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    /// The model's final text.
    pub answer: String,
    /// Tool calls executed along the way.
    pub tool_calls: usize,
    /// Model calls made.
    pub model_calls: usize,
}

/// Runs a conversation against a model, executing the tools it asks for.
///
/// Each round the model either answers in text, which ends the run, or
/// requests tool calls, whose results are appended to the conversation
/// before the next round. After `max_tool_iterations` rounds the model is
/// called once more with no tools on offer.
///
/// Tool failures the model can act on (bad input, unknown tool, a rejected
/// request) are sent back as `{"error": ...}` results. Transport failures
/// and timeouts end the run.
#[derive(Clone)]
pub struct AgentLoop {
    model: Arc<dyn Llm>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(model: Arc<dyn Llm>, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self { model, tools, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the conversation to a final text answer.
    pub async fn run(&self, mut contents: Vec<Content>) -> Result<AgentOutcome> {
        let max_rounds = self.config.max_tool_iterations;
        let declarations = self.tools.declarations();
        let mut tool_calls = 0;

        for round in 0..=max_rounds {
            let offer_tools = round < max_rounds && !declarations.is_empty();
            let mut request = LlmRequest::new(contents.clone());
            if offer_tools {
                request = request.with_tools(declarations.clone());
            }
            if let Some(generation) = &self.config.generation {
                request = request.with_config(generation.clone());
            }

            let response = self.call_model(request).await?;
            let Some(content) = response.content else {
                error!(model = self.model.name(), round, "model returned no content");
                return Err(ChatError::EmptyAnswer);
            };

            let calls: Vec<(Option<String>, String, Value)> = content
                .function_calls()
                .into_iter()
                .map(|(id, name, args)| (id.map(str::to_string), name.to_string(), args.clone()))
                .collect();

            if calls.is_empty() || round == max_rounds {
                let answer = content.text();
                return match answer {
                    Some(answer) => {
                        info!(
                            model = self.model.name(),
                            rounds = round + 1,
                            tool_calls,
                            "agent answered"
                        );
                        Ok(AgentOutcome {
                            answer: answer.trim().to_string(),
                            tool_calls,
                            model_calls: round + 1,
                        })
                    }
                    None if !calls.is_empty() => {
                        warn!(
                            model = self.model.name(),
                            max_rounds,
                            "tool-call bound reached without an answer"
                        );
                        Err(ChatError::IterationLimit(max_rounds))
                    }
                    None => Err(ChatError::EmptyAnswer),
                };
            }

            contents.push(content);
            let mut results = Content::new("tool");
            for (id, name, args) in calls {
                let response = self.call_tool(&name, args).await?;
                tool_calls += 1;
                results = results.with_part(Part::FunctionResponse { id, name, response });
            }
            contents.push(results);
        }

        // `round == max_rounds` always returns above.
        Err(ChatError::IterationLimit(max_rounds))
    }

    async fn call_model(&self, request: LlmRequest) -> Result<LlmResponse> {
        let timeout = self.config.model_timeout;
        debug!(
            model = self.model.name(),
            turns = request.contents.len(),
            tools = request.tools.len(),
            "calling model"
        );
        match tokio::time::timeout(timeout, self.model.generate_content(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                error!(model = self.model.name(), error = %e, "model call failed");
                Err(e.into())
            }
            Err(_) => {
                error!(model = self.model.name(), ?timeout, "model call timed out");
                Err(CoreError::ModelTimeout(timeout).into())
            }
        }
    }

    /// Execute one tool call, turning recoverable failures into an error
    /// result for the model.
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let timeout = self.config.tool_timeout;
        let outcome = match tokio::time::timeout(timeout, self.tools.dispatch(name, args)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolError::Timeout { name: name.to_string(), timeout }),
        };

        match outcome {
            Ok(value) => {
                info!(tool = name, "tool call succeeded");
                Ok(value)
            }
            Err(e) if e.is_recoverable() => {
                warn!(tool = name, error = %e, "tool call failed, reporting to model");
                Ok(json!({ "error": e.to_string() }))
            }
            Err(e) => {
                error!(tool = name, error = %e, "tool call failed");
                Err(e.into())
            }
        }
    }
}
