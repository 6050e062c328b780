//! Agent loop configuration.

use std::time::Duration;

use docqa_core::GenerateContentConfig;

/// Bounds and sampling settings for [`AgentLoop`](crate::AgentLoop).
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Model turns that may request tools. The turn after the last one is
    /// sent without tools so the model has to answer in text.
    pub max_tool_iterations: usize,
    /// Upper bound on one model call.
    pub model_timeout: Duration,
    /// Upper bound on one tool call.
    pub tool_timeout: Duration,
    /// Sampling parameters sent with every request, if any.
    pub generation: Option<GenerateContentConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: 5,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
            generation: None,
        }
    }
}

impl AgentConfig {
    pub fn with_max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = n;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_generation(mut self, config: GenerateContentConfig) -> Self {
        self.generation = Some(config);
        self
    }
}
