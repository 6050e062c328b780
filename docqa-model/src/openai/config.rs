//! OpenAI client configuration.

use std::time::Duration;

/// Default API base for OpenAI.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection and sampling settings for [`OpenAIClient`](super::OpenAIClient).
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIConfig {
    /// Bearer API key.
    pub api_key: String,
    /// Chat model identifier.
    pub model: String,
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Default temperature when a request carries no config.
    pub temperature: Option<f32>,
    /// Default max output tokens when a request carries no config.
    pub max_tokens: Option<u32>,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Config for the public OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Config for an OpenAI-compatible API at `base_url`.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the default max output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
