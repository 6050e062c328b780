//! OpenAI chat-completions client.

use async_openai::Client;
use async_openai::config::OpenAIConfig as AsyncOpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use docqa_core::{CoreError, Llm, LlmRequest, LlmResponse, Result};
use tracing::{debug, error};

use super::config::OpenAIConfig;
use super::convert;

/// A [`Llm`] backed by the `/chat/completions` endpoint.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a client. Fails if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::Config("OpenAI API key is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))?;
        let openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Ok(Self { client: Client::with_config(openai_config).with_http_client(http), config })
    }

    /// Build the typed request. Per-request settings win over the
    /// client defaults.
    fn build_request(&self, request: &LlmRequest) -> Result<CreateChatCompletionRequest> {
        let build_error = |e: OpenAIError| {
            error!(model = %self.config.model, error = %e, "failed to build chat request");
            CoreError::Model(format!("Failed to build request: {e}"))
        };

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        for content in &request.contents {
            messages.extend(convert::content_to_messages(content).map_err(build_error)?);
        }

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.config.model).messages(messages);

        if !request.tools.is_empty() {
            builder.tools(convert::convert_tools(&request.tools).map_err(build_error)?);
        }

        let generation = request.config.as_ref();
        if let Some(temp) = generation.and_then(|c| c.temperature).or(self.config.temperature) {
            builder.temperature(temp);
        }
        if let Some(top_p) = generation.and_then(|c| c.top_p) {
            builder.top_p(top_p);
        }
        if let Some(max_tokens) =
            generation.and_then(|c| c.max_output_tokens).or(self.config.max_tokens)
        {
            builder.max_tokens(max_tokens);
        }

        builder.build().map_err(build_error)
    }
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(&self, request: LlmRequest) -> Result<LlmResponse> {
        let openai_request = self.build_request(&request)?;
        debug!(
            model = %self.config.model,
            messages = openai_request.messages.len(),
            tools = request.tools.len(),
            "sending chat completion"
        );

        let response = self.client.chat().create(openai_request).await.map_err(|e| match e {
            OpenAIError::Reqwest(ref re) if re.is_timeout() => {
                error!(model = %self.config.model, "chat completion timed out");
                CoreError::ModelTimeout(self.config.timeout)
            }
            other => {
                error!(model = %self.config.model, error = %other, "chat completion failed");
                CoreError::Model(format!("OpenAI API error: {other}"))
            }
        })?;

        convert::from_completion(&response)
            .ok_or_else(|| CoreError::Model("completion contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::{Content, GenerateContentConfig, ToolDeclaration};
    use serde_json::json;

    fn client() -> OpenAIClient {
        OpenAIClient::new(
            OpenAIConfig::new("sk-test", "gpt-3.5-turbo")
                .with_temperature(0.1)
                .with_max_tokens(1000),
        )
        .unwrap()
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = OpenAIClient::new(OpenAIConfig::new("  ", "gpt-3.5-turbo"));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn request_uses_config_defaults() {
        let contents = vec![Content::system("Be brief."), Content::user("Hi")];
        let request = client().build_request(&LlmRequest::new(contents)).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn request_config_overrides_defaults() {
        let request = LlmRequest::new(vec![Content::user("Hi")])
            .with_config(GenerateContentConfig {
                max_output_tokens: Some(42),
                ..Default::default()
            })
            .with_tools(vec![ToolDeclaration {
                name: "create_note".into(),
                description: "d".into(),
                parameters: json!({"type": "object"}),
            }]);
        let body = serde_json::to_value(client().build_request(&request).unwrap()).unwrap();
        assert_eq!(body["max_tokens"], 42);
        assert_eq!(body["tools"][0]["function"]["name"], "create_note");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_model_error() {
        let model = OpenAIClient::new(OpenAIConfig::compatible(
            "sk-test",
            "http://127.0.0.1:9/v1",
            "gpt-3.5-turbo",
        ))
        .unwrap();
        let result = model.generate_content(LlmRequest::new(vec![Content::user("Hi")])).await;
        assert!(matches!(result, Err(CoreError::Model(_))));
    }
}
