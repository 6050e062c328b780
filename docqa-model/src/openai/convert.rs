//! Mapping between docqa content and `async-openai` chat types.

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionResponse, FunctionCall,
    FunctionObjectArgs,
};
use docqa_core::{Content, LlmResponse, Part, ToolDeclaration};
use serde_json::Value;

/// Convert one docqa turn into chat-completion messages.
///
/// A `tool` turn carrying several function responses becomes one message per
/// response, since the API expects a `tool` message per `tool_call_id`.
/// Unknown roles are sent as `user`.
pub fn content_to_messages(
    content: &Content,
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    let text = content.text().unwrap_or_default();
    match content.role.as_str() {
        "system" => {
            let message = ChatCompletionRequestSystemMessageArgs::default().content(text).build()?;
            Ok(vec![message.into()])
        }
        "model" | "assistant" => Ok(vec![assistant_message(content)?]),
        "tool" | "function" => content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse { id, response, .. } => Some(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(id.clone().unwrap_or_default())
                        .content(response_to_string(response))
                        .build()
                        .map(Into::into),
                ),
                _ => None,
            })
            .collect(),
        _ => {
            let message = ChatCompletionRequestUserMessageArgs::default().content(text).build()?;
            Ok(vec![message.into()])
        }
    }
}

fn assistant_message(content: &Content) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let tool_calls: Vec<ChatCompletionMessageToolCall> = content
        .function_calls()
        .into_iter()
        .map(|(id, name, args)| ChatCompletionMessageToolCall {
            id: id.unwrap_or_default().to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall { name: name.to_string(), arguments: args.to_string() },
        })
        .collect();

    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
    if let Some(text) = content.text() {
        builder.content(text);
    }
    if !tool_calls.is_empty() {
        builder.tool_calls(tool_calls);
    }
    Ok(builder.build()?.into())
}

fn response_to_string(response: &Value) -> String {
    match response {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert tool declarations into function tools.
pub fn convert_tools(tools: &[ToolDeclaration]) -> Result<Vec<ChatCompletionTool>, OpenAIError> {
    tools
        .iter()
        .map(|tool| {
            let function = FunctionObjectArgs::default()
                .name(&tool.name)
                .description(&tool.description)
                .parameters(tool.parameters.clone())
                .build()?;
            ChatCompletionToolArgs::default()
                .r#type(ChatCompletionToolType::Function)
                .function(function)
                .build()
        })
        .collect()
}

/// Read the first choice of a completion.
///
/// Returns `None` when there are no choices. Tool-call arguments that are
/// not valid JSON are kept as a raw string so the tool can report the
/// malformed input back to the model.
pub fn from_completion(response: &CreateChatCompletionResponse) -> Option<LlmResponse> {
    let choice = response.choices.first()?;
    let message = &choice.message;

    let mut content = Content::new("assistant");
    if let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) {
        content = content.with_text(text);
    }
    for call in message.tool_calls.iter().flatten() {
        let raw_args = call.function.arguments.as_str();
        let args = serde_json::from_str::<Value>(raw_args)
            .unwrap_or_else(|_| Value::String(raw_args.to_string()));
        content = content.with_part(Part::FunctionCall {
            id: Some(call.id.clone()),
            name: call.function.name.clone(),
            args,
        });
    }

    let finish_reason = choice
        .finish_reason
        .as_ref()
        .and_then(|reason| serde_json::to_value(reason).ok())
        .and_then(|v| v.as_str().map(str::to_string));
    let content = if content.parts.is_empty() { None } else { Some(content) };

    Some(LlmResponse { content, finish_reason })
}
