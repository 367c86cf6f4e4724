use crate::error::GatewayError;
use crate::extraction::Extraction;
use crate::models::chat::{
    ChatChoice, ChatCompletionResponse, ChatResponseMessage, ChatUsage, Role,
};
use crate::models::provider::ProviderMessage;
use crate::util::{current_timestamp, current_timestamp_millis};

/// Characters per token for the usage estimate.
const CHARS_PER_TOKEN: usize = 4;

/// Build the OpenAI-compatible completion for one extracted provider reply.
///
/// `prompt` is the message list that was sent upstream; it only feeds the usage
/// estimate.
pub fn assemble_completion(
    model: &str,
    prompt: &[ProviderMessage],
    extraction: Extraction,
) -> Result<ChatCompletionResponse, GatewayError> {
    let usage = estimate_usage(prompt, extraction.content().unwrap_or_default())?;
    let finish_reason = extraction.finish_reason();

    let message = match extraction {
        Extraction::Text(content) => ChatResponseMessage {
            role: Role::Assistant,
            content: Some(content),
            function_call: None,
            tool_calls: None,
        },
        Extraction::FunctionCall(call) => ChatResponseMessage {
            role: Role::Assistant,
            content: None,
            function_call: Some(call),
            tool_calls: None,
        },
        Extraction::ToolCalls(calls) => ChatResponseMessage {
            role: Role::Assistant,
            content: None,
            function_call: None,
            tool_calls: Some(calls),
        },
    };

    Ok(ChatCompletionResponse {
        id: format!("chatcmpl-{}", current_timestamp_millis()),
        object: "chat.completion".to_string(),
        created: current_timestamp(),
        model: model.to_string(),
        choices: vec![ChatChoice {
            index: 0,
            message,
            finish_reason,
        }],
        usage,
    })
}

/// Length-based token estimate; not a tokenizer.
pub fn estimate_usage(
    prompt: &[ProviderMessage],
    completion: &str,
) -> Result<ChatUsage, serde_json::Error> {
    let prompt_chars = serde_json::to_string(prompt)?.chars().count();
    let prompt_tokens = (prompt_chars / CHARS_PER_TOKEN) as u64;
    let completion_tokens = (completion.chars().count() / CHARS_PER_TOKEN) as u64;
    Ok(ChatUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    })
}
