use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::chat::{FunctionCall, ToolCall};

/// Provider-side message.
///
/// The provider accepts the OpenAI message shape, but `content` is always a string
/// and every call payload carries already-encoded `arguments`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// "system" | "user" | "assistant" | "function" | "tool"
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl ProviderMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            name: None,
            function_call: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Request body sent to the provider's completion endpoint (`POST <base>/`).
///
/// Generation parameters keep their OpenAI names; unset ones are omitted.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub messages: Vec<ProviderMessage>,
    pub model: String,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub n: Option<u32>,
    pub stream: Option<bool>,
    /// A single string or an array of strings.
    pub stop: Option<serde_json::Value>,
    pub max_tokens: Option<u32>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
}
