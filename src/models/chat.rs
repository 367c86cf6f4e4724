use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// Chat Completions role enumeration.
///
/// Uses lowercase serialization to match the OpenAI Chat API:
/// "system" | "user" | "assistant" | "function" | "tool"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Legacy role carrying the result of a `function_call`.
    Function,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
            Role::Tool => "tool",
        }
    }
}

/// A function invocation as written by a caller or by the provider.
///
/// The argument payload may arrive as a JSON string, as a structured object under
/// `arguments`, or as a structured object under `parameters`. Use
/// `crate::conversion::normalize_arguments` to collapse it into the wire form.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

/// Tool call as it may appear on an inbound assistant message.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    #[serde(default)]
    pub function: RawFunctionCall,
}

/// Chat message accepted on `/v1/chat/completions`.
///
/// A `tool` message is expected to carry `tool_call_id`; the gateway forwards it regardless.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub function_call: Option<RawFunctionCall>,
    #[serde(default)]
    pub tool_calls: Option<Vec<RawToolCall>>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Plain text message with no call metadata.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

fn default_parameter_type() -> String {
    "object".to_string()
}

/// JSON-Schema-like description of a function's parameters.
///
/// Passed through structurally; nothing here is validated.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    #[serde(rename = "type", default = "default_parameter_type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub required: Option<Vec<String>>,
    #[serde(default)]
    pub items: Option<Value>,
}

impl Default for FunctionParameter {
    fn default() -> Self {
        Self {
            kind: default_parameter_type(),
            description: None,
            enum_values: None,
            properties: None,
            required: None,
            items: None,
        }
    }
}

/// Legacy `functions` entry, also the payload of a `tools` entry.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: FunctionParameter,
}

fn default_tool_type() -> String {
    "function".to_string()
}

/// Chat Completions tool definition.
///
/// Example:
/// {
///   "type": "function",
///   "function": { "name": "...", "description": "...", "parameters": { ... } }
/// }
///
/// Kept as a plain struct rather than a tagged enum so unknown tool kinds deserialize
/// and are skipped instead of failing the whole request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type", default = "default_tool_type")]
    pub kind: String,
    pub function: FunctionDef,
}

impl ToolDefinition {
    pub fn function(function: FunctionDef) -> Self {
        Self {
            kind: default_tool_type(),
            function,
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }
}

fn default_temperature() -> Option<f64> {
    Some(0.7)
}

fn default_top_p() -> Option<f64> {
    Some(1.0)
}

fn default_n() -> Option<u32> {
    Some(1)
}

fn default_stream() -> Option<bool> {
    Some(false)
}

fn default_penalty() -> Option<f64> {
    Some(0.0)
}

/// Chat Completions request (commonly used subset).
///
/// Sampling fields default to the values OpenAI documents so the provider always
/// receives an explicit setting. `stop` is a `serde_json::Value` to accept both a
/// single string and an array of strings.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Empty means "use the configured default model".
    #[serde(default)]
    pub model: String,
    pub messages: Vec<ChatMessage>,

    // Calling conventions
    #[serde(default)]
    pub functions: Option<Vec<FunctionDef>>,
    #[serde(default)]
    pub function_call: Option<Value>,
    #[serde(default)]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(default)]
    pub tool_choice: Option<Value>,

    // Sampling / decoding
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,
    #[serde(default = "default_top_p")]
    pub top_p: Option<f64>,
    #[serde(default = "default_n")]
    pub n: Option<u32>,
    #[serde(default = "default_stream")]
    pub stream: Option<bool>,
    #[serde(default)]
    pub stop: Option<Value>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_penalty")]
    pub presence_penalty: Option<f64>,
    #[serde(default = "default_penalty")]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub user: Option<String>,
}

impl ChatCompletionRequest {
    /// Request with the given messages and every optional field at its default.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            functions: None,
            function_call: None,
            tools: None,
            tool_choice: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            n: default_n(),
            stream: default_stream(),
            stop: None,
            max_tokens: None,
            presence_penalty: default_penalty(),
            frequency_penalty: default_penalty(),
            user: None,
        }
    }
}

// ============================================================================
// Chat Completions Response Models
// ============================================================================

/// Function call details; `arguments` is always a JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Tool call in a Chat Completions response or in a forwarded assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String, // "function"
    pub function: FunctionCall,
}

/// Why a completion ended. Precedence when assembling: tool_calls > function_call > stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    FunctionCall,
    ToolCalls,
}

/// Message in a Chat Completions response.
///
/// `content` is always serialized, as `null` when a call was extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatResponseMessage,
    pub finish_reason: FinishReason,
}

/// Usage statistics; estimated, not counted by a tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Complete Chat Completions API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String, // "chat.completion"
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: ChatUsage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_match_openai() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "model": "openai",
            "messages": [{"role": "user", "content": "Hello!"}]
        }))
        .unwrap();
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.top_p, Some(1.0));
        assert_eq!(req.n, Some(1));
        assert_eq!(req.stream, Some(false));
        assert_eq!(req.presence_penalty, Some(0.0));
        assert!(req.max_tokens.is_none());
        assert!(req.functions.is_none() && req.tools.is_none());
    }

    #[test]
    fn tool_type_defaults_to_function() {
        let tool: ToolDefinition = serde_json::from_value(json!({
            "function": {"name": "lookup", "parameters": {"type": "object"}}
        }))
        .unwrap();
        assert!(tool.is_function());
        assert_eq!(tool.function.parameters.kind, "object");
    }

    #[test]
    fn parameter_schema_keeps_enum_and_items() {
        let p: FunctionParameter = serde_json::from_value(json!({
            "type": "array",
            "enum": ["a", "b"],
            "items": {"type": "string"}
        }))
        .unwrap();
        assert_eq!(p.enum_values.as_ref().map(Vec::len), Some(2));
        assert_eq!(p.items, Some(json!({"type": "string"})));
    }

    #[test]
    fn response_message_serializes_null_content() {
        let msg = ChatResponseMessage {
            role: Role::Assistant,
            content: None,
            function_call: Some(FunctionCall {
                name: "f".into(),
                arguments: "{}".into(),
            }),
            tool_calls: None,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["content"], Value::Null);
        assert_eq!(v["role"], "assistant");
        assert!(v.get("tool_calls").is_none());
    }

    #[test]
    fn finish_reason_is_snake_case() {
        assert_eq!(
            serde_json::to_value(FinishReason::ToolCalls).unwrap(),
            json!("tool_calls")
        );
        assert_eq!(
            serde_json::to_value(FinishReason::FunctionCall).unwrap(),
            json!("function_call")
        );
    }
}
