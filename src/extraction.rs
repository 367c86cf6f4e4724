//! Recovery of structured calls from the provider's free-text replies.
//!
//! The provider has no native function calling; it is asked (see `crate::declaration`)
//! to answer with JSON when it wants a call. Replies are inspected by an ordered chain
//! of `ExtractionStrategy` implementations; the first strategy that recognizes a call
//! wins, and a reply nobody recognizes is returned as ordinary assistant text.
//! Extraction never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::chat::{FinishReason, FunctionCall, RawFunctionCall, RawToolCall, ToolCall};
use crate::util::to_spaced_json;

/// Outcome of inspecting one provider reply. Exactly one of these reaches the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    FunctionCall(FunctionCall),
    ToolCalls(Vec<ToolCall>),
    Text(String),
}

impl Extraction {
    pub fn finish_reason(&self) -> FinishReason {
        match self {
            Extraction::ToolCalls(_) => FinishReason::ToolCalls,
            Extraction::FunctionCall(_) => FinishReason::FunctionCall,
            Extraction::Text(_) => FinishReason::Stop,
        }
    }

    /// Text content, `None` when a call was extracted.
    pub fn content(&self) -> Option<&str> {
        match self {
            Extraction::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// A call recognized by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedCall {
    Function(FunctionCall),
    Tools(Vec<ToolCall>),
}

impl From<ExtractedCall> for Extraction {
    fn from(call: ExtractedCall) -> Self {
        match call {
            ExtractedCall::Function(f) => Extraction::FunctionCall(f),
            ExtractedCall::Tools(t) => Extraction::ToolCalls(t),
        }
    }
}

/// Raw reply text plus its JSON parse, computed once and shared by all strategies.
#[derive(Debug)]
pub struct ProviderReply<'a> {
    raw: &'a str,
    parsed: Option<Value>,
}

impl<'a> ProviderReply<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            parsed: serde_json::from_str(raw).ok(),
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The whole body as JSON, if it is valid JSON.
    pub fn json(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    /// `choices[0].message.content` when the body is an OpenAI-style envelope.
    pub fn envelope_content(&self) -> Option<&str> {
        let obj = self.json()?.as_object()?;
        obj.get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
    }
}

/// One heuristic for spotting a call in a reply.
pub trait ExtractionStrategy: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// `None` means "not recognized"; the next strategy is tried.
    fn try_extract(&self, reply: &ProviderReply<'_>) -> Option<ExtractedCall>;
}

/// The body itself is a JSON object describing the call.
///
/// Recognized shapes, checked in this order:
/// - `{"function_call": {"name": ..., "arguments"|"parameters": ...}}`
/// - `{"name": ..., "parameters": ...}`
/// - `{"tool_calls": [{"id"?, "type"?, "function": {"name": ..., "arguments"|"parameters": ...}}]}`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBodyStrategy;

impl ExtractionStrategy for JsonBodyStrategy {
    fn name(&self) -> &'static str {
        "json_body"
    }

    fn try_extract(&self, reply: &ProviderReply<'_>) -> Option<ExtractedCall> {
        let obj = reply.json()?.as_object()?;

        if let Some(fc) = obj.get("function_call") {
            return function_call_from_value(fc).map(ExtractedCall::Function);
        }

        if let (Some(name), Some(params)) = (obj.get("name"), obj.get("parameters")) {
            return implicit_call(name, params).map(ExtractedCall::Function);
        }

        if let Some(Value::Array(entries)) = obj.get("tool_calls") {
            let calls: Vec<ToolCall> = entries.iter().filter_map(tool_call_from_value).collect();
            if calls.is_empty() {
                return None;
            }
            return Some(ExtractedCall::Tools(calls));
        }

        None
    }
}

static EMBEDDED_CALL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"\{\s*"name":\s*"([^"]+)",\s*"parameters":\s*(\{[^}]+\})\s*\}"#).ok()
});

/// A `{"name": "...", "parameters": {...}}` object embedded in prose.
///
/// Only runs when the body as a whole is not valid JSON. This is a textual match,
/// not a parser: the parameter object must be flat (no nested `{}`), and only the
/// first occurrence is considered.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedCallStrategy;

impl ExtractionStrategy for EmbeddedCallStrategy {
    fn name(&self) -> &'static str {
        "embedded_pattern"
    }

    fn try_extract(&self, reply: &ProviderReply<'_>) -> Option<ExtractedCall> {
        if reply.json().is_some() {
            return None;
        }
        let caps = EMBEDDED_CALL.as_ref()?.captures(reply.raw())?;
        let name = caps.get(1)?.as_str();
        let params: Value = serde_json::from_str(caps.get(2)?.as_str()).ok()?;
        Some(ExtractedCall::Function(FunctionCall {
            name: name.to_string(),
            arguments: to_spaced_json(&params).ok()?,
        }))
    }
}

fn function_call_from_value(v: &Value) -> Option<FunctionCall> {
    let raw: RawFunctionCall = serde_json::from_value(v.clone()).ok()?;
    if raw.name.is_empty() {
        return None;
    }
    raw.to_function_call().ok()
}

fn implicit_call(name: &Value, params: &Value) -> Option<FunctionCall> {
    let name = name.as_str().filter(|n| !n.is_empty())?;
    Some(FunctionCall {
        name: name.to_string(),
        arguments: to_spaced_json(params).ok()?,
    })
}

fn tool_call_from_value(v: &Value) -> Option<ToolCall> {
    let raw: RawToolCall = serde_json::from_value(v.clone()).ok()?;
    if raw.function.name.is_empty() {
        tracing::debug!("skipping tool call entry without a function name");
        return None;
    }
    raw.to_tool_call().ok()
}

/// Ordered strategy chain with a plain-text fallback.
pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for Extractor {
    /// JSON body first, then the embedded pattern.
    fn default() -> Self {
        Self::new(vec![
            Box::new(JsonBodyStrategy),
            Box::new(EmbeddedCallStrategy),
        ])
    }
}

impl Extractor {
    /// An empty chain treats every reply as text.
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, raw: &str) -> Extraction {
        let reply = ProviderReply::new(raw);
        for strategy in &self.strategies {
            if let Some(call) = strategy.try_extract(&reply) {
                tracing::debug!(strategy = strategy.name(), "extracted call from provider reply");
                return call.into();
            }
        }
        let text = reply
            .envelope_content()
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string());
        Extraction::Text(text)
    }
}

/// Run the default chain.
pub fn extract_call(raw: &str) -> Extraction {
    Extractor::default().extract(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_call_round_trip() {
        let out = extract_call(r#"{"name": "get_weather", "parameters": {"location": "Paris"}}"#);
        assert_eq!(
            out,
            Extraction::FunctionCall(FunctionCall {
                name: "get_weather".into(),
                arguments: "{\"location\": \"Paris\"}".into(),
            })
        );
        assert_eq!(out.finish_reason(), FinishReason::FunctionCall);
    }

    #[test]
    fn function_call_key_with_parameters() {
        let out = extract_call(
            r#"{"function_call": {"name": "lookup", "parameters": {"q": "rust", "n": 3}}}"#,
        );
        match out {
            Extraction::FunctionCall(fc) => {
                assert_eq!(fc.name, "lookup");
                assert_eq!(fc.arguments, r#"{"q": "rust", "n": 3}"#);
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn function_call_key_with_string_arguments_is_kept() {
        let out =
            extract_call(r#"{"function_call": {"name": "lookup", "arguments": "{\"q\":\"x\"}"}}"#);
        match out {
            Extraction::FunctionCall(fc) => assert_eq!(fc.arguments, r#"{"q":"x"}"#),
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn malformed_function_call_value_falls_back_to_text() {
        let body = r#"{"function_call": "nope"}"#;
        assert_eq!(extract_call(body), Extraction::Text(body.to_string()));
    }

    #[test]
    fn tool_calls_get_ids_and_types() {
        let out = extract_call(
            r#"{"tool_calls": [{"type":"function","function":{"name":"get_weather","parameters":{"location":"Paris"}}}]}"#,
        );
        assert_eq!(out.finish_reason(), FinishReason::ToolCalls);
        let Extraction::ToolCalls(calls) = out else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].id.is_empty());
        assert_eq!(calls[0].call_type, "function");
        assert_eq!(calls[0].function.arguments, r#"{"location": "Paris"}"#);
    }

    #[test]
    fn tool_call_keeps_supplied_id_and_skips_nameless_entries() {
        let out = extract_call(
            r#"{"tool_calls": [{"id": "call_7", "function": {"name": "a", "arguments": "{}"}}, {"id": "x"}]}"#,
        );
        let Extraction::ToolCalls(calls) = out else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_7");
        assert_eq!(calls[0].call_type, "function");
    }

    #[test]
    fn empty_tool_calls_is_text() {
        let body = r#"{"tool_calls": []}"#;
        assert_eq!(extract_call(body), Extraction::Text(body.to_string()));
    }

    #[test]
    fn prose_is_text() {
        let out = extract_call("The weather in Paris is sunny.");
        assert_eq!(
            out,
            Extraction::Text("The weather in Paris is sunny.".to_string())
        );
        assert_eq!(out.finish_reason(), FinishReason::Stop);
        assert_eq!(out.content(), Some("The weather in Paris is sunny."));
    }

    #[test]
    fn embedded_call_in_prose() {
        let out = extract_call(r#"Sure! {"name": "x", "parameters": {"a": 1}} Let me check."#);
        assert_eq!(
            out,
            Extraction::FunctionCall(FunctionCall {
                name: "x".into(),
                arguments: r#"{"a": 1}"#.into(),
            })
        );
    }

    #[test]
    fn embedded_pattern_ignores_nested_parameters() {
        let body = r#"Calling {"name": "x", "parameters": {"a": {"b": 1}}} now"#;
        assert_eq!(extract_call(body), Extraction::Text(body.to_string()));
    }

    #[test]
    fn embedded_pattern_not_used_for_valid_json() {
        let body = r#"{"wrapper": {"name": "x", "parameters": {"a": 1}}}"#;
        assert_eq!(extract_call(body), Extraction::Text(body.to_string()));
    }

    #[test]
    fn envelope_content_is_unwrapped() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Hi there"}}]}"#;
        assert_eq!(extract_call(body), Extraction::Text("Hi there".to_string()));
    }

    #[test]
    fn empty_chain_returns_text() {
        let body = r#"{"name": "get_weather", "parameters": {}}"#;
        let out = Extractor::new(Vec::new()).extract(body);
        assert_eq!(out, Extraction::Text(body.to_string()));
    }
}
