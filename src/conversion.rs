use serde_json::Value;

use crate::config::GatewayConfig;
use crate::declaration::CallDeclaration;
use crate::error::GatewayError;
use crate::models::chat::{
    ChatCompletionRequest, ChatMessage, FunctionCall, RawFunctionCall, RawToolCall, Role, ToolCall,
};
use crate::models::provider::{ProviderMessage, ProviderRequest};
use crate::util::to_spaced_json;

/// Correlation id for a tool call that arrived without one.
pub fn generate_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

/// Collapse a call's argument payload into the wire form: a JSON string.
///
/// - structured `parameters` (object/array) win and are encoded;
/// - otherwise a string `arguments` is kept verbatim, any other non-null `arguments`
///   is encoded;
/// - a scalar `parameters` is encoded when no `arguments` exist;
/// - nothing at all becomes `"{}"`.
pub fn normalize_arguments(
    arguments: Option<&Value>,
    parameters: Option<&Value>,
) -> Result<String, serde_json::Error> {
    match (arguments, parameters) {
        (_, Some(p @ (Value::Object(_) | Value::Array(_)))) => to_spaced_json(p),
        (Some(Value::String(s)), _) => Ok(s.clone()),
        (Some(a), _) if !a.is_null() => to_spaced_json(a),
        (_, Some(p)) if !p.is_null() => to_spaced_json(p),
        _ => Ok("{}".to_string()),
    }
}

impl RawFunctionCall {
    /// Wire form with `arguments` encoded as a JSON string.
    pub fn to_function_call(&self) -> Result<FunctionCall, serde_json::Error> {
        Ok(FunctionCall {
            name: self.name.clone(),
            arguments: normalize_arguments(self.arguments.as_ref(), self.parameters.as_ref())?,
        })
    }
}

impl RawToolCall {
    /// Wire form; fills in a generated id and `"function"` type when missing.
    pub fn to_tool_call(&self) -> Result<ToolCall, serde_json::Error> {
        Ok(ToolCall {
            id: self
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_call_id),
            call_type: self
                .call_type
                .clone()
                .unwrap_or_else(|| "function".to_string()),
            function: self.function.to_function_call()?,
        })
    }
}

/// Convert an OpenAI Chat Completions request into the provider's prompt request.
///
/// Mapping highlights:
/// - `tools` (preferred) or `functions` are unified into a `CallDeclaration`.
/// - With declarations present, the system messages sent upstream are, in order:
///   the declaration catalog with reply instructions, then the configured default
///   function-calling prompt (only when the caller sent no system message), then
///   the caller's messages.
/// - Messages are flattened: null content becomes `""`, call arguments become JSON strings.
/// - Generation parameters are forwarded unchanged.
/// - `function_call`, `tool_choice` and `user` are not forwarded.
pub fn to_provider_request(
    src: &ChatCompletionRequest,
    config: &GatewayConfig,
) -> Result<ProviderRequest, GatewayError> {
    let declaration = if config.enable_function_calling {
        CallDeclaration::from_request(src.functions.as_deref(), src.tools.as_deref())
    } else {
        None
    };

    if src.function_call.is_some() || src.tool_choice.is_some() || src.user.is_some() {
        tracing::debug!(
            has_function_call = src.function_call.is_some(),
            has_tool_choice = src.tool_choice.is_some(),
            has_user = src.user.is_some(),
            "dropping request fields the provider does not understand"
        );
    }

    let messages = build_messages(&src.messages, declaration.as_ref(), config)?;

    Ok(ProviderRequest {
        messages,
        model: config.resolve_model(&src.model),
        temperature: src.temperature,
        top_p: src.top_p,
        n: src.n,
        stream: src.stream,
        stop: src.stop.clone(),
        max_tokens: src.max_tokens,
        presence_penalty: src.presence_penalty,
        frequency_penalty: src.frequency_penalty,
    })
}

/// Flatten caller messages and inject the declaration-derived system messages.
pub fn build_messages(
    src: &[ChatMessage],
    declaration: Option<&CallDeclaration>,
    config: &GatewayConfig,
) -> Result<Vec<ProviderMessage>, GatewayError> {
    let mut out = Vec::with_capacity(src.len() + 2);

    if let Some(decl) = declaration {
        out.push(ProviderMessage::system(decl.instruction_prologue()?));
        if !src.iter().any(|m| m.role == Role::System) {
            out.push(ProviderMessage::system(
                config.function_calling_system_prompt.clone(),
            ));
        }
    }

    for m in src {
        out.push(map_message(m)?);
    }

    Ok(out)
}

fn map_message(m: &ChatMessage) -> Result<ProviderMessage, serde_json::Error> {
    if m.role == Role::Tool && m.tool_call_id.is_none() {
        tracing::warn!("tool message without tool_call_id forwarded as-is");
    }

    let function_call = m
        .function_call
        .as_ref()
        .map(RawFunctionCall::to_function_call)
        .transpose()?;

    let tool_calls = m
        .tool_calls
        .as_ref()
        .filter(|calls| !calls.is_empty())
        .map(|calls| {
            calls
                .iter()
                .map(RawToolCall::to_tool_call)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(ProviderMessage {
        role: m.role.as_str().to_string(),
        content: m.content.clone().unwrap_or_default(),
        name: m.name.clone().filter(|n| !n.is_empty()),
        function_call,
        tool_calls,
        tool_call_id: m.tool_call_id.clone().filter(|id| !id.is_empty()),
    })
}
