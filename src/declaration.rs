//! Unified view over the `functions` and `tools` calling conventions, and the text
//! injected into the prompt to describe them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::chat::{FunctionDef, FunctionParameter, ToolDefinition};

/// Which convention the caller used; decides the rendering and the reply format
/// the provider is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// Legacy `functions` + `function_call`.
    Functions,
    /// `tools` + `tool_calls`.
    Tools,
}

impl CallStyle {
    fn plural(self) -> &'static str {
        match self {
            CallStyle::Functions => "functions",
            CallStyle::Tools => "tools",
        }
    }

    fn singular(self) -> &'static str {
        match self {
            CallStyle::Functions => "function",
            CallStyle::Tools => "tool",
        }
    }

    fn reply_format(self) -> &'static str {
        match self {
            CallStyle::Functions => {
                r#"{"function_call": {"name": "function_name", "arguments": "{\"param1\": \"value1\"}"}}"#
            }
            CallStyle::Tools => {
                r#"{"tool_calls": [{"id": "call_1", "type": "function", "function": {"name": "tool_name", "arguments": "{\"param1\": \"value1\"}"}}]}"#
            }
        }
    }
}

/// Declared callables for one request, whichever convention supplied them.
///
/// `tools` wins over `functions` when both are present. Tools of a kind other than
/// `"function"` are dropped from the internal list.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDeclaration {
    style: CallStyle,
    functions: Vec<FunctionDef>,
}

impl CallDeclaration {
    /// Returns `None` when neither list is present or both are empty.
    pub fn from_request(
        functions: Option<&[FunctionDef]>,
        tools: Option<&[ToolDefinition]>,
    ) -> Option<Self> {
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let functions = tools
                .iter()
                .filter(|t| t.is_function())
                .map(|t| t.function.clone())
                .collect();
            return Some(Self {
                style: CallStyle::Tools,
                functions,
            });
        }
        functions.filter(|f| !f.is_empty()).map(|f| Self {
            style: CallStyle::Functions,
            functions: f.to_vec(),
        })
    }

    pub fn style(&self) -> CallStyle {
        self.style
    }

    /// The unified function list, synthesized from `tools` when those were used.
    pub fn functions(&self) -> &[FunctionDef] {
        &self.functions
    }

    /// Pretty-printed JSON listing of every declared callable.
    ///
    /// Byte-identical for identical input. `type`, `description`, `properties` and
    /// `required` always appear in the parameter schema (null when absent); `enum`
    /// and `items` only when set.
    pub fn render_catalog(&self) -> Result<String, serde_json::Error> {
        let entries: Vec<Value> = self
            .functions
            .iter()
            .map(|f| -> Result<Value, serde_json::Error> {
                let rendered = render_function(f)?;
                Ok(match self.style {
                    CallStyle::Functions => rendered,
                    CallStyle::Tools => {
                        let mut tool = Map::new();
                        tool.insert("type".into(), Value::String("function".into()));
                        tool.insert("function".into(), rendered);
                        Value::Object(tool)
                    }
                })
            })
            .collect::<Result<_, _>>()?;
        serde_json::to_string_pretty(&entries)
    }

    /// System message text: the catalog plus instructions on how to signal a call.
    pub fn instruction_prologue(&self) -> Result<String, serde_json::Error> {
        let catalog = self.render_catalog()?;
        let plural = self.style.plural();
        let singular = self.style.singular();
        Ok(format!(
            "Available {plural}:\n{catalog}\n\n\
             Instructions:\n\
             1. If a {singular} is needed to answer the user's request, use it.\n\
             2. Return your response in JSON format.\n\
             3. Only use {plural} when necessary and relevant.\n\
             4. Use the exact format:\n   {}",
            self.style.reply_format()
        ))
    }
}

/// Field order and null handling of the rendered schema.
#[derive(Serialize)]
struct RenderedParameters<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    description: Option<&'a str>,
    properties: Option<&'a Map<String, Value>>,
    required: Option<&'a [String]>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    enum_values: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a Value>,
}

#[derive(Serialize)]
struct RenderedFunction<'a> {
    name: &'a str,
    description: Option<&'a str>,
    parameters: RenderedParameters<'a>,
}

fn render_function(f: &FunctionDef) -> Result<Value, serde_json::Error> {
    let p: &FunctionParameter = &f.parameters;
    serde_json::to_value(RenderedFunction {
        name: &f.name,
        description: f.description.as_deref(),
        parameters: RenderedParameters {
            kind: &p.kind,
            description: p.description.as_deref(),
            properties: p.properties.as_ref(),
            required: p.required.as_deref(),
            enum_values: p.enum_values.as_deref().filter(|e| !e.is_empty()),
            items: p.items.as_ref().filter(|i| !i.is_null()),
        },
    })
}
