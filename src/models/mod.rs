//! Data models for the OpenAI-facing API and the provider.
//!
//! This module groups three submodules:
//! - `chat`: the Chat Completions request/response subset accepted and produced by the gateway,
//!   including `functions`/`tools` declarations.
//! - `provider`: the plain prompt request sent to the text provider.
//! - `catalog`: the `/v1/models` listing.
//!
//! The mapping between `chat` and `provider` lives in `crate::conversion` (requests)
//! and `crate::extraction` + `crate::completion` (responses).

pub mod catalog;
pub mod chat;
pub mod provider;

pub use catalog::{Model, ModelList, ModelPermission};
pub use chat::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, FinishReason, FunctionCall,
    FunctionDef, FunctionParameter, Role, ToolCall, ToolDefinition,
};
pub use provider::{ProviderMessage, ProviderRequest};
