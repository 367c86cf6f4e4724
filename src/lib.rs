#![forbid(unsafe_code)]
#![doc = r#"
Chat2Pollinations

OpenAI Chat Completions gateway for text providers without native function calling
(Pollinations.AI by default).

Crate highlights
- Library: pure request translation via `to_provider_request(&ChatCompletionRequest, &GatewayConfig)`
  and reply extraction via `extract_call(&str)`.
- HTTP server (in `server`): `/v1/chat/completions`, `/v1/models`, `/v1/health`.
- Function calling: `functions`/`tools` are described to the provider in an injected system
  message, and calls are recovered from its free-text reply.

Modules
- `models`: Data structures for the OpenAI side, the provider request and the model list.
- `declaration`: Unified `functions`/`tools` view and the injected instructions.
- `conversion`: Chat request -> provider request.
- `extraction`: Provider reply -> function call, tool calls or text.
- `completion`: Extraction -> Chat Completions response.
- `upstream`: Provider HTTP transport.
- `server`: Axum router/handlers (the binary uses this).
- `config`, `error`, `util`: Settings, error type, shared helpers (tracing, env, CORS).

Note: The provider's output is free text; extraction is best effort and degrades to plain content.
"#]

pub mod completion;
pub mod config;
pub mod conversion;
pub mod declaration;
pub mod error;
pub mod extraction;
pub mod models;
pub mod server;
pub mod upstream;
pub mod util;

pub use crate::completion::assemble_completion;
pub use crate::config::GatewayConfig;
pub use crate::conversion::to_provider_request;
pub use crate::declaration::{CallDeclaration, CallStyle};
pub use crate::error::GatewayError;
pub use crate::extraction::{extract_call, Extraction, ExtractionStrategy, Extractor};

// Re-export model namespaces for convenience (downstream users can do `use chat2pollinations::chat`).
pub use crate::models::{catalog, chat, provider};
