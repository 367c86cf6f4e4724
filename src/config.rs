use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::util::is_truthy;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://text.pollinations.ai";
pub const DEFAULT_MODEL: &str = "openai";
pub const DEFAULT_FUNCTION_CALLING_SYSTEM_PROMPT: &str = "You are a helpful AI assistant capable of using tools through function calling.
When a function is available and relevant to the user's request, you should use it.
Always structure your function call responses in valid JSON format.";

/// Process-wide gateway settings.
///
/// Built once at startup (defaults, then an optional JSON file, then environment
/// overrides) and shared read-only with every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Provider root; completions are POSTed to `<base>/`, models fetched from `<base>/models`.
    pub provider_base_url: String,

    /// Model used when a request leaves `model` empty.
    pub default_model: String,

    /// When false, `functions`/`tools` are ignored and replies are returned as plain text.
    pub enable_function_calling: bool,

    /// General tool-use system message, injected when declarations are present and the
    /// caller sent no system message of their own.
    pub function_calling_system_prompt: String,

    /// Upper bound for the provider completion call.
    pub completion_timeout_secs: u64,

    /// Upper bound for the provider model listing call.
    pub models_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            enable_function_calling: true,
            function_calling_system_prompt: DEFAULT_FUNCTION_CALLING_SYSTEM_PROMPT.to_string(),
            completion_timeout_secs: 30,
            models_timeout_secs: 10,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read gateway config file: {}",
                path.as_ref().display()
            )
        })?;

        let mut config: GatewayConfig = serde_json::from_str(&content)
            .with_context(|| "Failed to parse gateway config JSON")?;
        config.provider_base_url = trim_base_url(&config.provider_base_url);

        Ok(config)
    }

    /// Overlay environment variables on top of the current values.
    ///
    /// Environment:
    /// - PROVIDER_BASE_URL
    /// - DEFAULT_MODEL
    /// - ENABLE_FUNCTION_CALLING = 1|true|yes|on (anything else disables)
    /// - FUNCTION_CALLING_SYSTEM_PROMPT
    /// - PROVIDER_TIMEOUT_SECONDS (u64)
    /// - MODELS_TIMEOUT_SECONDS (u64)
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_non_empty("PROVIDER_BASE_URL") {
            self.provider_base_url = url;
        }
        if let Some(model) = env_non_empty("DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Some(flag) = env_non_empty("ENABLE_FUNCTION_CALLING") {
            self.enable_function_calling = is_truthy(&flag);
        }
        if let Some(prompt) = env_non_empty("FUNCTION_CALLING_SYSTEM_PROMPT") {
            self.function_calling_system_prompt = prompt;
        }
        if let Some(secs) = env_non_empty("PROVIDER_TIMEOUT_SECONDS") {
            match secs.parse::<u64>() {
                Ok(n) => self.completion_timeout_secs = n,
                Err(e) => tracing::warn!("Ignoring PROVIDER_TIMEOUT_SECONDS={}: {}", secs, e),
            }
        }
        if let Some(secs) = env_non_empty("MODELS_TIMEOUT_SECONDS") {
            match secs.parse::<u64>() {
                Ok(n) => self.models_timeout_secs = n,
                Err(e) => tracing::warn!("Ignoring MODELS_TIMEOUT_SECONDS={}: {}", secs, e),
            }
        }
        self.provider_base_url = trim_base_url(&self.provider_base_url);
    }

    /// Provider completion endpoint.
    pub fn completion_url(&self) -> String {
        format!("{}/", self.provider_base_url)
    }

    /// Provider model listing endpoint.
    pub fn models_url(&self) -> String {
        format!("{}/models", self.provider_base_url)
    }

    /// Pick the request's model, falling back to the configured default.
    pub fn resolve_model(&self, requested: &str) -> String {
        let requested = requested.trim();
        if requested.is_empty() {
            self.default_model.clone()
        } else {
            requested.to_string()
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
