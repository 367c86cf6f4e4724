use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::models::catalog::{Model, ModelList};
use crate::models::provider::ProviderRequest;

/// Provider transport: one POST per completion, one GET per model listing, no retries.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    config: Arc<GatewayConfig>,
}

impl ProviderClient {
    pub fn new(http: reqwest::Client, config: Arc<GatewayConfig>) -> Self {
        Self { http, config }
    }

    /// Send a normalized request and return the raw reply body.
    ///
    /// A non-success status becomes `GatewayError::UpstreamStatus` carrying the
    /// provider's status and body verbatim.
    pub async fn complete(&self, body: &ProviderRequest) -> Result<String, GatewayError> {
        let url = self.config.completion_url();
        tracing::debug!(
            url = %url,
            payload = ?body,
            "provider request"
        );

        let resp = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(self.config.completion_timeout_secs))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        tracing::debug!(status = %status, body = %text, "raw provider response");

        ensure_success(status, text)
    }

    /// Fetch the provider's model ids and wrap them in the OpenAI list shape.
    pub async fn list_models(&self) -> Result<ModelList, GatewayError> {
        let resp = self
            .http
            .get(self.config.models_url())
            .timeout(Duration::from_secs(self.config.models_timeout_secs))
            .send()
            .await?;

        let status = resp.status();
        let text = ensure_success(status, resp.text().await?)?;
        let value: Value = serde_json::from_str(&text).map_err(|_| {
            GatewayError::InvalidModelList(format!("Invalid JSON response: {text}"))
        })?;
        model_list_from_value(&value)
    }
}

fn ensure_success(status: StatusCode, body: String) -> Result<String, GatewayError> {
    if status == StatusCode::OK {
        Ok(body)
    } else {
        Err(GatewayError::UpstreamStatus { status, body })
    }
}

/// Accept a list of ids (strings, or objects with `name`/`id`) or a map keyed by id.
pub fn model_list_from_value(value: &Value) -> Result<ModelList, GatewayError> {
    let ids: Vec<String> = match value {
        Value::Array(entries) => entries.iter().filter_map(model_id).collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        other => {
            return Err(GatewayError::InvalidModelList(format!(
                "Unexpected response format: {other}"
            )))
        }
    };
    Ok(ModelList::new(
        ids.into_iter()
            .map(|id| Model::new(id, "pollinations"))
            .collect(),
    ))
}

fn model_id(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("name")
            .or_else(|| obj.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
