use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

use crate::util::error_response;

/// Failures that end a single gateway request.
///
/// Extraction has no variant here: a reply that cannot be parsed into a call is
/// returned as plain assistant content.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Provider unreachable, or the request timed out.
    #[error("Error communicating with provider: {0}")]
    Transport(#[from] reqwest::Error),
    /// Provider answered with a non-success status; surfaced with the same status.
    #[error("Error from provider API: {body}")]
    UpstreamStatus { status: StatusCode, body: String },
    /// Re-encoding a structured payload to JSON failed.
    #[error("Internal server error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Unexpected model list from provider: {0}")]
    InvalidModelList(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UpstreamStatus { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) => "upstream_transport_error",
            GatewayError::UpstreamStatus { .. } => "upstream_error",
            GatewayError::Encoding(_) => "internal_error",
            GatewayError::InvalidModelList(_) => "upstream_invalid_response",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Encoding(_) => tracing::error!(error = %self, "request failed"),
            _ => tracing::warn!(error = %self, "provider call failed"),
        }
        error_response(self.status(), &self.to_string(), self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_passed_through() {
        let err = GatewayError::UpstreamStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "busy".into(),
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Error from provider API: busy");
    }

    #[test]
    fn local_failures_are_internal_errors() {
        let err = GatewayError::InvalidModelList("42".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
