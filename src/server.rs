use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::completion::assemble_completion;
use crate::config::GatewayConfig;
use crate::conversion::to_provider_request;
use crate::error::GatewayError;
use crate::extraction::Extractor;
use crate::models::catalog::ModelList;
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::util::{cors_layer_from_env, AppState};

/// Build the Axum router with `/v1/chat/completions`, `/v1/models` and `/v1/health`.
pub fn build_router(config: GatewayConfig) -> Router {
    router_with_state(AppState::new(config))
}

/// Same as `build_router`, reusing an existing state (shared HTTP pool).
pub fn router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(list_models))
        .route("/v1/health", get(health))
        .with_state(state)
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Translate, call the provider once, and turn its reply into a completion.
async fn chat_completions(
    State(state): State<AppState>,
    Json(req): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, GatewayError> {
    let upstream = to_provider_request(&req, &state.config)?;
    let raw = state.provider().complete(&upstream).await?;

    let extractor = if state.config.enable_function_calling {
        Extractor::default()
    } else {
        Extractor::new(Vec::new())
    };
    let extraction = extractor.extract(&raw);
    tracing::debug!(finish_reason = ?extraction.finish_reason(), "provider reply extracted");

    let completion = assemble_completion(&upstream.model, &upstream.messages, extraction)?;
    Ok(Json(completion))
}

async fn list_models(State(state): State<AppState>) -> Result<Json<ModelList>, GatewayError> {
    Ok(Json(state.provider().list_models().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_static() {
        let app = build_router(GatewayConfig::default());
        let resp = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v, serde_json::json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router(GatewayConfig::default());
        let resp = app
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
