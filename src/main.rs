use anyhow::Context;
use chat2pollinations::config::GatewayConfig;
use chat2pollinations::server::build_router;
use chat2pollinations::util::{env_bind_addr, init_tracing};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    // --config=<path> wins over GATEWAY_CONFIG
    let config_path = args
        .iter()
        .find_map(|a| a.strip_prefix("--config="))
        .map(|s| s.to_string())
        .or_else(|| env::var("GATEWAY_CONFIG").ok())
        .filter(|p| !p.trim().is_empty());

    let mut config = match config_path {
        Some(path) => {
            tracing::info!("Loading gateway configuration from: {}", path);
            GatewayConfig::load_from_file(&path)?
        }
        None => {
            tracing::info!("No config file provided, using defaults and environment");
            GatewayConfig::default()
        }
    };
    config.apply_env_overrides();

    tracing::info!(
        provider = %config.provider_base_url,
        default_model = %config.default_model,
        function_calling = config.enable_function_calling,
        timeout_secs = config.completion_timeout_secs,
        "Gateway configuration loaded"
    );

    let app = build_router(config);

    let addr = env_bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Chat2Pollinations listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("HTTP server error")?;
    Ok(())
}
