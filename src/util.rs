use std::io;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use serde_json::ser::Formatter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::GatewayConfig;

/// Load the env file, then install the `fmt` subscriber filtered by RUST_LOG.
///
/// Env file lookup order: ENV_FILE / ENVFILE / DOTENV_PATH, then `.envfile`, then
/// the default `.env` discovery. Existing process variables are never overwritten.
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "ENVFILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none"
        && std::path::Path::new(".envfile").is_file()
        && dotenvy::from_filename(".envfile").is_ok()
    {
        env_source = ".envfile".into();
    }

    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8000.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into())
}

/// Truthy env flag values: 1, true, yes, on (case-insensitive).
pub fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// State handed to every handler.
///
/// Both fields are read-only after startup; `reqwest::Client` is internally pooled.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: build_http_client_from_env(),
            config: Arc::new(config),
        }
    }

    /// Provider client bound to this state's HTTP pool and configuration.
    pub fn provider(&self) -> crate::upstream::ProviderClient {
        crate::upstream::ProviderClient::new(self.http.clone(), self.config.clone())
    }
}

/// Build an HTTP client honoring proxy environment variables.
///
/// Per-call timeouts come from `GatewayConfig`, so none is set here.
///
/// Environment:
/// - GATEWAY_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - GATEWAY_PROXY_URL = <url>         -> proxy for all schemes
/// - HTTP_PROXY / http_proxy           -> HTTP proxy
/// - HTTPS_PROXY / https_proxy         -> HTTPS proxy
pub fn build_http_client_from_env() -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    let no_proxy = std::env::var("GATEWAY_NO_PROXY")
        .map(|v| is_truthy(&v))
        .unwrap_or(false);

    if no_proxy {
        builder = builder.no_proxy();
    } else {
        if let Some(p) = proxy_from_env(&["GATEWAY_PROXY_URL"], |u| reqwest::Proxy::all(u)) {
            builder = builder.proxy(p);
        }
        if let Some(p) = proxy_from_env(&["HTTP_PROXY", "http_proxy"], |u| {
            reqwest::Proxy::http(u)
        }) {
            builder = builder.proxy(p);
        }
        if let Some(p) = proxy_from_env(&["HTTPS_PROXY", "https_proxy"], |u| {
            reqwest::Proxy::https(u)
        }) {
            builder = builder.proxy(p);
        }
    }

    builder = builder.user_agent(format!("chat2pollinations/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
    })
}

fn proxy_from_env(
    keys: &[&str],
    make: impl Fn(&str) -> reqwest::Result<reqwest::Proxy>,
) -> Option<reqwest::Proxy> {
    let url = keys.iter().find_map(|k| std::env::var(k).ok())?;
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    match make(url) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!("Ignoring proxy {}: {}", url, e);
            None
        }
    }
}

/// Build an OpenAI-style JSON error response with the given HTTP status and message.
pub fn error_response(status: StatusCode, msg: &str, kind: &str) -> Response {
    let body = serde_json::json!({ "error": { "message": msg, "type": kind } });
    (status, axum::Json(body)).into_response()
}

/// Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

/// Unix timestamp in milliseconds.
pub fn current_timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis()
}

/// Compact JSON with a space after `,` and `:`, e.g. `{"location": "Paris"}`.
///
/// This is the encoding used for every `arguments` string the gateway produces.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Serialize a value with `SpacedFormatter`.
pub fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// CORS policy for the gateway routes. Permissive unless narrowed through env.
///
/// - CORS_ALLOWED_ORIGINS / CORS_ALLOWED_METHODS / CORS_ALLOWED_HEADERS: comma lists, `*` for any
/// - CORS_ALLOW_CREDENTIALS: truthy flag, honored only with an explicit origin list
/// - CORS_MAX_AGE: seconds
///
/// A list that is unset or has no valid entry means any.
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

    let mut layer = CorsLayer::new();

    layer = match env_list("CORS_ALLOWED_ORIGINS", |p| http::HeaderValue::from_str(p).ok()) {
        Some(vals) => layer.allow_origin(AllowOrigin::list(vals)),
        None => layer.allow_origin(Any),
    };

    layer = match env_list("CORS_ALLOWED_METHODS", |p| {
        http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok()
    }) {
        Some(vals) => layer.allow_methods(AllowMethods::list(vals)),
        None => layer.allow_methods(Any),
    };

    layer = match env_list("CORS_ALLOWED_HEADERS", |p| {
        http::header::HeaderName::try_from(p).ok()
    }) {
        Some(vals) => layer.allow_headers(AllowHeaders::list(vals)),
        None => layer.allow_headers(Any),
    };

    // Credentials cannot be combined with wildcard origins; tower-http panics on that pair.
    if let Ok(val) = std::env::var("CORS_ALLOW_CREDENTIALS") {
        if is_truthy(&val) && std::env::var("CORS_ALLOWED_ORIGINS").is_ok_and(|o| o.trim() != "*")
        {
            layer = layer.allow_credentials(true);
        }
    }

    if let Ok(secs) = std::env::var("CORS_MAX_AGE") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            layer = layer.max_age(Duration::from_secs(n));
        }
    }

    layer
}

/// Parse a comma-separated env list; `None` means "*", unset, or nothing valid.
fn env_list<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let raw = std::env::var(key).ok()?;
    let raw = raw.trim();
    if raw == "*" {
        return None;
    }
    let vals: Vec<T> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(parse)
        .collect();
    if vals.is_empty() {
        None
    } else {
        Some(vals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spaced_json_matches_expected_texture() {
        let v = json!({"location": "Paris", "days": [1, 2], "opts": {}});
        assert_eq!(
            to_spaced_json(&v).unwrap(),
            r#"{"location": "Paris", "days": [1, 2], "opts": {}}"#
        );
    }

    #[test]
    fn spaced_json_keeps_key_order() {
        let v: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        assert_eq!(to_spaced_json(&v).unwrap(), r#"{"b": 1, "a": 2}"#);
    }

    #[test]
    fn proxy_from_env_reads_first_set_key() {
        std::env::set_var("C2P_UTIL_TEST_PROXY_B", "http://127.0.0.1:3128");
        let proxy = proxy_from_env(
            &["C2P_UTIL_TEST_PROXY_A", "C2P_UTIL_TEST_PROXY_B"],
            |u| reqwest::Proxy::http(u),
        );
        assert!(proxy.is_some());
        std::env::remove_var("C2P_UTIL_TEST_PROXY_B");
    }

    #[test]
    fn proxy_from_env_skips_unset_and_invalid() {
        let unset = proxy_from_env(&["C2P_UTIL_TEST_PROXY_UNSET"], |u| reqwest::Proxy::all(u));
        assert!(unset.is_none());

        std::env::set_var("C2P_UTIL_TEST_PROXY_BAD", "http://[::1");
        let bad = proxy_from_env(&["C2P_UTIL_TEST_PROXY_BAD"], |u| reqwest::Proxy::https(u));
        assert!(bad.is_none());
        std::env::remove_var("C2P_UTIL_TEST_PROXY_BAD");
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "YES", " on "] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["0", "false", "off", ""] {
            assert!(!is_truthy(v), "{v}");
        }
    }
}
