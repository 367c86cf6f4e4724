#![allow(dead_code)]

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Stand-in for the text provider: answers `POST /` with a canned body and records
/// every request it receives.
#[derive(Clone)]
pub struct ProviderStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[derive(Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: String,
}

impl StubReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    pub fn error(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Clone)]
struct StubState {
    completion: StubReply,
    models: StubReply,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl ProviderStub {
    pub async fn start(completion: StubReply) -> Self {
        Self::start_with_models(completion, StubReply::ok(r#"["openai","mistral"]"#)).await
    }

    pub async fn start_with_models(completion: StubReply, models: StubReply) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            completion,
            models,
            calls: calls.clone(),
            requests: requests.clone(),
        });

        let router = Router::new()
            .route("/", post(completion_handler))
            .route("/models", get(models_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub provider");
        let addr = listener.local_addr().expect("stub provider local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Stub provider server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        ProviderStub {
            base_url: format!("http://{}", addr),
            calls,
            requests,
            shutdown: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bodies received on `POST /`, in arrival order.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Drop for ProviderStub {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.shutdown.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    }
}

async fn completion_handler(
    State(state): State<Arc<StubState>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().expect("requests lock").push(body);
    (state.completion.status, state.completion.body.clone())
}

async fn models_handler(State(state): State<Arc<StubState>>) -> (StatusCode, String) {
    (state.models.status, state.models.body.clone())
}
