//! Local stand-ins for the upstream completion API, shared by the proxy and planner tests.

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct MockUpstream {
    status: StatusCode,
    body: String,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
    last_auth: Arc<Mutex<Option<String>>>,
}

impl MockUpstream {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
            hits: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            last_auth: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<Value> {
        self.last_request.lock().expect("lock").clone()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.last_auth.lock().expect("lock").clone()
    }

    /// Binds to an ephemeral port and returns the completions URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/v1/chat/completions", post(mock_completion))
            .with_state(self.clone());
        format!("{}/api/v1/chat/completions", spawn_router(app).await)
    }
}

async fn mock_completion(
    State(mock): State<MockUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    *mock.last_request.lock().expect("lock") = Some(body);
    *mock.last_auth.lock().expect("lock") = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }
    (mock.status, [(CONTENT_TYPE, "application/json")], mock.body).into_response()
}

pub async fn spawn_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "gen-1",
        "model": "openai/gpt-3.5-turbo",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 90, "completion_tokens": 40}
    })
    .to_string()
}
